//! PipelineRegistry - TaskKind ごとの Pipeline の登録と管理
//!
//! # 設計
//! - 構築時に登録（mutable）
//! - 評価中は参照のみ（immutable）
//! - `reference()` は `TaskKind` を網羅する match で組み立てる。新しい family を
//!   追加するとここがコンパイルエラーになる

use std::collections::HashMap;

use super::Pipeline;
use crate::config::ProducerConfig;
use crate::domain::TaskKind;
use crate::impls::{
    AnalysisProducer, AnalysisTransformer, BuildProducer, ExecutionTransformer,
    ReadResultProducer, TestRunProducer,
};

/// Maps each task family to the pipeline that reports it.
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<TaskKind, Pipeline>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Pipeline for task kind '{0}' is already registered")]
    AlreadyRegistered(TaskKind),
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    /// All four families wired to the reference producers and transformers.
    pub fn reference(config: &ProducerConfig) -> Self {
        let pipelines = TaskKind::ALL
            .into_iter()
            .map(|kind| (kind, reference_pipeline(kind, config)))
            .collect();
        Self { pipelines }
    }

    pub fn register(&mut self, kind: TaskKind, pipeline: Pipeline) -> Result<(), RegistryError> {
        if self.pipelines.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.pipelines.insert(kind, pipeline);
        Ok(())
    }

    pub fn get(&self, kind: TaskKind) -> Option<&Pipeline> {
        self.pipelines.get(&kind)
    }

    /// Registered kinds in declaration order.
    pub fn registered_kinds(&self) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self.pipelines.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

pub fn reference_pipeline(kind: TaskKind, config: &ProducerConfig) -> Pipeline {
    match kind {
        TaskKind::Build => Pipeline::new(BuildProducer::new(config.clone()), ExecutionTransformer),
        TaskKind::TestRun => {
            Pipeline::new(TestRunProducer::new(config.clone()), ExecutionTransformer)
        }
        TaskKind::ReadResult => Pipeline::new(ReadResultProducer, ExecutionTransformer),
        TaskKind::Analysis => Pipeline::new(AnalysisProducer, AnalysisTransformer),
    }
}
