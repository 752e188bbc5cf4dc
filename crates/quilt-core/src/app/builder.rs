//! ReportBuilder - Router の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - `expect_kinds()` で必要な TaskKind を宣言
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す

use std::sync::Arc;

use crate::config::ProducerConfig;
use crate::domain::TaskKind;
use crate::impls::CommitIdentity;
use crate::pipeline::{Pipeline, PipelineRegistry, RegistryError};
use crate::ports::ChangeIdentity;

use super::router::Router;

/// Builds a `Router` from registered pipelines.
///
/// ```ignore
/// let router = ReportBuilder::new()
///     .register(TaskKind::Build, Pipeline::new(MyBuildProducer, ExecutionTransformer))?
///     .expect_kinds(&[TaskKind::Build])
///     .build()?;
/// ```
pub struct ReportBuilder {
    registry: PipelineRegistry,
    identity: Arc<dyn ChangeIdentity>,
    expected_kinds: Option<Vec<TaskKind>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task kinds: {0:?}. These kinds were expected but have no pipeline.")]
    MissingTaskKinds(Vec<TaskKind>),
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            registry: PipelineRegistry::new(),
            identity: Arc::new(CommitIdentity),
            expected_kinds: None,
        }
    }

    /// Start from the reference pipelines for every family.
    pub fn reference(config: &ProducerConfig) -> Self {
        Self {
            registry: PipelineRegistry::reference(config),
            identity: Arc::new(CommitIdentity),
            expected_kinds: None,
        }
    }

    /// Replace how changes are matched to state records (default: `CommitIdentity`).
    pub fn identity(mut self, identity: impl ChangeIdentity + 'static) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    pub fn register(mut self, kind: TaskKind, pipeline: Pipeline) -> Result<Self, RegistryError> {
        self.registry.register(kind, pipeline)?;
        Ok(self)
    }

    pub fn expect_kinds(mut self, kinds: &[TaskKind]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    pub fn build(self) -> Result<Router, BuildError> {
        if let Some(expected) = &self.expected_kinds {
            let registered = self.registry.registered_kinds();
            let missing: Vec<TaskKind> = expected
                .iter()
                .filter(|kind| !registered.contains(kind))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTaskKinds(missing));
            }
        }
        Ok(Router::with_identity(self.registry, self.identity))
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
