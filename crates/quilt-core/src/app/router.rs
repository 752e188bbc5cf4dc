//! Router - task_type からパイプラインへの振り分け
//!
//! Runs the pipeline registered for a task's family and hands whatever it
//! emits to the aggregator. Task types nobody registered are skipped: a job
//! graph carries plenty of tasks that have nothing to do with reporting.

use std::sync::Arc;

use tracing::debug;

use super::aggregator::Aggregator;
use super::graph::JobGraph;
use crate::domain::{Event, Report, Task};
use crate::error::ReportError;
use crate::impls::CommitIdentity;
use crate::pipeline::PipelineRegistry;
use crate::ports::ChangeIdentity;

/// What one evaluation did to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// No pipeline for this task type.
    Skipped,
    /// The pipeline ran but had nothing to report.
    Empty,
    /// An instruction was folded into the report.
    Folded,
}

pub struct Router {
    registry: PipelineRegistry,
    identity: Arc<dyn ChangeIdentity>,
}

impl Router {
    /// Router whose reports key changes by `CommitIdentity`.
    pub fn new(registry: PipelineRegistry) -> Self {
        Self::with_identity(registry, Arc::new(CommitIdentity))
    }

    pub fn with_identity(registry: PipelineRegistry, identity: Arc<dyn ChangeIdentity>) -> Self {
        Self { registry, identity }
    }

    /// A fresh aggregator sharing this router's change identity.
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::with_identity(Arc::clone(&self.identity))
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Evaluate one task against the aggregator.
    pub fn evaluate(
        &self,
        task: &Task,
        event: &Event,
        aggregator: &mut Aggregator,
    ) -> Result<Evaluation, ReportError> {
        let Some(pipeline) = task.kind().and_then(|kind| self.registry.get(kind)) else {
            debug!(task_id = %task.id(), task_type = task.task_type(), "no pipeline, skipped");
            return Ok(Evaluation::Skipped);
        };

        match pipeline.run(task, event)? {
            Some(instruction) if !instruction.is_empty() => {
                aggregator.apply(instruction)?;
                Ok(Evaluation::Folded)
            }
            _ => {
                debug!(task_id = %task.id(), "nothing to report");
                Ok(Evaluation::Empty)
            }
        }
    }

    /// Evaluate tasks in the given order, stopping at the first error.
    pub fn evaluate_all<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
        event: &Event,
        aggregator: &mut Aggregator,
    ) -> Result<(), ReportError> {
        for task in tasks {
            self.evaluate(task, event, aggregator)?;
        }
        Ok(())
    }

    /// Walk the whole graph dependencies-first and return the finished report.
    pub fn report(&self, graph: &JobGraph, event: &Event) -> Result<Report, ReportError> {
        let mut aggregator = self.aggregator();
        self.evaluate_all(graph.walk(), event, &mut aggregator)?;
        Ok(aggregator.finish())
    }
}
