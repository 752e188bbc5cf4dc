//! Reference transformers.
//!
//! - `ExecutionTransformer`: build / test-run / read-result → one `state` edit.
//! - `AnalysisTransformer`: analysis → `set_parameters` + `order_changes`.
//!
//! Both return `None` for an absent or empty fragment, so a task with nothing
//! to say never creates a state record or a quest column.

use serde_json::Value;

use crate::domain::{Event, Fragment, MergeInstruction, Parameters, StateUpdate, Task, TaskKind};
use crate::error::ReportError;
use crate::ports::Transformer;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionTransformer;

impl Transformer for ExecutionTransformer {
    fn transform(
        &self,
        task: &Task,
        _event: &Event,
        fragment: Option<Fragment>,
    ) -> Result<Option<MergeInstruction>, ReportError> {
        let Some(fragment) = fragment.filter(|f| !f.is_empty()) else {
            return Ok(None);
        };
        let kind = task.kind();
        let quest = kind
            .and_then(|k| k.quest())
            .ok_or_else(|| task.malformed(format!("task_type={} has no quest column", task.task_type())))?;

        let mut update = StateUpdate::new(task.change()?.clone(), quest)
            .with_index(task.attempt_index()?)
            .with_execution(fragment);
        if kind == Some(TaskKind::ReadResult) {
            update = update.with_result_values(task.result_values()?);
        }
        Ok(Some(MergeInstruction::state(update)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisTransformer;

impl Transformer for AnalysisTransformer {
    fn transform(
        &self,
        task: &Task,
        _event: &Event,
        fragment: Option<Fragment>,
    ) -> Result<Option<MergeInstruction>, ReportError> {
        let Some(fragment) = fragment.filter(|f| !f.is_empty()) else {
            return Ok(None);
        };

        let changes = match fragment.get("changes") {
            Some(Value::Array(changes)) => changes.clone(),
            _ => return Err(malformed(task, "`changes` must be an array")),
        };
        let parameters = Parameters {
            comparison_mode: optional_string(task, &fragment, "comparison_mode")?,
            metric: optional_string(task, &fragment, "metric")?,
        };

        Ok(Some(
            MergeInstruction::default()
                .with_parameters(parameters)
                .with_order(changes),
        ))
    }
}

fn optional_string(task: &Task, fragment: &Fragment, key: &str) -> Result<Option<String>, ReportError> {
    match fragment.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(task, format!("`{key}` must be a string, got {other}"))),
    }
}

fn malformed(task: &Task, reason: impl Into<String>) -> ReportError {
    ReportError::MalformedFragment {
        task: task.id().clone(),
        reason: reason.into(),
    }
}
