//! Reference fragment producers, one per task family.
//!
//! Execution-style producers emit
//!
//! ```text
//! { "completed": bool, "exception": "<reason: message>", "details": [{key, value, url}] }
//! ```
//!
//! and nothing at all while the task has not started. The analysis producer
//! emits `{comparison_mode, metric, changes}` once the analysis has finished;
//! those are exactly the keys the analysis transformer reads.

use serde::Deserialize;
use serde_json::Value;

use crate::config::ProducerConfig;
use crate::domain::{Detail, Event, Fragment, Task};
use crate::error::ReportError;
use crate::ports::FragmentProducer;

/// Execution status as recorded in a task payload (`status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskStatus {
    Pending,
    Ongoing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

fn status(task: &Task) -> Result<Option<TaskStatus>, ReportError> {
    match task.field("/status") {
        None => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| task.malformed(format!("unknown status {v}: {e}"))),
    }
}

/// Shared shape of build / test-run / read-result fragments.
fn execution_fragment(task: &Task, details: Vec<Detail>) -> Result<Option<Fragment>, ReportError> {
    let status = match status(task)? {
        None | Some(TaskStatus::Pending) => return Ok(None),
        Some(s) => s,
    };

    let mut fragment = Fragment::new().with("completed", status.is_terminal());
    if let Some(exception) = last_error(task) {
        fragment.insert("exception", exception);
    }
    fragment.insert("details", serde_json::to_value(details)?);
    Ok(Some(fragment))
}

// Only the most recent error is shown; earlier ones were retried past.
fn last_error(task: &Task) -> Option<String> {
    let last = task.field("/errors")?.as_array()?.last()?;
    let reason = last.get("reason").and_then(Value::as_str);
    let message = last.get("message").and_then(Value::as_str);
    match (reason, message) {
        (Some(r), Some(m)) => Some(format!("{r}: {m}")),
        (Some(s), None) | (None, Some(s)) => Some(s.to_string()),
        (None, None) => None,
    }
}

/// Strings pass through, numbers (build ids) are rendered.
fn text(task: &Task, pointer: &str) -> Option<String> {
    match task.field(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn detail(key: &str, value: Option<String>, url: impl FnOnce(&str) -> Option<String>) -> Option<Detail> {
    let value = value?;
    let detail = Detail::new(key, value.clone());
    Some(match url(&value) {
        Some(u) => detail.with_url(u),
        None => detail,
    })
}

pub struct BuildProducer {
    config: ProducerConfig,
}

impl BuildProducer {
    pub fn new(config: ProducerConfig) -> Self {
        Self { config }
    }
}

impl FragmentProducer for BuildProducer {
    fn produce(&self, task: &Task, _event: &Event) -> Result<Option<Fragment>, ReportError> {
        let details = [
            detail("builder", text(task, "/builder"), |_| None),
            detail("build", text(task, "/buildbucket_build/id"), |id| {
                Some(self.config.build_url(id))
            }),
            detail("isolate", text(task, "/isolate_hash"), |digest| {
                Some(self.config.isolate_url(digest))
            }),
        ];
        execution_fragment(task, details.into_iter().flatten().collect())
    }
}

pub struct TestRunProducer {
    config: ProducerConfig,
}

impl TestRunProducer {
    pub fn new(config: ProducerConfig) -> Self {
        Self { config }
    }
}

impl FragmentProducer for TestRunProducer {
    fn produce(&self, task: &Task, _event: &Event) -> Result<Option<Fragment>, ReportError> {
        let details = [
            detail("bot", text(task, "/bot_id"), |bot| Some(self.config.bot_url(bot))),
            detail("task", text(task, "/swarming_task_id"), |id| {
                Some(self.config.swarming_task_url(id))
            }),
            detail("isolate", text(task, "/isolate_hash"), |digest| {
                Some(self.config.isolate_url(digest))
            }),
        ];
        execution_fragment(task, details.into_iter().flatten().collect())
    }
}

/// Values themselves reach the report through `append_result_values`, not
/// through the fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadResultProducer;

impl FragmentProducer for ReadResultProducer {
    fn produce(&self, task: &Task, _event: &Event) -> Result<Option<Fragment>, ReportError> {
        let details = [
            detail("metric", text(task, "/metric"), |_| None),
            detail("trace", text(task, "/trace_name"), |_| text(task, "/trace_url")),
        ];
        execution_fragment(task, details.into_iter().flatten().collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisProducer;

impl FragmentProducer for AnalysisProducer {
    fn produce(&self, task: &Task, _event: &Event) -> Result<Option<Fragment>, ReportError> {
        if status(task)? != Some(TaskStatus::Completed) {
            return Ok(None);
        }
        let changes = task
            .field("/changes")
            .filter(|v| v.is_array())
            .cloned()
            .ok_or_else(|| task.malformed("completed analysis has no `changes` array"))?;
        Ok(Some(
            Fragment::new()
                .with("comparison_mode", task.field("/comparison_mode").cloned().unwrap_or(Value::Null))
                .with("metric", task.field("/metric").cloned().unwrap_or(Value::Null))
                .with("changes", changes),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn produce(producer: &dyn FragmentProducer, payload: Value) -> Option<Fragment> {
        let task = Task::new("t1", "build", payload);
        producer.produce(&task, &Event::report()).unwrap()
    }

    #[rstest]
    #[case::no_status(json!({"change": "A"}))]
    #[case::pending(json!({"change": "A", "status": "pending"}))]
    fn unstarted_tasks_produce_nothing(#[case] payload: Value) {
        assert!(produce(&BuildProducer::new(ProducerConfig::default()), payload).is_none());
    }

    #[rstest]
    #[case::ongoing("ongoing", false)]
    #[case::completed("completed", true)]
    #[case::failed("failed", true)]
    #[case::cancelled("cancelled", true)]
    fn completed_flag_follows_status(#[case] status: &str, #[case] completed: bool) {
        let fragment = produce(
            &TestRunProducer::new(ProducerConfig::default()),
            json!({"change": "A", "status": status}),
        )
        .unwrap();
        assert_eq!(fragment.get("completed"), Some(&json!(completed)));
    }

    #[test]
    fn unknown_status_is_malformed() {
        let task = Task::new("t1", "build", json!({"status": "exploded"}));
        let err = BuildProducer::new(ProducerConfig::default())
            .produce(&task, &Event::report())
            .unwrap_err();
        assert!(matches!(err, ReportError::MalformedPayload { .. }));
    }

    #[test]
    fn build_fragment_carries_linked_details() {
        let fragment = produce(
            &BuildProducer::new(ProducerConfig::default()),
            json!({
                "change": "A",
                "status": "completed",
                "builder": "linux-builder-perf",
                "buildbucket_build": {"id": 8812},
                "isolate_hash": "7c3f"
            }),
        )
        .unwrap();

        assert_eq!(
            fragment.get("details"),
            Some(&json!([
                {"key": "builder", "value": "linux-builder-perf"},
                {"key": "build", "value": "8812", "url": "https://ci.chromium.org/b/8812"},
                {"key": "isolate", "value": "7c3f",
                 "url": "https://isolateserver.appspot.com/browse?digest=7c3f"}
            ]))
        );
        assert!(fragment.get("exception").is_none());
    }

    #[test]
    fn last_error_becomes_exception() {
        let fragment = produce(
            &BuildProducer::new(ProducerConfig::default()),
            json!({
                "status": "failed",
                "errors": [
                    {"reason": "BuildFailed", "message": "compile error"},
                    {"reason": "BuildTimeout", "message": "no isolate after 2h"}
                ]
            }),
        )
        .unwrap();
        assert_eq!(fragment.get("exception"), Some(&json!("BuildTimeout: no isolate after 2h")));
        assert_eq!(fragment.get("details"), Some(&json!([])));
    }

    #[test]
    fn read_result_links_trace() {
        let fragment = produce(
            &ReadResultProducer,
            json!({
                "status": "completed",
                "metric": "timeToFirstPaint",
                "trace_name": "trace.html",
                "trace_url": "https://storage.example.com/trace.html",
                "result_values": [1.0]
            }),
        )
        .unwrap();
        assert_eq!(
            fragment.get("details"),
            Some(&json!([
                {"key": "metric", "value": "timeToFirstPaint"},
                {"key": "trace", "value": "trace.html", "url": "https://storage.example.com/trace.html"}
            ]))
        );
        assert!(fragment.get("result_values").is_none());
    }

    #[test]
    fn analysis_waits_for_completion() {
        assert!(produce(&AnalysisProducer, json!({"status": "ongoing", "changes": []})).is_none());

        let fragment = produce(
            &AnalysisProducer,
            json!({
                "status": "completed",
                "comparison_mode": "performance",
                "metric": "timeToFirstPaint",
                "changes": ["A", "B"],
                "culprits": ["B"]
            }),
        )
        .unwrap();
        assert_eq!(fragment.get("changes"), Some(&json!(["A", "B"])));
        assert_eq!(fragment.get("culprits"), None);
        assert_eq!(fragment.get("comparison_mode"), Some(&json!("performance")));
    }

    #[test]
    fn completed_analysis_without_changes_is_malformed() {
        let task = Task::new("a1", "find_culprit", json!({"status": "completed"}));
        assert!(AnalysisProducer.produce(&task, &Event::report()).is_err());
    }
}
