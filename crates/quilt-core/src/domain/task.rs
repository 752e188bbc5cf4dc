use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ReportError;

/// Identifier of a task node in the job graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The closed set of task families the report knows how to fold.
///
/// `task_type` strings outside this set are not an error; they resolve to
/// `None` and the router skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Build,
    TestRun,
    ReadResult,
    Analysis,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Build,
        TaskKind::TestRun,
        TaskKind::ReadResult,
        TaskKind::Analysis,
    ];

    /// Resolve a `task_type` string. Both the family names and the legacy
    /// task type names are accepted.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "build" | "find_isolate" => Some(Self::Build),
            "test-run" | "run_test" => Some(Self::TestRun),
            "read-result" | "read_value" => Some(Self::ReadResult),
            "analysis" | "find_culprit" => Some(Self::Analysis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::TestRun => "test-run",
            Self::ReadResult => "read-result",
            Self::Analysis => "analysis",
        }
    }

    /// Column name used in the report's `quests` list.
    ///
    /// Analysis tasks describe the whole job and have no column.
    pub fn quest(&self) -> Option<&'static str> {
        match self {
            Self::Build => Some("Build"),
            Self::TestRun => Some("Test"),
            Self::ReadResult => Some("Get results"),
            Self::Analysis => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task node as handed over by the graph walker. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    task_type: String,
    #[serde(default)]
    payload: Value,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            payload,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn kind(&self) -> Option<TaskKind> {
        TaskKind::from_type_name(&self.task_type)
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Payload lookup by JSON pointer (`/buildbucket_build/id`).
    pub fn field(&self, pointer: &str) -> Option<&Value> {
        self.payload.pointer(pointer).filter(|v| !v.is_null())
    }

    /// The change under test. Every execution-style task must carry one.
    pub fn change(&self) -> Result<&Value, ReportError> {
        self.field("/change")
            .ok_or_else(|| self.malformed("payload has no `change`"))
    }

    /// Attempt ordinal; defaults to 0 when the payload does not say.
    pub fn attempt_index(&self) -> Result<usize, ReportError> {
        match self.field("/index") {
            None => Ok(0),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| self.malformed(format!("`index` must be a non-negative integer, got {v}"))),
        }
    }

    /// Numeric samples recorded by a read-result task (`result_values`).
    pub fn result_values(&self) -> Result<Vec<f64>, ReportError> {
        let Some(values) = self.field("/result_values") else {
            return Ok(Vec::new());
        };
        let items = values
            .as_array()
            .ok_or_else(|| self.malformed("`result_values` must be an array"))?;
        items
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| self.malformed(format!("non-numeric result value {v}")))
            })
            .collect()
    }

    pub(crate) fn malformed(&self, reason: impl Into<String>) -> ReportError {
        ReportError::MalformedPayload {
            task: self.id.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::build("build", Some(TaskKind::Build))]
    #[case::find_isolate("find_isolate", Some(TaskKind::Build))]
    #[case::test_run("test-run", Some(TaskKind::TestRun))]
    #[case::run_test("run_test", Some(TaskKind::TestRun))]
    #[case::read_result("read-result", Some(TaskKind::ReadResult))]
    #[case::read_value("read_value", Some(TaskKind::ReadResult))]
    #[case::analysis("analysis", Some(TaskKind::Analysis))]
    #[case::find_culprit("find_culprit", Some(TaskKind::Analysis))]
    #[case::unknown("upload_results", None)]
    fn task_type_names_resolve(#[case] name: &str, #[case] expected: Option<TaskKind>) {
        assert_eq!(TaskKind::from_type_name(name), expected);
    }

    #[test]
    fn quest_names_match_report_columns() {
        assert_eq!(TaskKind::Build.quest(), Some("Build"));
        assert_eq!(TaskKind::TestRun.quest(), Some("Test"));
        assert_eq!(TaskKind::ReadResult.quest(), Some("Get results"));
        assert_eq!(TaskKind::Analysis.quest(), None);
    }

    #[test]
    fn attempt_index_defaults_to_zero() {
        let task = Task::new("t1", "build", json!({"change": "A"}));
        assert_eq!(task.attempt_index().unwrap(), 0);

        let task = Task::new("t2", "build", json!({"change": "A", "index": 3}));
        assert_eq!(task.attempt_index().unwrap(), 3);
    }

    #[test]
    fn negative_index_is_malformed() {
        let task = Task::new("t1", "build", json!({"change": "A", "index": -1}));
        let err = task.attempt_index().unwrap_err();
        assert!(matches!(err, ReportError::MalformedPayload { .. }));
    }

    #[test]
    fn missing_change_is_malformed() {
        let task = Task::new("t1", "build", json!({"change": null}));
        assert!(task.change().is_err());
    }

    #[test]
    fn result_values_are_read_in_order() {
        let task = Task::new("r1", "read_value", json!({"result_values": [1, 2.5, 3]}));
        assert_eq!(task.result_values().unwrap(), vec![1.0, 2.5, 3.0]);

        let task = Task::new("r2", "read_value", json!({"result_values": ["x"]}));
        assert!(task.result_values().is_err());
    }

    #[test]
    fn task_deserializes_without_payload() {
        let task: Task = serde_json::from_str(r#"{"id": "t1", "task_type": "run_test"}"#).unwrap();
        assert_eq!(task.id().as_str(), "t1");
        assert_eq!(task.kind(), Some(TaskKind::TestRun));
        assert!(task.payload().is_null());
    }
}
