use thiserror::Error;

use crate::domain::TaskId;

/// Failures raised while folding task output into a report.
///
/// Missing data is never an error: a task without output, or a task type
/// nobody registered, simply contributes nothing.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("order_changes lists {declared} changes but the report holds {existing} states")]
    OrderLengthMismatch { declared: usize, existing: usize },

    #[error("change {0} is not listed in order_changes")]
    UndeclaredChange(String),

    #[error("change {0} is listed more than once in order_changes")]
    DuplicateOrderedChange(String),

    #[error("malformed merge instruction: {0}")]
    MalformedInstruction(String),

    #[error("malformed change: {0}")]
    MalformedChange(String),

    #[error("fragment must be a JSON object, got {0}")]
    NotAFragment(String),

    #[error("malformed fragment for task_id={task}: {reason}")]
    MalformedFragment { task: TaskId, reason: String },

    #[error("malformed payload for task_id={task}: {reason}")]
    MalformedPayload { task: TaskId, reason: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
