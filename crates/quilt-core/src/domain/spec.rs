//! Input specs for a report run (Job / Task).
//!
//! A job file lists the task graph the walker visits plus the event handed to
//! every evaluation. Payloads stay `serde_json::Value`; the producers decide
//! what they need from them.

use serde::{Deserialize, Serialize};

use super::{Event, Task, TaskId};

/// A job: the task graph whose outputs make up one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub tasks: Vec<TaskSpec>,

    #[serde(default)]
    pub event: Event,
}

/// A task plus the ids of the tasks it waits for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(flatten)]
    pub task: Task,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
}

impl TaskSpec {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, id: impl Into<TaskId>) -> Self {
        self.dependencies.push(id.into());
        self
    }
}
