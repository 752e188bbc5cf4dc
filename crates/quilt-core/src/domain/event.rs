//! Event - 評価のきっかけ
//!
//! The graph walker hands one event to every task evaluation. The reference
//! pipeline steps accept it but do not branch on it; custom steps may.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TaskId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,

    /// Task the event was raised for, if it targets a single node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_task: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target_task: None,
            payload: Value::Null,
        }
    }

    /// The event used when building a report for the whole graph.
    pub fn report() -> Self {
        Self::new("serialize")
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_defaults_to_serialize() {
        let event: Event = serde_json::from_str(r#"{"type": "serialize"}"#).unwrap();
        assert_eq!(event, Event::default());
        assert!(event.target_task.is_none());
    }

    #[test]
    fn targeted_event_keeps_task() {
        let event: Event =
            serde_json::from_str(r#"{"type": "update", "target_task": "t1"}"#).unwrap();
        assert_eq!(event.target_task, Some(TaskId::new("t1")));
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["type"], "update");
        assert_eq!(v["target_task"], "t1");
    }
}
