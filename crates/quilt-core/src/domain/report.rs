//! Report - the rendered job, shaped for the web UI.
//!
//! Field names and nesting are a wire contract with the UI:
//!
//! ```text
//! { comparison_mode, metric, quests: [..],
//!   state: [{ attempts: [{ executions: [..] }], change, comparisons, result_values }] }
//! ```
//!
//! `quests` and `executions` are legacy names kept for the consumer. A quest is
//! now just a column; an execution is whatever fragment landed in that column.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Comparisons, Fragment};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub comparison_mode: Option<String>,
    pub metric: Option<String>,
    pub quests: Vec<String>,
    pub state: Vec<StateRecord>,
}

impl Report {
    /// Column index of a quest, if any task reported it.
    pub fn quest_slot(&self, quest: &str) -> Option<usize> {
        self.quests.iter().position(|q| q == quest)
    }
}

/// Everything the report knows about one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub attempts: Vec<Attempt>,

    /// The change as first reported; never rewritten.
    pub change: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparisons: Option<Comparisons>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_values: Vec<f64>,
}

impl StateRecord {
    /// A new record starts with one empty attempt.
    pub fn new(change: Value) -> Self {
        Self {
            attempts: vec![Attempt::default()],
            change,
            comparisons: None,
            result_values: Vec::new(),
        }
    }

    /// Install `fragment` at `(attempt, slot)`, growing both sequences as
    /// needed. A later write to the same position replaces the earlier one.
    pub(crate) fn record_execution(&mut self, attempt: usize, slot: usize, fragment: Fragment) {
        ensure_len(&mut self.attempts, attempt + 1, Attempt::default);
        self.attempts[attempt].set_execution(slot, fragment);
    }

    pub(crate) fn merge_comparison(&mut self, patch: &Comparisons) {
        self.comparisons
            .get_or_insert_with(Comparisons::default)
            .merge(patch);
    }
}

/// One run of a change: executions indexed by quest slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub executions: Vec<Option<Fragment>>,
}

impl Attempt {
    fn set_execution(&mut self, slot: usize, fragment: Fragment) {
        ensure_len(&mut self.executions, slot + 1, || None);
        self.executions[slot] = Some(fragment);
    }
}

/// Grow `items` to at least `len`, filling with `fill`. Never shrinks.
fn ensure_len<T>(items: &mut Vec<T>, len: usize, fill: impl FnMut() -> T) {
    if items.len() < len {
        items.resize_with(len, fill);
    }
}
