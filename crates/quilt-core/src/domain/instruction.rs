//! Merge instructions: the canonical shape transformers emit.
//!
//! An instruction is transient. It describes how one task evaluation edits
//! the report and is dropped once the aggregator has folded it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Fragment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeInstruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateUpdate>,

    /// Canonical order of every change in the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_changes: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Parameters>,
}

impl MergeInstruction {
    pub fn state(update: StateUpdate) -> Self {
        Self {
            state: Some(update),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, changes: Vec<Value>) -> Self {
        self.order_changes = Some(changes);
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.set_parameters = Some(parameters);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.order_changes.is_none() && self.set_parameters.is_none()
    }
}

/// One edit targeting a single (change, quest) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateUpdate {
    pub change: Value,
    pub quest: String,

    /// Attempt ordinal.
    #[serde(default)]
    pub index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_execution: Option<Fragment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append_result_values: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_comparison: Option<Comparisons>,
}

impl StateUpdate {
    pub fn new(change: Value, quest: impl Into<String>) -> Self {
        Self {
            change,
            quest: quest.into(),
            index: 0,
            add_execution: None,
            append_result_values: Vec::new(),
            set_comparison: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_execution(mut self, fragment: Fragment) -> Self {
        self.add_execution = Some(fragment);
        self
    }

    pub fn with_result_values(mut self, values: Vec<f64>) -> Self {
        self.append_result_values = values;
        self
    }

    pub fn with_comparison(mut self, comparison: Comparisons) -> Self {
        self.set_comparison = Some(comparison);
        self
    }
}

/// Comparison of a change against its neighbours.
///
/// Used both as the stored value and as the patch merged into it. Each key
/// has three states: absent (`None`), present but null (`Some(None)`), and
/// set (`Some(Some(_))`). A present null still overwrites on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comparisons {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub next: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub prev: Option<Option<String>>,
}

impl Comparisons {
    pub fn next(value: Option<&str>) -> Self {
        Self {
            next: Some(value.map(str::to_string)),
            prev: None,
        }
    }

    pub fn prev(value: Option<&str>) -> Self {
        Self {
            next: None,
            prev: Some(value.map(str::to_string)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    /// Field-by-field merge; keys absent from `patch` are left alone.
    pub fn merge(&mut self, patch: &Comparisons) {
        if let Some(next) = &patch.next {
            self.next = Some(next.clone());
        }
        if let Some(prev) = &patch.prev {
            self.prev = Some(prev.clone());
        }
    }
}

// `null` must deserialize as "present, empty", not as "absent".
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Job-level parameters stamped at the report root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    #[serde(default)]
    pub comparison_mode: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
}

impl Parameters {
    pub fn new(comparison_mode: Option<&str>, metric: Option<&str>) -> Self {
        Self {
            comparison_mode: comparison_mode.map(str::to_string),
            metric: metric.map(str::to_string),
        }
    }
}
