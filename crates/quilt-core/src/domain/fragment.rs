//! Fragment - one task's contribution to the report, as a producer shaped it.
//!
//! The engine never looks inside a fragment except to decide whether it is
//! empty; the report stores it verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReportError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(Map<String, Value>);

impl Fragment {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Accepts JSON objects only; anything else is not a fragment.
    pub fn from_value(value: Value) -> Result<Self, ReportError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ReportError::NotAFragment(other.to_string())),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A `{key, value, url}` triple shown next to an execution in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Detail {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
