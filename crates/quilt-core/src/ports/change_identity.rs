//! ChangeIdentity port - change の同一性
//!
//! Two differently-encoded changes can denote the same code/config point.
//! The aggregator never compares raw change values; it compares the keys this
//! port produces.

use serde_json::Value;

use crate::domain::ChangeKey;
use crate::error::ReportError;

pub trait ChangeIdentity: Send + Sync {
    /// Normalize `change` into its identity key. Equal keys mean the same
    /// state record.
    fn key(&self, change: &Value) -> Result<ChangeKey, ReportError>;
}
