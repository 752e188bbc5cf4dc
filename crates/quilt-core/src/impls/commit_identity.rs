//! CommitIdentity - commit 列 (+ patch) による change の同一性
//!
//! A change object looks like
//!
//! ```text
//! { "commits": [{"repository": "chromium", "git_hash": "abc...", "url": ..., "subject": ...}],
//!   "patch": {"server": ..., "change": ..., "revision": ..., "url": ...} }
//! ```
//!
//! Only the repository/hash pairs and the patch coordinates identify it; the
//! display fields (urls, subjects, authors, ...) vary between encodings.

use serde_json::{Map, Value, json};

use crate::domain::{ChangeKey, canonical_json};
use crate::error::ReportError;
use crate::ports::ChangeIdentity;

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitIdentity;

impl ChangeIdentity for CommitIdentity {
    fn key(&self, change: &Value) -> Result<ChangeKey, ReportError> {
        match change {
            Value::Null => Err(ReportError::MalformedChange("change is null".to_string())),
            Value::Object(map) if map.contains_key("commits") => commit_key(map),
            other => Ok(ChangeKey::new(canonical_json(other))),
        }
    }
}

fn commit_key(change: &Map<String, Value>) -> Result<ChangeKey, ReportError> {
    let commits = change
        .get("commits")
        .and_then(Value::as_array)
        .ok_or_else(|| ReportError::MalformedChange("`commits` must be an array".to_string()))?;

    let mut pairs = Vec::with_capacity(commits.len());
    for commit in commits {
        let repository = identity_field(commit, "repository")?;
        let git_hash = identity_field(commit, "git_hash")?;
        pairs.push(json!([repository, git_hash.to_ascii_lowercase()]));
    }

    let patch = match change.get("patch") {
        None | Some(Value::Null) => Value::Null,
        Some(patch) => json!([
            identity_field(patch, "server")?,
            identity_field(patch, "change")?,
            identity_field(patch, "revision")?,
        ]),
    };

    // Encoded, not joined: field contents can never fake a boundary. The
    // prefix keeps these apart from opaque keys, which are bare JSON.
    let identity = json!([pairs, patch]);
    Ok(ChangeKey::new(format!("commits:{}", canonical_json(&identity))))
}

// Identity fields are strings, but gerrit change numbers often arrive as ints.
fn identity_field(value: &Value, name: &str) -> Result<String, ReportError> {
    match value.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ReportError::MalformedChange(format!(
            "missing or invalid `{name}` in {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(v: Value) -> ChangeKey {
        CommitIdentity.key(&v).unwrap()
    }

    #[test]
    fn display_fields_do_not_affect_identity() {
        let bare = json!({"commits": [{"repository": "chromium", "git_hash": "abc"}]});
        let decorated = json!({
            "commits": [{
                "repository": "chromium",
                "git_hash": "ABC",
                "url": "https://chromium.googlesource.com/chromium/src/+/abc",
                "subject": "Roll v8"
            }]
        });
        assert_eq!(key(bare), key(decorated));
    }

    #[test]
    fn commit_order_matters() {
        let a = json!({"commits": [
            {"repository": "chromium", "git_hash": "1"},
            {"repository": "v8", "git_hash": "2"}
        ]});
        let b = json!({"commits": [
            {"repository": "v8", "git_hash": "2"},
            {"repository": "chromium", "git_hash": "1"}
        ]});
        assert_ne!(key(a), key(b));
    }

    #[test]
    fn patch_is_part_of_identity() {
        let without = json!({"commits": [{"repository": "chromium", "git_hash": "abc"}]});
        let with = json!({
            "commits": [{"repository": "chromium", "git_hash": "abc"}],
            "patch": {"server": "https://review", "change": 672011, "revision": "3f2a", "url": "x"}
        });
        let null_patch = json!({
            "commits": [{"repository": "chromium", "git_hash": "abc"}],
            "patch": null
        });
        assert_ne!(key(without.clone()), key(with));
        assert_eq!(key(without), key(null_patch));
    }

    #[test]
    fn opaque_changes_use_canonical_json() {
        assert_eq!(key(json!("A")), key(json!("A")));
        assert_ne!(key(json!("A")), key(json!("B")));
        assert_eq!(key(json!({"x": 1, "y": 2})), key(json!({"y": 2, "x": 1})));
    }

    #[test]
    fn separators_inside_fields_do_not_merge_changes() {
        let packed = json!({"commits": [{"repository": "chromium", "git_hash": "aaa,v8@bbb"}]});
        let split = json!({"commits": [
            {"repository": "chromium", "git_hash": "aaa"},
            {"repository": "v8", "git_hash": "bbb"}
        ]});
        assert_ne!(key(packed), key(split));

        let base = json!([{"repository": "chromium", "git_hash": "abc"}]);
        let slash_in_server = json!({
            "commits": base,
            "patch": {"server": "s/1", "change": "2", "revision": "r"}
        });
        let slash_in_change = json!({
            "commits": base,
            "patch": {"server": "s", "change": "1/2", "revision": "r"}
        });
        assert_ne!(key(slash_in_server), key(slash_in_change));
    }

    #[test]
    fn commit_keys_never_meet_opaque_keys() {
        let commit = json!({"commits": [{"repository": "chromium", "git_hash": "abc"}]});
        let commit_key = key(commit).to_string();
        assert_ne!(key(json!(commit_key.clone())).to_string(), commit_key);
    }

    #[test]
    fn malformed_commits_are_rejected() {
        let err = CommitIdentity
            .key(&json!({"commits": [{"repository": "chromium"}]}))
            .unwrap_err();
        assert!(matches!(err, ReportError::MalformedChange(_)));
        assert!(CommitIdentity.key(&json!({"commits": "abc"})).is_err());
        assert!(CommitIdentity.key(&Value::Null).is_err());
    }
}
