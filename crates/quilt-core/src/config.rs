//! Producer configuration.
//!
//! The reference producers turn payload ids into links for the UI. Only the
//! service roots are configurable; everything has a default so a partial (or
//! missing) config file is fine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Root of the isolate browser (`{isolate_server}/browse?digest=...`).
    pub isolate_server: String,

    /// Root of the swarming UI (`/bot?id=...`, `/task?id=...`).
    pub swarming_server: String,

    /// Prefix for build links (`{buildbucket_url}/{build id}`).
    pub buildbucket_url: String,
}

impl ProducerConfig {
    pub fn isolate_url(&self, digest: &str) -> String {
        format!("{}/browse?digest={digest}", trim(&self.isolate_server))
    }

    pub fn bot_url(&self, bot_id: &str) -> String {
        format!("{}/bot?id={bot_id}", trim(&self.swarming_server))
    }

    pub fn swarming_task_url(&self, task_id: &str) -> String {
        format!("{}/task?id={task_id}", trim(&self.swarming_server))
    }

    pub fn build_url(&self, build_id: &str) -> String {
        format!("{}/{build_id}", trim(&self.buildbucket_url))
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            isolate_server: "https://isolateserver.appspot.com".to_string(),
            swarming_server: "https://chromium-swarm.appspot.com".to_string(),
            buildbucket_url: "https://ci.chromium.org/b".to_string(),
        }
    }
}

fn trim(root: &str) -> &str {
    root.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ProducerConfig =
            serde_json::from_str(r#"{"swarming_server": "https://swarm.example.com/"}"#).unwrap();
        assert_eq!(config.isolate_server, ProducerConfig::default().isolate_server);
        assert_eq!(config.bot_url("bot-1"), "https://swarm.example.com/bot?id=bot-1");
    }

    #[test]
    fn urls_are_built_from_roots() {
        let config = ProducerConfig::default();
        assert_eq!(
            config.isolate_url("abc123"),
            "https://isolateserver.appspot.com/browse?digest=abc123"
        );
        assert_eq!(config.build_url("8812"), "https://ci.chromium.org/b/8812");
    }
}
