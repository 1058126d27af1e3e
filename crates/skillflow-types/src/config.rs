//! Global configuration types for skillflow.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls engine
//! behaviour and the tool endpoints used by the HTTP tool invoker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.skillflow/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Settings for the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for a single tool invocation attempt.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Persist the execution record after every step, not only at the end.
    #[serde(default = "default_persist_each_step")]
    pub persist_each_step: bool,

    /// Reject skills that use unknown condition kinds, operators or
    /// transforms instead of falling back to run / pass-through.
    #[serde(default)]
    pub strict_definitions: bool,
}

fn default_step_timeout_secs() -> u64 {
    300
}

fn default_persist_each_step() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
            persist_each_step: default_persist_each_step(),
            strict_definitions: false,
        }
    }
}

/// Endpoints for the HTTP tool invoker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-request HTTP timeout.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Tool name -> endpoint URL.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            endpoints: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.engine.step_timeout_secs, 300);
        assert!(config.engine.persist_each_step);
        assert!(!config.engine.strict_definitions);
        assert_eq!(config.tools.http_timeout_secs, 30);
        assert!(config.tools.endpoints.is_empty());
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
[engine]
step_timeout_secs = 60
strict_definitions = true

[tools]
http_timeout_secs = 10

[tools.endpoints]
send_email = "http://localhost:9000/tools/send_email"
lookup_customer = "http://localhost:9000/tools/lookup_customer"
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.step_timeout_secs, 60);
        assert!(config.engine.persist_each_step, "unset field keeps its default");
        assert!(config.engine.strict_definitions);
        assert_eq!(config.tools.http_timeout_secs, 10);
        assert_eq!(config.tools.endpoints.len(), 2);
        assert_eq!(
            config.tools.endpoints["send_email"],
            "http://localhost:9000/tools/send_email"
        );
    }
}
