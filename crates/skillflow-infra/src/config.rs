//! Global configuration loader for skillflow.
//!
//! Reads `config.toml` from the data directory (`~/.skillflow/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use skillflow_types::config::GlobalConfig;

/// Smallest accepted per-step timeout.
const MIN_STEP_TIMEOUT_SECS: u64 = 1;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(mut config) => {
            if config.engine.step_timeout_secs < MIN_STEP_TIMEOUT_SECS {
                tracing::warn!(
                    "step_timeout_secs = 0 in {} is not allowed, using {MIN_STEP_TIMEOUT_SECS}",
                    config_path.display()
                );
                config.engine.step_timeout_secs = MIN_STEP_TIMEOUT_SECS;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.engine.step_timeout_secs, 300);
        assert!(config.tools.endpoints.is_empty());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[engine]
step_timeout_secs = 45
persist_each_step = false

[tools.endpoints]
lookup_customer = "http://crm.internal/tools/lookup"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.engine.step_timeout_secs, 45);
        assert!(!config.engine.persist_each_step);
        assert_eq!(
            config.tools.endpoints.get("lookup_customer").map(String::as_str),
            Some("http://crm.internal/tools/lookup")
        );
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.engine.step_timeout_secs, 300);
    }

    #[tokio::test]
    async fn load_global_config_clamps_zero_timeout() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "[engine]\nstep_timeout_secs = 0\n")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.engine.step_timeout_secs, 1);
    }
}
