//! Data directory layout for skillflow.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   skillflow.db
//!   skills/        # skill definition files picked up by `skill import`
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SKILLFLOW_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SKILLFLOW_DATA_DIR` environment variable
/// 2. `~/.skillflow` under the user's home directory
/// 3. `.skillflow` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".skillflow");
    }

    PathBuf::from(".skillflow")
}

/// SQLite URL for the database inside `data_dir`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("skillflow.db").display())
}

/// Directory scanned for skill definition files.
pub fn skills_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("skills")
}

/// Create the data directory (and its `skills/` subdirectory) if missing.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), std::io::Error> {
    tokio::fs::create_dir_all(skills_dir(data_dir)).await
}
