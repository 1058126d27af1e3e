//! Application state wiring the engine to its concrete collaborators.
//!
//! `SkillEngine` is generic over its catalog, tool invoker and execution
//! store; AppState pins it to SQLite stores and the HTTP tool invoker.

use std::path::PathBuf;
use std::sync::Arc;

use skillflow_core::repository::skill::SkillCatalog;
use skillflow_core::skill::engine::SkillEngine;
use skillflow_infra::config::load_global_config;
use skillflow_infra::filesystem::{database_url, ensure_data_dir, resolve_data_dir};
use skillflow_infra::sqlite::execution::SqliteExecutionStore;
use skillflow_infra::sqlite::pool::DatabasePool;
use skillflow_infra::sqlite::skill::SqliteSkillCatalog;
use skillflow_infra::tool::http::HttpToolInvoker;
use skillflow_types::config::GlobalConfig;
use skillflow_types::error::RepositoryError;
use skillflow_types::skill::Skill;
use uuid::Uuid;

/// The engine pinned to the infra implementations.
pub type ConcreteEngine = SkillEngine<SqliteSkillCatalog, HttpToolInvoker, SqliteExecutionStore>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let invoker = HttpToolInvoker::new(&config.tools)?;
        tracing::debug!(
            data_dir = %data_dir.display(),
            tools = ?invoker.tools().collect::<Vec<_>>(),
            "configured tool endpoints"
        );

        let engine = SkillEngine::new(
            SqliteSkillCatalog::new(db_pool.clone()),
            invoker,
            SqliteExecutionStore::new(db_pool),
            config.engine.clone(),
        );

        Ok(Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            data_dir,
        })
    }

    pub fn catalog(&self) -> &SqliteSkillCatalog {
        self.engine.catalog()
    }

    /// Look a skill up by UUID, falling back to its name.
    pub async fn find_skill(&self, key: &str) -> Result<Option<Skill>, RepositoryError> {
        find_skill(self.catalog(), key).await
    }
}

/// Resolve `key` as a skill UUID first, then as a skill name.
pub async fn find_skill(
    catalog: &impl SkillCatalog,
    key: &str,
) -> Result<Option<Skill>, RepositoryError> {
    if let Ok(id) = key.parse::<Uuid>() {
        if let Some(skill) = catalog.get(&id).await? {
            return Ok(Some(skill));
        }
    }
    catalog.get_by_name(key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillflow_infra::memory::skill::InMemorySkillCatalog;

    #[tokio::test]
    async fn test_find_skill_by_id_or_name() {
        let skill: Skill = serde_json::from_value(json!({
            "name": "renewal-outreach",
            "steps": [{"id": "s1", "tool": "noop"}]
        }))
        .unwrap();
        let catalog = InMemorySkillCatalog::with_skills([skill.clone()]);

        let by_id = find_skill(&catalog, &skill.id.to_string()).await.unwrap();
        assert_eq!(by_id.map(|s| s.id), Some(skill.id));

        let by_name = find_skill(&catalog, "renewal-outreach").await.unwrap();
        assert_eq!(by_name.map(|s| s.id), Some(skill.id));

        assert!(find_skill(&catalog, "missing").await.unwrap().is_none());
        assert!(find_skill(&catalog, &Uuid::now_v7().to_string()).await.unwrap().is_none());
    }
}
