//! SQLite skill catalog implementation.
//!
//! Skills are stored as JSON definition blobs; name, category, source and
//! enabled are duplicated into columns so catalog queries can filter on them.

use skillflow_core::repository::skill::SkillCatalog;
use skillflow_types::error::RepositoryError;
use skillflow_types::skill::{Skill, SkillFilter};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation};

/// SQLite-backed implementation of `SkillCatalog`.
pub struct SqliteSkillCatalog {
    pool: DatabasePool,
}

impl SqliteSkillCatalog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn skill_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Skill, RepositoryError> {
    let definition: String = row
        .try_get("definition")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    serde_json::from_str(&definition)
        .map_err(|e| RepositoryError::Query(format!("invalid skill definition JSON: {e}")))
}

impl SkillCatalog for SqliteSkillCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Skill>, RepositoryError> {
        let row = sqlx::query("SELECT definition FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(skill_from_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, RepositoryError> {
        let row = sqlx::query("SELECT definition FROM skills WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(skill_from_row).transpose()
    }

    async fn list(&self, filter: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
        let mut sql = String::from("SELECT definition FROM skills");
        let mut conditions: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(category) = &filter.category {
            conditions.push("category = ?");
            binds.push(category.clone());
        }
        if let Some(source) = filter.source {
            conditions.push("source = ?");
            binds.push(source.to_string());
        }
        if let Some(enabled) = filter.enabled {
            conditions.push(if enabled { "enabled = 1" } else { "enabled = 0" });
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY name ASC");

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value.as_str());
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut skills = Vec::with_capacity(rows.len());
        for row in &rows {
            let skill = skill_from_row(row)?;
            // Tags live inside the JSON blob.
            if filter.matches(&skill) {
                skills.push(skill);
            }
        }
        Ok(skills)
    }

    async fn save(&self, skill: &Skill) -> Result<(), RepositoryError> {
        let definition = serde_json::to_string(skill)?;

        let result = sqlx::query(
            r#"INSERT INTO skills (id, name, category, source, enabled, definition, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 source = excluded.source,
                 enabled = excluded.enabled,
                 definition = excluded.definition,
                 updated_at = excluded.updated_at"#,
        )
        .bind(skill.id.to_string())
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(skill.source.to_string())
        .bind(skill.enabled)
        .bind(&definition)
        .bind(format_datetime(&skill.created_at))
        .bind(format_datetime(&skill.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "skill name '{}' already exists",
                skill.name
            ))),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;
    use serde_json::json;
    use skillflow_types::skill::SkillSource;

    fn skill(name: &str, category: &str) -> Skill {
        serde_json::from_value(json!({
            "name": name,
            "category": category,
            "tags": ["cs"],
            "steps": [{"id": "a", "tool": "lookup_customer", "params": {"id": "{{customer_id}}"}}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let (pool, _dir) = test_pool().await;
        let catalog = SqliteSkillCatalog::new(pool);
        let original = skill("health-check", "health");
        catalog.save(&original).await.unwrap();

        let loaded = catalog.get(&original.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "health-check");
        assert_eq!(loaded.steps[0].params["id"], json!("{{customer_id}}"));

        let by_name = catalog.get_by_name("health-check").await.unwrap().unwrap();
        assert_eq!(by_name.id, original.id);

        assert!(catalog.get(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let (pool, _dir) = test_pool().await;
        let catalog = SqliteSkillCatalog::new(pool);
        let mut s = skill("qbr-prep", "reporting");
        catalog.save(&s).await.unwrap();

        s.description = "Prepare the quarterly business review".to_string();
        s.enabled = false;
        catalog.save(&s).await.unwrap();

        let all = catalog.list(&SkillFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].enabled);
        assert_eq!(all[0].description, "Prepare the quarterly business review");
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (pool, _dir) = test_pool().await;
        let catalog = SqliteSkillCatalog::new(pool);
        catalog.save(&skill("dup", "general")).await.unwrap();

        let err = catalog.save(&skill("dup", "general")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_by_name() {
        let (pool, _dir) = test_pool().await;
        let catalog = SqliteSkillCatalog::new(pool);
        catalog.save(&skill("zeta", "health")).await.unwrap();
        catalog.save(&skill("alpha", "health")).await.unwrap();
        let mut system = skill("beta", "onboarding");
        system.source = SkillSource::System;
        system.tags = vec!["kickoff".to_string()];
        catalog.save(&system).await.unwrap();

        let all = catalog.list(&SkillFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);

        let health = catalog
            .list(&SkillFilter {
                category: Some("health".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(health.len(), 2);

        let system_only = catalog
            .list(&SkillFilter {
                source: Some(SkillSource::System),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(system_only.len(), 1);
        assert_eq!(system_only[0].name, "beta");

        let tagged = catalog
            .list(&SkillFilter {
                tag: Some("kickoff".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, _dir) = test_pool().await;
        let catalog = SqliteSkillCatalog::new(pool);
        let s = skill("temp", "general");
        catalog.save(&s).await.unwrap();

        assert!(catalog.delete(&s.id).await.unwrap());
        assert!(!catalog.delete(&s.id).await.unwrap());
        assert!(catalog.get(&s.id).await.unwrap().is_none());
    }
}
