//! Skill catalog trait definition.

use skillflow_types::error::RepositoryError;
use skillflow_types::skill::{Skill, SkillFilter};
use uuid::Uuid;

/// Catalog of skill definitions.
///
/// The engine only reads from the catalog (`get`); the CLI and REST layers
/// use the rest to manage definitions.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait SkillCatalog: Send + Sync {
    /// Get a skill by its UUID.
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    /// Get a skill by its (case-sensitive) name.
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    /// List skills matching `filter`, ordered by name.
    fn list(
        &self,
        filter: &SkillFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Skill>, RepositoryError>> + Send;

    /// Upsert a skill (insert or replace by ID).
    ///
    /// Returns `RepositoryError::Conflict` if another skill already uses the name.
    fn save(
        &self,
        skill: &Skill,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a skill by ID. Returns `true` if it existed.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
