//! In-memory skill catalog.

use dashmap::DashMap;
use skillflow_core::repository::skill::SkillCatalog;
use skillflow_types::error::RepositoryError;
use skillflow_types::skill::{Skill, SkillFilter};
use uuid::Uuid;

/// `SkillCatalog` held in a concurrent map keyed by skill ID.
#[derive(Default)]
pub struct InMemorySkillCatalog {
    skills: DashMap<Uuid, Skill>,
}

impl InMemorySkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-loaded with `skills`. Later duplicates by ID win.
    pub fn with_skills(skills: impl IntoIterator<Item = Skill>) -> Self {
        let catalog = Self::new();
        for skill in skills {
            catalog.skills.insert(skill.id, skill);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl SkillCatalog for InMemorySkillCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Skill>, RepositoryError> {
        Ok(self.skills.get(id).map(|s| s.value().clone()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, RepositoryError> {
        Ok(self
            .skills
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value().clone()))
    }

    async fn list(&self, filter: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
        let mut skills: Vec<Skill> = self
            .skills
            .iter()
            .filter(|s| filter.matches(s.value()))
            .map(|s| s.value().clone())
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(skills)
    }

    async fn save(&self, skill: &Skill) -> Result<(), RepositoryError> {
        let taken = self
            .skills
            .iter()
            .any(|s| s.name == skill.name && s.id != skill.id);
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "skill name '{}' is already in use",
                skill.name
            )));
        }
        self.skills.insert(skill.id, skill.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, RepositoryError> {
        Ok(self.skills.remove(id).is_some())
    }
}
