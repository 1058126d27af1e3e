//! In-memory execution store.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use skillflow_core::repository::execution::ExecutionStore;
use skillflow_types::error::RepositoryError;
use skillflow_types::execution::{Execution, ExecutionFilter};
use uuid::Uuid;

/// `ExecutionStore` held in a concurrent map keyed by execution ID.
#[derive(Default)]
pub struct InMemoryExecutionStore {
    executions: DashMap<Uuid, Execution>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}

impl ExecutionStore for InMemoryExecutionStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        match self.executions.entry(execution.id) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "execution {} already exists",
                execution.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(execution.clone());
                Ok(())
            }
        }
    }

    async fn update_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        match self.executions.get_mut(&execution.id) {
            Some(mut stored) => {
                *stored = execution.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_execution(&self, id: &Uuid) -> Result<Option<Execution>, RepositoryError> {
        Ok(self.executions.get(id).map(|e| e.value().clone()))
    }

    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, RepositoryError> {
        let mut executions: Vec<Execution> = self
            .executions
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            executions.truncate(limit as usize);
        }
        Ok(executions)
    }
}
