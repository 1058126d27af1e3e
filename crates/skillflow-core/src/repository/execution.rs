//! Execution store trait definition.
//!
//! Writes are plain row-level upserts with no transactions spanning a run:
//! if a write fails mid-run the stored record can lag behind the in-memory
//! execution.

use skillflow_types::error::RepositoryError;
use skillflow_types::execution::{Execution, ExecutionFilter};
use uuid::Uuid;

/// Durable record of skill executions.
pub trait ExecutionStore: Send + Sync {
    /// Insert a new execution. Fails with `Conflict` if the ID exists.
    fn create_execution(
        &self,
        execution: &Execution,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the stored state of an existing execution.
    fn update_execution(
        &self,
        execution: &Execution,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get an execution by its UUID.
    fn get_execution(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Execution>, RepositoryError>> + Send;

    /// List executions matching `filter`, newest first.
    fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Execution>, RepositoryError>> + Send;
}
