//! SQLite execution store implementation.
//!
//! One row per execution. Inputs, variables, step results and output are
//! JSON columns; the identifying and filterable fields are plain columns.

use skillflow_core::repository::execution::ExecutionStore;
use skillflow_types::error::RepositoryError;
use skillflow_types::execution::{Execution, ExecutionFilter, ExecutionStatus};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ExecutionStore`.
pub struct SqliteExecutionStore {
    pool: DatabasePool,
}

impl SqliteExecutionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct ExecutionRow {
    id: String,
    skill_id: String,
    skill_name: String,
    user_id: String,
    customer_id: Option<String>,
    status: String,
    inputs: String,
    variables: String,
    step_results: String,
    output: Option<String>,
    error: Option<String>,
    started_at: String,
    completed_at: Option<String>,
}

impl ExecutionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            skill_id: row.try_get("skill_id")?,
            skill_name: row.try_get("skill_name")?,
            user_id: row.try_get("user_id")?,
            customer_id: row.try_get("customer_id")?,
            status: row.try_get("status")?,
            inputs: row.try_get("inputs")?,
            variables: row.try_get("variables")?,
            step_results: row.try_get("step_results")?,
            output: row.try_get("output")?,
            error: row.try_get("error")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    fn into_execution(self) -> Result<Execution, RepositoryError> {
        let status: ExecutionStatus = self
            .status
            .parse()
            .map_err(RepositoryError::Query)?;

        let output = self
            .output
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid output JSON: {e}")))?;

        Ok(Execution {
            id: parse_uuid(&self.id)?,
            skill_id: parse_uuid(&self.skill_id)?,
            skill_name: self.skill_name,
            user_id: self.user_id,
            customer_id: self.customer_id,
            inputs: serde_json::from_str(&self.inputs)
                .map_err(|e| RepositoryError::Query(format!("invalid inputs JSON: {e}")))?,
            variables: serde_json::from_str(&self.variables)
                .map_err(|e| RepositoryError::Query(format!("invalid variables JSON: {e}")))?,
            step_results: serde_json::from_str(&self.step_results)
                .map_err(|e| RepositoryError::Query(format!("invalid step_results JSON: {e}")))?,
            output,
            status,
            error: self.error,
            started_at: parse_datetime(&self.started_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

/// JSON columns of an execution, serialized once per write.
struct JsonColumns {
    inputs: String,
    variables: String,
    step_results: String,
    output: Option<String>,
}

impl JsonColumns {
    fn of(execution: &Execution) -> Result<Self, RepositoryError> {
        Ok(Self {
            inputs: serde_json::to_string(&execution.inputs)?,
            variables: serde_json::to_string(&execution.variables)?,
            step_results: serde_json::to_string(&execution.step_results)?,
            output: execution
                .output
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

// ---------------------------------------------------------------------------
// ExecutionStore impl
// ---------------------------------------------------------------------------

impl ExecutionStore for SqliteExecutionStore {
    async fn create_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        let json = JsonColumns::of(execution)?;

        let result = sqlx::query(
            r#"INSERT INTO skill_executions
               (id, skill_id, skill_name, user_id, customer_id, status, inputs, variables,
                step_results, output, error, started_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(execution.id.to_string())
        .bind(execution.skill_id.to_string())
        .bind(&execution.skill_name)
        .bind(&execution.user_id)
        .bind(&execution.customer_id)
        .bind(execution.status.as_str())
        .bind(&json.inputs)
        .bind(&json.variables)
        .bind(&json.step_results)
        .bind(&json.output)
        .bind(&execution.error)
        .bind(format_datetime(&execution.started_at))
        .bind(execution.completed_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "execution {} already exists",
                execution.id
            ))),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn update_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        let json = JsonColumns::of(execution)?;

        let result = sqlx::query(
            r#"UPDATE skill_executions SET
                 status = ?, variables = ?, step_results = ?, output = ?, error = ?, completed_at = ?
               WHERE id = ?"#,
        )
        .bind(execution.status.as_str())
        .bind(&json.variables)
        .bind(&json.step_results)
        .bind(&json.output)
        .bind(&execution.error)
        .bind(execution.completed_at.as_ref().map(format_datetime))
        .bind(execution.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_execution(&self, id: &Uuid) -> Result<Option<Execution>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM skill_executions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let r = ExecutionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(r.into_execution()?))
            }
            None => Ok(None),
        }
    }

    async fn list_executions(
        &self,
        filter: &ExecutionFilter,
    ) -> Result<Vec<Execution>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM skill_executions");
        let mut conditions: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(skill_id) = filter.skill_id {
            conditions.push("skill_id = ?");
            binds.push(skill_id.to_string());
        }
        if let Some(user_id) = &filter.user_id {
            conditions.push("user_id = ?");
            binds.push(user_id.clone());
        }
        if let Some(customer_id) = &filter.customer_id {
            conditions.push("customer_id = ?");
            binds.push(customer_id.clone());
        }
        if let Some(status) = filter.status {
            conditions.push("status = ?");
            binds.push(status.as_str().to_string());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        // UUIDv7 ids break ties between executions started in the same instant.
        sql.push_str(" ORDER BY started_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value.as_str());
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut executions = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = ExecutionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            executions.push(r.into_execution()?);
        }
        Ok(executions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
