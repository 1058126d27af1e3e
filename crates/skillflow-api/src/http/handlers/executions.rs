//! Execution inspection handlers.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use skillflow_types::execution::{Execution, ExecutionFilter, ExecutionStatus};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Query parameters for listing executions.
#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    pub skill_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<String>,
    /// Maximum number of executions to return (default 50).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

impl ListExecutionsQuery {
    fn into_filter(self) -> Result<ExecutionFilter, AppError> {
        let status = self
            .status
            .map(|s| s.parse::<ExecutionStatus>())
            .transpose()
            .map_err(AppError::Validation)?;
        Ok(ExecutionFilter {
            skill_id: self.skill_id,
            user_id: self.user_id,
            customer_id: self.customer_id,
            status,
            limit: Some(self.limit),
        })
    }
}

/// Build the execution sub-router, mounted at `/api/v1`.
pub fn execution_routes() -> Router<AppState> {
    Router::new()
        .route("/executions", get(list_executions))
        .route("/executions/{id}", get(get_execution))
}

/// GET /api/v1/executions - List executions, newest first.
pub async fn list_executions(
    State(state): State<AppState>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<ApiResponse<Vec<Execution>>>, AppError> {
    let timer = RequestTimer::start();
    let executions = state.engine.list_executions(&query.into_filter()?).await?;

    Ok(Json(timer.respond(executions).with_link("self", "/api/v1/executions")))
}

/// GET /api/v1/executions/{id} - Get one execution with its step results.
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Execution>>, AppError> {
    let timer = RequestTimer::start();
    let execution = state
        .engine
        .get_execution(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Execution '{id}' not found")))?;

    let skill_link = format!("/api/v1/skills/{}", execution.skill_id);
    Ok(Json(timer.respond(execution).with_link("skill", &skill_link)))
}
