//! Skill catalog and execution-trigger handlers.
//!
//! `{id}` path segments accept either a skill UUID or a skill name.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

use skillflow_core::repository::skill::SkillCatalog;
use skillflow_core::skill::definition::validate_definition;
use skillflow_types::execution::{Execution, ExecutionContext};
use skillflow_types::skill::{Skill, SkillFilter, SkillSource};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for listing skills.
#[derive(Debug, Default, Deserialize)]
pub struct ListSkillsQuery {
    pub category: Option<String>,
    pub source: Option<String>,
    pub enabled: Option<bool>,
    pub tag: Option<String>,
}

impl ListSkillsQuery {
    fn into_filter(self) -> Result<SkillFilter, AppError> {
        let source = self
            .source
            .map(|s| s.parse::<SkillSource>())
            .transpose()
            .map_err(AppError::Validation)?;
        Ok(SkillFilter {
            category: self.category,
            source,
            enabled: self.enabled,
            tag: self.tag,
        })
    }
}

/// Body of `POST /skills/{id}/execute`.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// Actor recorded on the execution (defaults to "api").
    pub actor_id: Option<String>,
    pub customer_id: Option<String>,
    /// Explicit approval for skills that require it.
    #[serde(default)]
    pub approved: bool,
}

impl ExecuteRequest {
    fn context(&self) -> ExecutionContext {
        ExecutionContext {
            actor_id: self.actor_id.clone().unwrap_or_else(|| "api".to_string()),
            customer_id: self.customer_id.clone(),
            approved: self.approved,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the skill sub-router, mounted at `/api/v1`.
pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route("/skills/{id}", get(get_skill).delete(delete_skill))
        .route("/skills/{id}/execute", post(execute_skill))
}

async fn require_skill(state: &AppState, key: &str) -> Result<Skill, AppError> {
    state
        .find_skill(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill '{key}' not found")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/skills - List skills matching the query filters.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(query): Query<ListSkillsQuery>,
) -> Result<Json<ApiResponse<Vec<Skill>>>, AppError> {
    let timer = RequestTimer::start();
    let skills = state.catalog().list(&query.into_filter()?).await?;

    Ok(Json(timer.respond(skills).with_link("self", "/api/v1/skills")))
}

/// POST /api/v1/skills - Register (or replace) a skill definition.
///
/// A body without an `id` that reuses an existing name updates that skill.
pub async fn create_skill(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<Skill>>), AppError> {
    let timer = RequestTimer::start();

    let has_id = body.get("id").is_some();
    let mut skill: Skill = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("invalid skill definition: {e}")))?;
    validate_definition(&skill)?;

    let existing = state.catalog().get_by_name(&skill.name).await?;
    if let Some(existing) = existing.filter(|_| !has_id) {
        skill.id = existing.id;
        skill.created_at = existing.created_at;
    }
    skill.updated_at = Utc::now();

    state.catalog().save(&skill).await?;
    tracing::info!(skill_id = %skill.id, name = skill.name.as_str(), "skill saved");

    let self_link = format!("/api/v1/skills/{}", skill.id);
    Ok((
        StatusCode::CREATED,
        Json(timer.respond(skill).with_link("self", &self_link)),
    ))
}

/// GET /api/v1/skills/{id} - Get a skill by UUID or name.
pub async fn get_skill(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Skill>>, AppError> {
    let timer = RequestTimer::start();
    let skill = require_skill(&state, &key).await?;

    let self_link = format!("/api/v1/skills/{}", skill.id);
    let executions_link = format!("/api/v1/executions?skill_id={}", skill.id);
    Ok(Json(
        timer
            .respond(skill)
            .with_link("self", &self_link)
            .with_link("executions", &executions_link),
    ))
}

/// DELETE /api/v1/skills/{id} - Delete a skill.
pub async fn delete_skill(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let timer = RequestTimer::start();
    let skill = require_skill(&state, &key).await?;
    state.catalog().delete(&skill.id).await?;

    Ok(Json(timer.respond(
        serde_json::json!({"deleted": true, "id": skill.id.to_string()}),
    )))
}

/// POST /api/v1/skills/{id}/execute - Run a skill and return the finished execution.
///
/// A run whose steps failed is still a `200` with `status: "failed"`; error
/// statuses are reserved for runs that were refused or could not be stored.
pub async fn execute_skill(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Option<Json<ExecuteRequest>>,
) -> Result<Json<ApiResponse<Execution>>, AppError> {
    let timer = RequestTimer::start();
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let skill = require_skill(&state, &key).await?;
    let ctx = request.context();
    let execution = state
        .engine
        .execute_by_id(&skill.id, request.inputs, &ctx)
        .await?;

    let self_link = format!("/api/v1/executions/{}", execution.id);
    Ok(Json(timer.respond(execution).with_link("self", &self_link)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execute_request_defaults() {
        let req: ExecuteRequest = serde_json::from_value(json!({})).unwrap();
        let ctx = req.context();
        assert_eq!(ctx.actor_id, "api");
        assert!(!ctx.approved);
        assert!(req.inputs.is_empty());

        let req: ExecuteRequest = serde_json::from_value(json!({
            "inputs": {"customer_id": "cus_1"},
            "actor_id": "csm-3",
            "customer_id": "cus_1",
            "approved": true
        }))
        .unwrap();
        let ctx = req.context();
        assert_eq!(ctx.actor_id, "csm-3");
        assert_eq!(ctx.customer_id.as_deref(), Some("cus_1"));
        assert!(ctx.approved);
    }

    #[test]
    fn test_list_query_rejects_unknown_source() {
        let query = ListSkillsQuery {
            source: Some("vendor".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::Validation(_))));

        let query = ListSkillsQuery {
            source: Some("system".to_string()),
            enabled: Some(true),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.source, Some(SkillSource::System));
        assert_eq!(filter.enabled, Some(true));
    }
}
