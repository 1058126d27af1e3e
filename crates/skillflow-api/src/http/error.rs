//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use skillflow_core::skill::definition::DefinitionError;
use skillflow_core::skill::engine::EngineError;
use skillflow_types::error::RepositoryError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors from the skill engine.
    Engine(EngineError),
    /// A submitted skill definition is malformed.
    Definition(DefinitionError),
    /// Store failures outside an engine call.
    Repository(RepositoryError),
    /// Requested resource does not exist.
    NotFound(String),
    /// Bad request parameters.
    Validation(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl From<DefinitionError> for AppError {
    fn from(e: DefinitionError) -> Self {
        AppError::Definition(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    /// Status, machine-readable code, message and optional details.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Engine(EngineError::Validation(e)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
                Some(json!({"issues": e.issues})),
            ),
            AppError::Engine(EngineError::Definition(e)) | AppError::Definition(e) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DEFINITION",
                e.to_string(),
                None,
            ),
            AppError::Engine(EngineError::SkillNotFound(key)) => (
                StatusCode::NOT_FOUND,
                "SKILL_NOT_FOUND",
                format!("Skill '{key}' not found"),
                None,
            ),
            AppError::Engine(EngineError::SkillDisabled(name)) => (
                StatusCode::CONFLICT,
                "SKILL_DISABLED",
                format!("Skill '{name}' is disabled"),
                None,
            ),
            AppError::Engine(EngineError::ApprovalRequired(name)) => (
                StatusCode::FORBIDDEN,
                "APPROVAL_REQUIRED",
                format!("Skill '{name}' requires approval"),
                None,
            ),
            AppError::Engine(e @ EngineError::Persistence { execution, .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                e.to_string(),
                serde_json::to_value(execution.as_ref())
                    .ok()
                    .map(|execution| json!({"execution": execution})),
            ),
            AppError::Engine(EngineError::Repository(e)) | AppError::Repository(e) => {
                repository_parts(e)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

fn repository_parts(
    e: &RepositoryError,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match e {
        RepositoryError::NotFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string(), None)
        }
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            e.to_string(),
            None,
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }
        (status, Json(ApiResponse::error(code, &message, details))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use skillflow_core::skill::validator::{InputIssue, ValidationError};
    use skillflow_types::execution::{Execution, ExecutionContext};
    use skillflow_types::skill::Skill;

    fn execution() -> Execution {
        let skill: Skill = serde_json::from_value(json!({
            "name": "renewal-outreach",
            "steps": [{"id": "s1", "tool": "noop"}]
        }))
        .unwrap();
        Execution::start(&skill, Map::new(), &ExecutionContext::new("api"))
    }

    #[test]
    fn test_engine_errors_map_to_status_codes() {
        let validation = EngineError::Validation(ValidationError {
            issues: vec![InputIssue {
                input: "customer_id".to_string(),
                message: "required input is missing".to_string(),
            }],
        });
        assert_eq!(AppError::from(validation).status(), StatusCode::BAD_REQUEST);

        let cases = [
            (EngineError::ApprovalRequired("x".into()), StatusCode::FORBIDDEN),
            (EngineError::SkillNotFound("x".into()), StatusCode::NOT_FOUND),
            (EngineError::SkillDisabled("x".into()), StatusCode::CONFLICT),
            (
                EngineError::Definition(DefinitionError::Invalid("no steps".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::Repository(RepositoryError::Query("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EngineError::Persistence {
                    execution: Box::new(execution()),
                    source: RepositoryError::Connection,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_repository_errors_map_to_status_codes() {
        assert_eq!(
            AppError::from(RepositoryError::Conflict("name taken".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NotFound("Execution not found".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_details_carry_issues() {
        let err = AppError::from(EngineError::Validation(ValidationError {
            issues: vec![InputIssue {
                input: "days".to_string(),
                message: "expected number".to_string(),
            }],
        }));
        let (_, code, _, details) = err.parts();
        assert_eq!(code, "VALIDATION_ERROR");
        assert_eq!(details.unwrap()["issues"][0]["input"], json!("days"));
    }

    #[test]
    fn test_persistence_details_carry_execution() {
        let execution = execution();
        let id = execution.id;
        let err = AppError::from(EngineError::Persistence {
            execution: Box::new(execution),
            source: RepositoryError::Connection,
        });
        let (_, code, _, details) = err.parts();
        assert_eq!(code, "PERSISTENCE_ERROR");
        assert_eq!(details.unwrap()["execution"]["id"], json!(id.to_string()));
    }
}
