//! Tool invocation envelopes.
//!
//! The engine never performs actions itself; it hands interpolated parameters
//! to a Tool Invoker together with a `ToolContext`, and receives a
//! `ToolOutcome` back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Result reported by a tool.
///
/// `success = false` is a step failure eligible for retry, exactly like an
/// invoker error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Context passed with every tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContext {
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub execution_id: Uuid,
    pub step_id: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Stable across retries of the same step: `{execution_id}:{step_id}`.
    pub idempotency_key: String,
}

impl ToolContext {
    pub fn idempotency_key_for(execution_id: Uuid, step_id: &str) -> String {
        format!("{execution_id}:{step_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_outcome_wire_shape() {
        let parsed: ToolOutcome =
            serde_json::from_value(json!({"success": true, "data": {"email": "a@b.com"}})).unwrap();
        assert_eq!(parsed, ToolOutcome::ok(json!({"email": "a@b.com"})));

        let failed = serde_json::to_value(ToolOutcome::failure("mailbox full")).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "mailbox full"}));
    }

    #[test]
    fn test_idempotency_key_is_stable_per_step() {
        let execution_id = Uuid::now_v7();
        let first = ToolContext::idempotency_key_for(execution_id, "notify");
        let again = ToolContext::idempotency_key_for(execution_id, "notify");
        assert_eq!(first, again);
        assert!(first.ends_with(":notify"));
        assert_ne!(first, ToolContext::idempotency_key_for(execution_id, "lookup"));
    }
}
