//! Tool invoker trait definition.
//!
//! A tool is a named external action (send an email, look up a customer,
//! create a document). The engine only knows tools by name and hands them
//! interpolated parameters; the invoker performs the action.

use serde_json::{Map, Value};
use skillflow_types::tool::{ToolContext, ToolOutcome};
use thiserror::Error;

/// Errors raised by a tool invoker.
///
/// The engine treats every variant exactly like a `ToolOutcome` with
/// `success = false`: the attempt failed and may be retried.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No handler is registered for the tool name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The invocation could not be completed (transport, bad response, ...).
    #[error("tool invocation failed: {0}")]
    Invocation(String),

    /// The attempt exceeded the per-step timeout.
    #[error("tool '{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },
}

/// Dispatches tool calls by name.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ToolInvoker: Send + Sync {
    fn invoke(
        &self,
        tool: &str,
        params: &Map<String, Value>,
        context: &ToolContext,
    ) -> impl std::future::Future<Output = Result<ToolOutcome, ToolError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::UnknownTool("send_fax".to_string());
        assert_eq!(err.to_string(), "unknown tool: send_fax");

        let err = ToolError::Timeout {
            tool: "create_document".to_string(),
            secs: 30,
        };
        assert!(err.to_string().contains("create_document"));
        assert!(err.to_string().contains("30s"));
    }
}
