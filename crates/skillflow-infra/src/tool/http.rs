//! HTTP tool invoker.
//!
//! Each tool name maps to an endpoint URL from `[tools.endpoints]` in
//! `config.toml`. An invocation POSTs `{tool, params, context}` as JSON and
//! expects a `ToolOutcome` (`{success, data?, error?}`) back. The idempotency
//! key is repeated in the `Idempotency-Key` header so endpoints can
//! deduplicate retried calls without parsing the body.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use skillflow_core::tool::{ToolError, ToolInvoker};
use skillflow_types::config::ToolsConfig;
use skillflow_types::tool::{ToolContext, ToolOutcome};
use tracing::debug;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Serialize)]
struct InvokeRequest<'a> {
    tool: &'a str,
    params: &'a Map<String, Value>,
    context: &'a ToolContext,
}

/// `ToolInvoker` that dispatches to configured HTTP endpoints.
pub struct HttpToolInvoker {
    endpoints: BTreeMap<String, String>,
    client: reqwest::Client,
}

impl HttpToolInvoker {
    /// Build an invoker from the `[tools]` configuration section.
    pub fn new(config: &ToolsConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs.max(1)))
            .user_agent(concat!("skillflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Invocation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoints: config.endpoints.clone(),
            client,
        })
    }

    /// Names of the tools this invoker can reach.
    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }
}

impl ToolInvoker for HttpToolInvoker {
    async fn invoke(
        &self,
        tool: &str,
        params: &Map<String, Value>,
        context: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let url = self
            .endpoints
            .get(tool)
            .ok_or_else(|| ToolError::UnknownTool(tool.to_string()))?;

        debug!(
            tool,
            url = url.as_str(),
            step_id = context.step_id.as_str(),
            attempt = context.attempt,
            "invoking tool endpoint"
        );

        let response = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, context.idempotency_key.as_str())
            .json(&InvokeRequest {
                tool,
                params,
                context,
            })
            .send()
            .await
            .map_err(|e| ToolError::Invocation(format!("request to '{url}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Invocation(format!(
                "'{url}' returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        response
            .json::<ToolOutcome>()
            .await
            .map_err(|e| ToolError::Invocation(format!("invalid tool response from '{url}': {e}")))
    }
}
