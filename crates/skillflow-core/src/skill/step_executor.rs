//! Single-step execution with retries.
//!
//! The step executor is the error boundary for tool failures: whatever the
//! invoker does (reports `success = false`, returns an error, hangs past the
//! timeout) ends up as a `StepResult`, never as an `Err`.

use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use skillflow_types::execution::{Execution, StepResult, StepStatus};
use skillflow_types::skill::SkillStep;
use skillflow_types::tool::ToolContext;
use tokio::time::Instant;

use crate::tool::{ToolError, ToolInvoker};

use super::condition::should_run;
use super::interpolate::{find_placeholders, interpolate, resolve_path};
use super::retry::RetryHandler;

/// Default per-attempt timeout (5 minutes).
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 300;

/// Runs one step: condition, interpolation, invocation with retry.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    step_timeout: Duration,
}

impl Default for StepExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STEP_TIMEOUT_SECS))
    }
}

impl StepExecutor {
    pub fn new(step_timeout: Duration) -> Self {
        Self { step_timeout }
    }

    /// Run `step` in the context of `execution`.
    ///
    /// A false condition yields a `skipped` result without touching the
    /// invoker. Otherwise the tool is invoked up to `retry.max_attempts`
    /// times, sleeping the policy's delay between failed attempts.
    pub async fn run<T: ToolInvoker>(
        &self,
        invoker: &T,
        step: &SkillStep,
        execution: &Execution,
    ) -> StepResult {
        if !should_run(step.condition.as_ref(), execution) {
            tracing::debug!(
                execution_id = %execution.id,
                step_id = step.id.as_str(),
                "condition false, skipping step"
            );
            return StepResult::skipped(step);
        }

        let unresolved: Vec<String> = find_placeholders(&Value::Object(step.params.clone()))
            .into_iter()
            .filter(|name| resolve_path(&execution.variables, name).is_none())
            .collect();
        if !unresolved.is_empty() {
            tracing::debug!(
                execution_id = %execution.id,
                step_id = step.id.as_str(),
                ?unresolved,
                "unresolved placeholders interpolate as empty strings"
            );
        }
        let params = interpolate(&step.params, &execution.variables);

        let started_at = Utc::now();
        let start = Instant::now();
        let retry = step.retry.as_ref();
        let mut context = ToolContext {
            actor_id: execution.user_id.clone(),
            customer_id: execution.customer_id.clone(),
            execution_id: execution.id,
            step_id: step.id.clone(),
            attempt: 0,
            idempotency_key: ToolContext::idempotency_key_for(execution.id, &step.id),
        };

        let outcome = loop {
            context.attempt += 1;
            match self.attempt(invoker, step, &params, &context).await {
                Ok(data) => break Ok(data),
                Err(error) if RetryHandler::should_retry(retry, context.attempt) => {
                    let delay = RetryHandler::delay_for_attempt(retry, context.attempt);
                    tracing::warn!(
                        execution_id = %execution.id,
                        step_id = step.id.as_str(),
                        attempt = context.attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = error.as_str(),
                        "step attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => break Err(error),
            }
        };

        let (status, result, error) = match outcome {
            Ok(data) => (StepStatus::Success, data, None),
            Err(error) => (StepStatus::Failed, None, Some(error)),
        };

        StepResult {
            step_id: step.id.clone(),
            step_name: step.label().to_string(),
            tool: step.tool.clone(),
            status,
            params: Some(params),
            result,
            error,
            attempts: context.attempt,
            started_at,
            completed_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// One bounded invocation. Every kind of failure collapses to a message.
    async fn attempt<T: ToolInvoker>(
        &self,
        invoker: &T,
        step: &SkillStep,
        params: &Map<String, Value>,
        context: &ToolContext,
    ) -> Result<Option<Value>, String> {
        let invocation = invoker.invoke(&step.tool, params, context);
        match tokio::time::timeout(self.step_timeout, invocation).await {
            Ok(Ok(outcome)) if outcome.success => Ok(outcome.data),
            Ok(Ok(outcome)) => Err(outcome
                .error
                .unwrap_or_else(|| format!("tool '{}' reported failure", step.tool))),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_elapsed) => Err(ToolError::Timeout {
                tool: step.tool.clone(),
                secs: self.step_timeout.as_secs(),
            }
            .to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
