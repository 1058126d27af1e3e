//! Execution tracking types for skillflow.
//!
//! An `Execution` is one concrete run of a skill. It is created with status
//! `running`, mutated in place as steps complete, and finalized as
//! `completed` or `failed`. `step_results` is append-only: one entry per
//! evaluated step, skipped steps included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::skill::{Skill, SkillStep};

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    /// Completed, failed and cancelled executions never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            "cancelled" => Ok(ExecutionStatus::Cancelled),
            other => Err(format!("invalid execution status: '{other}'")),
        }
    }
}

/// Outcome of one evaluated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    /// The step's condition evaluated false; no tool call was made.
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Success => write!(f, "success"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

// ---------------------------------------------------------------------------
// StepResult
// ---------------------------------------------------------------------------

/// Record of one evaluated step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub step_name: String,
    pub tool: String,
    pub status: StepStatus,
    /// Interpolated parameters sent to the tool (absent for skipped steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of invocation attempts made (0 for skipped steps).
    #[serde(default)]
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl StepResult {
    /// A result for a step whose condition evaluated false.
    pub fn skipped(step: &SkillStep) -> Self {
        let now = Utc::now();
        Self {
            step_id: step.id.clone(),
            step_name: step.label().to_string(),
            tool: step.tool.clone(),
            status: StepStatus::Skipped,
            params: None,
            result: None,
            error: None,
            attempts: 0,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Who is running a skill and on whose behalf.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Initiating user (actor) id.
    pub actor_id: String,
    /// Optional customer scope for the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Explicit approval for skills with `requires_approval`.
    #[serde(default)]
    pub approved: bool,
}

impl ExecutionContext {
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            ..Default::default()
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn approved(mut self) -> Self {
        self.approved = true;
        self
    }
}

/// One run of a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub skill_name: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Input values as supplied (after defaults were applied).
    pub inputs: Map<String, Value>,
    /// Variable environment: a copy of the inputs plus every saved step result.
    pub variables: Map<String, Value>,
    pub step_results: Vec<StepResult>,
    /// Snapshot of `variables` taken when the run completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// Start a new running execution for `skill`.
    pub fn start(skill: &Skill, inputs: Map<String, Value>, ctx: &ExecutionContext) -> Self {
        Self {
            id: Uuid::now_v7(),
            skill_id: skill.id,
            skill_name: skill.name.clone(),
            user_id: ctx.actor_id.clone(),
            customer_id: ctx.customer_id.clone(),
            variables: inputs.clone(),
            inputs,
            step_results: Vec::new(),
            output: None,
            status: ExecutionStatus::Running,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The most recently appended step result.
    pub fn last_step_result(&self) -> Option<&StepResult> {
        self.step_results.last()
    }

    /// Step results with status `failed`, fatal or not.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.step_results
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
    }

    /// Wall-clock duration, if the execution has finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

// ---------------------------------------------------------------------------
// Store filter
// ---------------------------------------------------------------------------

/// Filter for execution list queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ExecutionFilter {
    pub skill_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<ExecutionStatus>,
    /// Maximum number of records (newest first).
    pub limit: Option<u32>,
}

impl ExecutionFilter {
    pub fn matches(&self, execution: &Execution) -> bool {
        self.skill_id.is_none_or(|id| execution.skill_id == id)
            && self.user_id.as_ref().is_none_or(|u| &execution.user_id == u)
            && self
                .customer_id
                .as_ref()
                .is_none_or(|c| execution.customer_id.as_ref() == Some(c))
            && self.status.is_none_or(|s| execution.status == s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_skill() -> Skill {
        serde_json::from_value(json!({
            "name": "renewal-reminder",
            "steps": [
                {"id": "lookup", "tool": "lookup_customer"},
                {"id": "notify", "name": "Notify CSM", "tool": "send_email"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_start_copies_inputs_into_variables() {
        let skill = sample_skill();
        let mut inputs = Map::new();
        inputs.insert("customer_id".to_string(), json!("cus_42"));

        let ctx = ExecutionContext::new("user-1").with_customer("cus_42");
        let execution = Execution::start(&skill, inputs.clone(), &ctx);

        assert_eq!(execution.status, ExecutionStatus::Running);
        assert_eq!(execution.skill_id, skill.id);
        assert_eq!(execution.user_id, "user-1");
        assert_eq!(execution.customer_id.as_deref(), Some("cus_42"));
        assert_eq!(execution.variables, inputs);
        assert!(execution.step_results.is_empty());
        assert!(execution.completed_at.is_none());
        assert!(execution.duration_ms().is_none());
    }

    #[test]
    fn test_skipped_step_result_uses_label() {
        let skill = sample_skill();
        let lookup = StepResult::skipped(&skill.steps[0]);
        assert_eq!(lookup.step_name, "lookup");
        assert_eq!(lookup.status, StepStatus::Skipped);
        assert_eq!(lookup.attempts, 0);

        let notify = StepResult::skipped(&skill.steps[1]);
        assert_eq!(notify.step_name, "Notify CSM");
        assert_eq!(notify.tool, "send_email");
    }

    #[test]
    fn test_execution_status_terminal_and_parse() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert_eq!("cancelled".parse::<ExecutionStatus>().unwrap(), ExecutionStatus::Cancelled);
        assert!("paused".parse::<ExecutionStatus>().is_err());

        let json = serde_json::to_string(&ExecutionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_execution_filter_matches() {
        let skill = sample_skill();
        let ctx = ExecutionContext::new("user-1").with_customer("cus_1");
        let execution = Execution::start(&skill, Map::new(), &ctx);

        assert!(ExecutionFilter::default().matches(&execution));
        assert!(ExecutionFilter {
            skill_id: Some(skill.id),
            status: Some(ExecutionStatus::Running),
            ..Default::default()
        }
        .matches(&execution));
        assert!(!ExecutionFilter {
            customer_id: Some("cus_2".to_string()),
            ..Default::default()
        }
        .matches(&execution));
        assert!(!ExecutionFilter {
            user_id: Some("user-2".to_string()),
            ..Default::default()
        }
        .matches(&execution));
    }
}
