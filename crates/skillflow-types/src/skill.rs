//! Skill domain types for skillflow.
//!
//! A `Skill` is a reusable, parameterized sequence of tool invocations. The
//! engine treats skills as read-only: they are authored as YAML/JSON files or
//! through the catalog, and every execution walks `steps` front-to-back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A reusable skill definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// UUIDv7 assigned on creation (generated when omitted from a file).
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,
    /// Human-readable skill name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form grouping used for catalog filtering (e.g. "onboarding").
    #[serde(default = "default_category")]
    pub category: String,
    /// Ordered steps. Order is significant and fixed at definition time.
    pub steps: Vec<SkillStep>,
    /// Declared inputs, checked before an execution is created.
    #[serde(default)]
    pub inputs: Vec<SkillInput>,
    /// Declared outputs (informational).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<SkillOutput>,
    /// Permission tags a caller needs to run this skill.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    /// Whether a run must be explicitly approved by the caller.
    #[serde(default)]
    pub requires_approval: bool,
    /// Rough duration estimate shown to operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Provenance: shipped with the platform or authored by a user.
    #[serde(default)]
    pub source: SkillSource,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_enabled() -> bool {
    true
}

impl Skill {
    /// Look up a step by its ID.
    pub fn step(&self, id: &str) -> Option<&SkillStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Look up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&SkillInput> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

/// Where a skill definition came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    System,
    #[default]
    User,
}

impl std::fmt::Display for SkillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillSource::System => write!(f, "system"),
            SkillSource::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for SkillSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(SkillSource::System),
            "user" => Ok(SkillSource::User),
            other => Err(format!("invalid skill source: '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One atomic tool invocation within a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillStep {
    /// Author-chosen step ID, unique within the skill.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Name of the tool the Tool Invoker dispatches to.
    pub tool: String,
    /// Tool parameters. String leaves may contain `{{name}}` placeholders.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// When absent the step always runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_handling: Option<ResultHandling>,
    /// A failure of this step does not fail the execution.
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl SkillStep {
    /// Display label: the name when set, otherwise the ID.
    pub fn label(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Predicate deciding whether a step runs.
///
/// Internally tagged by `type`:
/// ```yaml
/// condition:
///   type: if_variable
///   variable: customer.tier
///   operator: eq
///   value: enterprise
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepCondition {
    Always,
    /// Runs only if the most recently evaluated step succeeded.
    IfPreviousSuccess,
    IfVariable {
        variable: String,
        operator: ConditionOperator,
        #[serde(default)]
        value: Value,
    },
    /// Any `type` this engine does not recognise.
    #[serde(other)]
    Unknown,
}

/// Comparison used by `StepCondition::IfVariable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Contains,
    Exists,
    #[serde(other)]
    Unknown,
}

/// Where and how a step's result is stored as a variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultHandling {
    /// Variable name the (extracted, transformed) result is saved under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_as: Option<String>,
    /// Dotted path of the field to pull out of the raw result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<ResultTransform>,
}

/// Reshaping applied to a result before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTransform {
    Stringify,
    Parse,
    First,
    Count,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Per-step retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one (default 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub backoff: RetryBackoff,
    /// Upper bound for exponential delays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    1
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: 0,
            backoff: RetryBackoff::Fixed,
            max_delay_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Fixed-delay policy.
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
            ..Self::default()
        }
    }
}

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryBackoff {
    #[default]
    Fixed,
    /// Delay doubles after every failed attempt.
    Exponential,
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A declared skill input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInput {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default)]
    pub required: bool,
    /// Used when the caller omits the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<InputValidation>,
}

/// Declared type of a skill input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    String,
    Number,
    Boolean,
    Date,
    /// A customer identifier; any non-empty id is accepted.
    Customer,
    Array,
    Object,
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InputType::String => "string",
            InputType::Number => "number",
            InputType::Boolean => "boolean",
            InputType::Date => "date",
            InputType::Customer => "customer",
            InputType::Array => "array",
            InputType::Object => "object",
        };
        f.write_str(s)
    }
}

/// Optional validation rule attached to an input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputValidation {
    /// Regex the value must match (string values only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Lower bound: numeric value, or length for strings and arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound: numeric value, or length for strings and arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Enumerated allowed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

/// A declared skill output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillOutput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<InputType>,
}

// ---------------------------------------------------------------------------
// Catalog filter
// ---------------------------------------------------------------------------

/// Filter for catalog list queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    pub category: Option<String>,
    pub source: Option<SkillSource>,
    pub enabled: Option<bool>,
    pub tag: Option<String>,
}

impl SkillFilter {
    pub fn matches(&self, skill: &Skill) -> bool {
        self.category.as_ref().is_none_or(|c| &skill.category == c)
            && self.source.is_none_or(|s| skill.source == s)
            && self.enabled.is_none_or(|e| skill.enabled == e)
            && self.tag.as_ref().is_none_or(|t| skill.tags.contains(t))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HEALTH_CHECK_YAML: &str = r#"
name: quarterly-health-check
description: Look up a customer and email their CSM a health summary
category: health
inputs:
  - name: customer_id
    type: customer
    required: true
  - name: tone
    type: string
    default: friendly
    validation:
      options: [friendly, formal]
steps:
  - id: lookup
    name: Look up customer
    tool: lookup_customer
    params:
      id: "{{customer_id}}"
    result_handling:
      save_as: customer
  - id: notify
    tool: send_email
    params:
      to: "{{customer.email}}"
      subject: "Health check ({{tone}})"
    condition:
      type: if_previous_success
    retry:
      max_attempts: 3
      delay_ms: 500
    continue_on_error: true
"#;

    #[test]
    fn test_parse_realistic_yaml_skill() {
        let skill: Skill = serde_yaml_ng::from_str(HEALTH_CHECK_YAML).unwrap();

        assert_eq!(skill.name, "quarterly-health-check");
        assert_eq!(skill.category, "health");
        assert!(skill.enabled, "enabled defaults to true");
        assert_eq!(skill.source, SkillSource::User);
        assert_eq!(skill.steps.len(), 2);
        assert_eq!(skill.inputs[0].input_type, InputType::Customer);
        assert_eq!(skill.inputs[1].default, Some(json!("friendly")));

        let lookup = skill.step("lookup").unwrap();
        assert_eq!(lookup.params["id"], json!("{{customer_id}}"));
        assert_eq!(
            lookup.result_handling.as_ref().unwrap().save_as.as_deref(),
            Some("customer")
        );
        assert!(lookup.retry.is_none());

        let notify = skill.step("notify").unwrap();
        assert_eq!(notify.label(), "notify");
        assert_eq!(notify.condition, Some(StepCondition::IfPreviousSuccess));
        assert_eq!(notify.retry, Some(RetryPolicy::fixed(3, 500)));
        assert!(notify.continue_on_error);
    }

    #[test]
    fn test_if_variable_condition_serde() {
        let condition: StepCondition = serde_json::from_value(json!({
            "type": "if_variable",
            "variable": "plan",
            "operator": "contains",
            "value": "enterprise"
        }))
        .unwrap();

        assert_eq!(
            condition,
            StepCondition::IfVariable {
                variable: "plan".to_string(),
                operator: ConditionOperator::Contains,
                value: json!("enterprise"),
            }
        );

        // `exists` needs no value
        let exists: StepCondition = serde_json::from_value(json!({
            "type": "if_variable",
            "variable": "x",
            "operator": "exists"
        }))
        .unwrap();
        assert!(matches!(
            exists,
            StepCondition::IfVariable {
                operator: ConditionOperator::Exists,
                value: Value::Null,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_kinds_deserialize_to_unknown() {
        let condition: StepCondition =
            serde_json::from_value(json!({"type": "if_moon_phase", "phase": "full"})).unwrap();
        assert_eq!(condition, StepCondition::Unknown);

        let operator: ConditionOperator = serde_json::from_value(json!("gte")).unwrap();
        assert_eq!(operator, ConditionOperator::Unknown);

        let transform: ResultTransform = serde_json::from_value(json!("uppercase")).unwrap();
        assert_eq!(transform, ResultTransform::Unknown);
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy: RetryPolicy = serde_json::from_value(json!({})).unwrap();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_ms, 0);
        assert_eq!(policy.backoff, RetryBackoff::Fixed);

        let yaml = "max_attempts: 4\ndelay_ms: 100\nbackoff: exponential\nmax_delay_ms: 1000";
        let policy: RetryPolicy = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(policy.backoff, RetryBackoff::Exponential);
        assert_eq!(policy.max_delay_ms, Some(1000));
    }

    #[test]
    fn test_skill_json_roundtrip_preserves_step_order() {
        let skill: Skill = serde_yaml_ng::from_str(HEALTH_CHECK_YAML).unwrap();
        let json = serde_json::to_string(&skill).unwrap();
        let parsed: Skill = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, skill.id);
        let ids: Vec<&str> = parsed.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lookup", "notify"]);
    }

    #[test]
    fn test_skill_filter_matches() {
        let mut skill: Skill = serde_yaml_ng::from_str(HEALTH_CHECK_YAML).unwrap();
        skill.tags = vec!["renewal".to_string()];

        assert!(SkillFilter::default().matches(&skill));
        assert!(SkillFilter {
            category: Some("health".to_string()),
            tag: Some("renewal".to_string()),
            ..Default::default()
        }
        .matches(&skill));
        assert!(!SkillFilter {
            source: Some(SkillSource::System),
            ..Default::default()
        }
        .matches(&skill));
        assert!(!SkillFilter {
            enabled: Some(false),
            ..Default::default()
        }
        .matches(&skill));
    }

    #[test]
    fn test_skill_source_from_str() {
        assert_eq!("system".parse::<SkillSource>().unwrap(), SkillSource::System);
        assert!("vendor".parse::<SkillSource>().is_err());
        assert_eq!(SkillSource::User.to_string(), "user");
    }
}
