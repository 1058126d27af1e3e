//! Input validation.
//!
//! Runs before an execution record exists: defaults are filled in first,
//! then every declared input is checked for presence, type, and its optional
//! validation rule. All problems are collected so the caller sees them at
//! once.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use skillflow_types::skill::{InputType, InputValidation, Skill, SkillInput};
use thiserror::Error;

use super::condition::values_equal;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// One problem with one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputIssue {
    pub input: String,
    pub message: String,
}

impl std::fmt::Display for InputIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.input, self.message)
    }
}

/// Inputs did not satisfy the skill's declared schema.
#[derive(Debug, Clone, Error)]
#[error("invalid inputs: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<InputIssue>,
}

fn join_issues(issues: &[InputIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Whether any issue concerns the input `name`.
    pub fn mentions(&self, name: &str) -> bool {
        self.issues.iter().any(|i| i.input == name)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Fill absent (or null) declared inputs that carry a default.
///
/// Undeclared inputs are passed through untouched.
pub fn resolve_inputs(skill: &Skill, inputs: &Map<String, Value>) -> Map<String, Value> {
    let mut resolved = inputs.clone();
    for input in &skill.inputs {
        let absent = resolved.get(&input.name).is_none_or(Value::is_null);
        if absent {
            if let Some(default) = &input.default {
                resolved.insert(input.name.clone(), default.clone());
            }
        }
    }
    resolved
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check `inputs` against every declared input of `skill`.
pub fn validate(skill: &Skill, inputs: &Map<String, Value>) -> Result<(), ValidationError> {
    let issues: Vec<InputIssue> = skill
        .inputs
        .iter()
        .flat_map(|input| check_input(input, inputs.get(&input.name)))
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn check_input(input: &SkillInput, value: Option<&Value>) -> Vec<InputIssue> {
    let issue = |message: String| InputIssue {
        input: input.name.clone(),
        message,
    };

    let value = match value {
        Some(v) if !v.is_null() => v,
        _ if input.required => return vec![issue("required input is missing".to_string())],
        _ => return Vec::new(),
    };

    if !matches_type(input.input_type, value) {
        return vec![issue(format!(
            "expected {}, got {}",
            input.input_type,
            describe(value)
        ))];
    }

    input
        .validation
        .as_ref()
        .map(|rule| check_rule(rule, value).into_iter().map(issue).collect())
        .unwrap_or_default()
}

/// Whether `value` has the shape `input_type` declares.
pub fn matches_type(input_type: InputType, value: &Value) -> bool {
    match input_type {
        InputType::String => value.is_string(),
        InputType::Number => value.is_number(),
        InputType::Boolean => value.is_boolean(),
        InputType::Date => value.as_str().is_some_and(is_date),
        InputType::Customer => match value {
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(_) => true,
            _ => false,
        },
        InputType::Array => value.is_array(),
        InputType::Object => value.is_object(),
    }
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn check_rule(rule: &InputValidation, value: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    if let (Some(pattern), Some(text)) = (&rule.pattern, value.as_str()) {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(text) => {
                problems.push(format!("value does not match pattern '{pattern}'"));
            }
            Ok(_) => {}
            Err(e) => problems.push(format!("invalid pattern '{pattern}': {e}")),
        }
    }

    if let Some(measure) = measure(value) {
        let unit = if value.is_number() { "value" } else { "length" };
        if let Some(min) = rule.min {
            if measure < min {
                problems.push(format!("{unit} {measure} is below minimum {min}"));
            }
        }
        if let Some(max) = rule.max {
            if measure > max {
                problems.push(format!("{unit} {measure} is above maximum {max}"));
            }
        }
    }

    if let Some(options) = &rule.options {
        if !options.iter().any(|option| values_equal(option, value)) {
            let allowed: Vec<String> = options.iter().map(Value::to_string).collect();
            problems.push(format!("value must be one of [{}]", allowed.join(", ")));
        }
    }

    problems
}

/// Quantity bounded by min/max: the number itself, or a string/array length.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
