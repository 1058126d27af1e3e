//! Skill definition parsing, validation, and filesystem operations.
//!
//! Converts YAML/JSON files into `Skill` values, validates structural
//! constraints (unique step IDs, non-empty tools, sane retry policies), and
//! provides discovery for skill files on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use skillflow_types::skill::{ConditionOperator, ResultTransform, Skill, StepCondition};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or checking a skill definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// YAML/JSON parse failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Structural validation failure.
    #[error("invalid skill definition: {0}")]
    Invalid(String),

    /// A construct this engine does not recognise (strict mode only).
    #[error("unsupported in strict mode: {0}")]
    Unsupported(String),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a YAML string into a validated `Skill`.
pub fn parse_skill_yaml(yaml: &str) -> Result<Skill, DefinitionError> {
    let skill: Skill =
        serde_yaml_ng::from_str(yaml).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    validate_definition(&skill)?;
    Ok(skill)
}

/// Parse a JSON string into a validated `Skill`.
pub fn parse_skill_json(json: &str) -> Result<Skill, DefinitionError> {
    let skill: Skill =
        serde_json::from_str(json).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    validate_definition(&skill)?;
    Ok(skill)
}

/// Serialize a `Skill` to a YAML string.
pub fn serialize_skill_yaml(skill: &Skill) -> Result<String, DefinitionError> {
    serde_yaml_ng::to_string(skill).map_err(|e| DefinitionError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a `Skill`.
///
/// Checks:
/// - Name is non-empty
/// - At least one step exists
/// - Step IDs are non-empty and unique
/// - Every step names a tool
/// - Input names are unique
/// - `save_as` is non-empty when given
/// - Retry `max_attempts` is at least 1
pub fn validate_definition(skill: &Skill) -> Result<(), DefinitionError> {
    if skill.name.trim().is_empty() {
        return Err(DefinitionError::Invalid(
            "skill name must not be empty".to_string(),
        ));
    }

    if skill.steps.is_empty() {
        return Err(DefinitionError::Invalid(format!(
            "skill '{}' must have at least one step",
            skill.name
        )));
    }

    let mut seen_steps = HashSet::new();
    for step in &skill.steps {
        if step.id.trim().is_empty() {
            return Err(DefinitionError::Invalid(
                "step ID must not be empty".to_string(),
            ));
        }
        if !seen_steps.insert(step.id.as_str()) {
            return Err(DefinitionError::Invalid(format!(
                "duplicate step ID: '{}'",
                step.id
            )));
        }
        if step.tool.trim().is_empty() {
            return Err(DefinitionError::Invalid(format!(
                "step '{}' has no tool",
                step.id
            )));
        }
        if let Some(save_as) = step.result_handling.as_ref().and_then(|h| h.save_as.as_ref()) {
            if save_as.trim().is_empty() {
                return Err(DefinitionError::Invalid(format!(
                    "step '{}' has an empty save_as",
                    step.id
                )));
            }
        }
        if let Some(retry) = &step.retry {
            if retry.max_attempts < 1 {
                return Err(DefinitionError::Invalid(format!(
                    "step '{}' retry max_attempts must be >= 1",
                    step.id
                )));
            }
        }
    }

    let mut seen_inputs = HashSet::new();
    for input in &skill.inputs {
        if !seen_inputs.insert(input.name.as_str()) {
            return Err(DefinitionError::Invalid(format!(
                "duplicate input name: '{}'",
                input.name
            )));
        }
    }

    Ok(())
}

/// Reject constructs the engine would otherwise treat permissively:
/// unknown condition types, unknown operators and unknown transforms.
pub fn validate_strict(skill: &Skill) -> Result<(), DefinitionError> {
    for step in &skill.steps {
        match &step.condition {
            Some(StepCondition::Unknown) => {
                return Err(DefinitionError::Unsupported(format!(
                    "step '{}' uses an unknown condition type",
                    step.id
                )));
            }
            Some(StepCondition::IfVariable {
                operator: ConditionOperator::Unknown,
                ..
            }) => {
                return Err(DefinitionError::Unsupported(format!(
                    "step '{}' uses an unknown condition operator",
                    step.id
                )));
            }
            _ => {}
        }

        let transform = step.result_handling.as_ref().and_then(|h| h.transform);
        if transform == Some(ResultTransform::Unknown) {
            return Err(DefinitionError::Unsupported(format!(
                "step '{}' uses an unknown result transform",
                step.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

/// Load a skill definition from a file. `.json` files are parsed as JSON,
/// everything else as YAML.
pub fn load_skill_file(path: &Path) -> Result<Skill, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    if is_json(path) {
        parse_skill_json(&content)
    } else {
        parse_skill_yaml(&content)
    }
}

/// List skill definition files (`.yaml`, `.yml`, `.json`) directly inside
/// `dir`, sorted by path. A missing directory yields an empty list.
pub fn discover_skill_files(dir: &Path) -> Result<Vec<PathBuf>, DefinitionError> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_skill_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn is_skill_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "json")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ONBOARDING_YAML: &str = r#"
name: onboarding-kickoff
description: Create the kickoff doc and invite the customer
category: onboarding
inputs:
  - name: customer_id
    type: customer
    required: true
steps:
  - id: create_doc
    tool: create_document
    params:
      template: kickoff
      customer: "{{customer_id}}"
    result_handling:
      save_as: doc
      extract: url
  - id: invite
    tool: send_email
    params:
      body: "Your kickoff doc: {{doc}}"
    condition:
      type: if_previous_success
"#;

    #[test]
    fn test_parse_valid_yaml() {
        let skill = parse_skill_yaml(ONBOARDING_YAML).unwrap();
        assert_eq!(skill.name, "onboarding-kickoff");
        assert_eq!(skill.steps.len(), 2);
        assert_eq!(skill.steps[0].tool, "create_document");
    }

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"name": "ping", "steps": [{"id": "p", "tool": "ping"}]}"#;
        let skill = parse_skill_json(json).unwrap();
        assert_eq!(skill.category, "general");
    }

    #[test]
    fn test_parse_malformed_yaml() {
        let err = parse_skill_yaml("name: [unclosed").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let skill = parse_skill_yaml(ONBOARDING_YAML).unwrap();
        let yaml = serialize_skill_yaml(&skill).unwrap();
        let reparsed = parse_skill_yaml(&yaml).unwrap();
        assert_eq!(reparsed.id, skill.id);
        assert_eq!(reparsed.steps[1].condition, skill.steps[1].condition);
    }

    #[test]
    fn test_rejects_empty_steps() {
        let err = parse_skill_yaml("name: empty\nsteps: []").unwrap_err();
        assert!(err.to_string().contains("at least one step"));
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = parse_skill_yaml("name: ''\nsteps:\n  - id: a\n    tool: t").unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_rejects_duplicate_step_ids() {
        let yaml = "name: dup\nsteps:\n  - id: a\n    tool: t\n  - id: a\n    tool: u";
        let err = parse_skill_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate step ID"));
    }

    #[test]
    fn test_rejects_blank_tool() {
        let yaml = "name: blank\nsteps:\n  - id: a\n    tool: ' '";
        let err = parse_skill_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("no tool"));
    }

    #[test]
    fn test_rejects_duplicate_inputs() {
        let yaml = r#"
name: dup-inputs
inputs:
  - {name: x, type: string}
  - {name: x, type: number}
steps:
  - {id: a, tool: t}
"#;
        let err = parse_skill_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate input"));
    }

    #[test]
    fn test_rejects_zero_retry_attempts_and_empty_save_as() {
        let yaml = "name: r\nsteps:\n  - id: a\n    tool: t\n    retry:\n      max_attempts: 0";
        assert!(parse_skill_yaml(yaml).is_err());

        let yaml = "name: s\nsteps:\n  - id: a\n    tool: t\n    result_handling:\n      save_as: ''";
        let err = parse_skill_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("save_as"));
    }

    #[test]
    fn test_strict_validation() {
        let lenient = parse_skill_yaml(ONBOARDING_YAML).unwrap();
        assert!(validate_strict(&lenient).is_ok());

        let unknown_kind = parse_skill_yaml(
            "name: u\nsteps:\n  - id: a\n    tool: t\n    condition:\n      type: if_weekday",
        )
        .unwrap();
        assert!(matches!(
            validate_strict(&unknown_kind),
            Err(DefinitionError::Unsupported(_))
        ));

        let unknown_op = parse_skill_yaml(
            "name: u\nsteps:\n  - id: a\n    tool: t\n    condition:\n      type: if_variable\n      variable: x\n      operator: gt\n      value: 1",
        )
        .unwrap();
        assert!(validate_strict(&unknown_op).is_err());

        let unknown_transform = parse_skill_yaml(
            "name: u\nsteps:\n  - id: a\n    tool: t\n    result_handling:\n      save_as: x\n      transform: uppercase",
        )
        .unwrap();
        assert!(validate_strict(&unknown_transform).is_err());
    }

    #[test]
    fn test_load_and_discover_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("onboarding.yaml"), ONBOARDING_YAML).unwrap();
        std::fs::write(
            dir.path().join("ping.json"),
            r#"{"name": "ping", "steps": [{"id": "p", "tool": "ping"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not a skill").unwrap();

        let files = discover_skill_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let names: Vec<String> = files
            .iter()
            .map(|p| load_skill_file(p).unwrap().name)
            .collect();
        assert_eq!(names, vec!["onboarding-kickoff", "ping"]);
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let files = discover_skill_files(Path::new("/nonexistent/skills")).unwrap();
        assert!(files.is_empty());
    }
}
