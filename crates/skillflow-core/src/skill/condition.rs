//! Step condition evaluation.
//!
//! Conditions are fail-open: an unrecognised condition kind or operator lets
//! the step run (with a warning) unless strict definitions rejected the
//! skill up front.

use serde_json::Value;
use skillflow_types::execution::{Execution, StepResult};
use skillflow_types::skill::{ConditionOperator, StepCondition};

use super::interpolate::{resolve_path, value_to_string};

/// Decide whether a step with `condition` should run at this point of
/// `execution`. No condition behaves like `always`.
pub fn should_run(condition: Option<&StepCondition>, execution: &Execution) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    match condition {
        StepCondition::Always => true,
        StepCondition::IfPreviousSuccess => execution
            .last_step_result()
            .is_none_or(StepResult::is_success),
        StepCondition::IfVariable {
            variable,
            operator,
            value,
        } => evaluate_operator(
            *operator,
            resolve_path(&execution.variables, variable),
            value,
        ),
        StepCondition::Unknown => {
            tracing::warn!(
                execution_id = %execution.id,
                "unknown condition type, running step"
            );
            true
        }
    }
}

/// Apply `operator` to an (optionally absent) variable value.
///
/// An absent variable never equals anything, including `null`.
pub fn evaluate_operator(
    operator: ConditionOperator,
    actual: Option<&Value>,
    expected: &Value,
) -> bool {
    match operator {
        ConditionOperator::Eq => actual.is_some_and(|a| values_equal(a, expected)),
        ConditionOperator::Ne => !actual.is_some_and(|a| values_equal(a, expected)),
        ConditionOperator::Contains => {
            actual.is_some_and(|a| value_to_string(a).contains(&value_to_string(expected)))
        }
        ConditionOperator::Exists => actual.is_some_and(|a| !a.is_null()),
        ConditionOperator::Unknown => {
            tracing::warn!("unknown condition operator, running step");
            true
        }
    }
}

/// Structural equality where numbers compare by value, so `50` equals `50.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
