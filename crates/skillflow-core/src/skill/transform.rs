//! Result transformation applied before a step result is saved.

use serde_json::Value;
use skillflow_types::skill::ResultTransform;

/// Reshape `value` according to `kind`. Never fails; anything that cannot be
/// transformed is returned unchanged.
pub fn transform(value: Value, kind: ResultTransform) -> Value {
    match kind {
        ResultTransform::Stringify => match value {
            Value::String(_) => value,
            other => Value::String(other.to_string()),
        },
        ResultTransform::Parse => match value {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            structured => structured,
        },
        ResultTransform::First => match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        },
        ResultTransform::Count => match value {
            Value::Array(items) => Value::from(items.len()),
            _ => Value::from(1),
        },
        ResultTransform::Unknown => {
            tracing::warn!("unknown result transform, storing result unchanged");
            value
        }
    }
}
