//! Parameter interpolation.
//!
//! Replaces `{{name}}` placeholders in string leaves with the string form of
//! the named variable. `name` may be a dotted path (`customer.email`,
//! `items.0.id`). Missing variables become the empty string; interpolation
//! never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*\}\}")
        .expect("placeholder regex must compile")
});

/// Interpolate every string leaf of a parameter map.
pub fn interpolate(
    params: &Map<String, Value>,
    variables: &Map<String, Value>,
) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), interpolate_value(value, variables)))
        .collect()
}

/// Interpolate a single value, preserving its shape.
///
/// Only string leaves are rewritten; a string stays a string even when it is
/// exactly one placeholder.
pub fn interpolate_value(value: &Value, variables: &Map<String, Value>) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate_str(s, variables)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_value(item, variables))
                .collect(),
        ),
        Value::Object(map) => Value::Object(interpolate(map, variables)),
        other => other.clone(),
    }
}

/// Replace every placeholder in `template`.
pub fn interpolate_str(template: &str, variables: &Map<String, Value>) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            resolve_path(variables, &caps[1])
                .map(value_to_string)
                .unwrap_or_default()
        })
        .into_owned()
}

/// List the variable names referenced by placeholders in `value`, in order
/// of first appearance.
pub fn find_placeholders(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_placeholders(value, &mut names);
    names
}

fn collect_placeholders(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in PLACEHOLDER_RE.captures_iter(s) {
                let name = caps[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, names)),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Resolve a dotted path against the variable environment.
///
/// The first segment names a variable; later segments walk object keys or
/// array indices. A name that exists verbatim (dots included) wins over the
/// dotted reading.
pub fn resolve_path<'a>(variables: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = variables.get(path) {
        return Some(value);
    }
    let (head, rest) = path.split_once('.')?;
    lookup_path(variables.get(head)?, rest)
}

/// Walk a dotted path into a value. An empty path returns the value itself.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String form used for substitution and `contains` comparisons.
///
/// Strings are used verbatim, `null` is empty, containers are compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
