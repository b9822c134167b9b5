//! Dotted-path resolution over nested context values.
//!
//! Resolution is pure and total: any missing segment, empty path, or
//! non-mapping intermediate value yields absent rather than an error.

use serde_json::Value;

/// Resolve a dot-separated path like `user.department` against a nested
/// JSON object, returning `None` if any segment is missing.
///
/// There are no wildcards or indices; every non-terminal segment must be an
/// object containing the next key.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Check whether a path resolves to a present, non-null value.
pub fn is_present(root: &Value, path: &str) -> bool {
    matches!(resolve(root, path), Some(v) if !v.is_null())
}

/// The textual form of a resolved value: strings render bare, everything
/// else renders as its compact JSON text.
pub fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
