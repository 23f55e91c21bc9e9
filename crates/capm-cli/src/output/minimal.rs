use serde_json::Value;

use super::format_scalar;

/// Key answer fields in order of priority. Paths descend into nested objects
/// so the full analysis envelope resolves to the fitted beta as well.
const PRIORITY_PATHS: &[&[&str]] = &[
    &["beta"],
    &["fit", "beta", "estimate"],
    &["alpha"],
    &["r_squared"],
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn render_minimal(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for path in PRIORITY_PATHS {
        if let Some(val) = lookup(result_obj, path) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.as_object()?.get(*key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        _ => format_scalar(value, "null"),
    }
}
