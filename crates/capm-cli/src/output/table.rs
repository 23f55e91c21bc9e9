use serde_json::{Map, Value};
use std::fmt::Write;
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Arrays longer than this are summarised instead of printed inline.
const MAX_INLINE_ITEMS: usize = 8;

/// Format output as a table using the tabled crate.
pub fn render_table(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                render_result_table(result, map)
            } else {
                render_flat_object(map)
            }
        }
        Value::Array(arr) => render_array_table(arr),
        _ => value.to_string(),
    }
}

fn render_result_table(result: &Value, envelope: &Map<String, Value>) -> String {
    let mut out = match result {
        Value::Object(res_map) => render_flat_object(res_map),
        _ => render_flat_object(envelope),
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for w in warnings {
                if let Value::String(s) = w {
                    let _ = writeln!(out, "  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        let _ = writeln!(out, "\nMethodology: {}", meth);
    }
    out
}

fn render_flat_object(map: &Map<String, Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_cell(val)]);
    }
    format!("{}\n", Table::from(builder))
}

fn render_array_table(arr: &[Value]) -> String {
    if arr.is_empty() {
        return "(empty)\n".to_string();
    }

    // Headers come from the first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        format!("{}\n", Table::from(builder))
    } else {
        arr.iter().map(|item| format!("{}\n", format_cell(item))).collect()
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Array(arr) if arr.len() > MAX_INLINE_ITEMS => format!("[{} values]", arr.len()),
        Value::Array(arr) => arr
            .iter()
            .map(format_cell)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) if map.len() > MAX_INLINE_ITEMS => format!("{{{} fields}}", map.len()),
        _ => format_scalar(value, "NA"),
    }
}
