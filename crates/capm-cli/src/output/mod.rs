pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render a command result in the requested format.
pub fn render(format: &OutputFormat, value: &Value) -> String {
    match format {
        OutputFormat::Json => json::render_json(value),
        OutputFormat::Table => table::render_table(value),
        OutputFormat::Csv => csv_out::render_csv(value),
        OutputFormat::Minimal => minimal::render_minimal(value),
    }
}

/// Render and print to stdout.
pub fn format_output(format: &OutputFormat, value: &Value) {
    let rendered = render(format, value);
    if rendered.ends_with('\n') {
        print!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}

/// Scalar rendering shared by the text formatters. Missing observations
/// serialize as JSON null.
pub(crate) fn format_scalar(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{:.6}", f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
