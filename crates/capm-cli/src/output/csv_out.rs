use serde_json::Value;

use super::format_scalar;

/// Render output as CSV. Missing observations become empty cells.
pub fn render_csv(value: &Value) -> String {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    match value {
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            // Two-column CSV: field, value
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    wtr.into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

fn write_array_csv(wtr: &mut csv::Writer<Vec<u8>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        // Full precision for downstream tools
        Value::Number(n) => n.to_string(),
        _ => format_scalar(value, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_to_csv() {
        let v = json!([
            {"date": "2002-01-31", "ret_SANDP": null},
            {"date": "2002-02-28", "ret_SANDP": -2.0995},
        ]);
        let out = render_csv(&v);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "date,ret_SANDP");
        assert_eq!(lines[1], "2002-01-31,");
        assert_eq!(lines[2], "2002-02-28,-2.0995");
    }

    #[test]
    fn test_envelope_to_field_value() {
        let v = json!({"result": {"beta": 1.5}, "warnings": []});
        let out = render_csv(&v);
        assert!(out.starts_with("field,value\n"));
        assert!(out.contains("beta,1.5"));
    }
}
