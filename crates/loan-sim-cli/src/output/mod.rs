pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Row-shaped arrays rendered as their own table / CSV block.
pub(crate) const ROW_FIELDS: [&str; 3] = ["schedule", "installments", "outcomes"];

/// Render a scalar JSON value for a single cell.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Flatten nested objects into `parent.child` keys, skipping row arrays.
pub(crate) fn flatten_fields(prefix: &str, map: &serde_json::Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_fields(&name, inner, out),
            Value::Array(_) if ROW_FIELDS.contains(&key.as_str()) => {}
            other => out.push((name, cell(other))),
        }
    }
}

/// Find the installment rows inside a result, looking one level into
/// nested simulations (`simulation.schedule`).
pub(crate) fn find_rows(map: &serde_json::Map<String, Value>) -> Option<&Vec<Value>> {
    for key in ROW_FIELDS.iter().take(2) {
        if let Some(Value::Array(rows)) = map.get(*key) {
            return Some(rows);
        }
    }
    map.get("simulation")
        .and_then(Value::as_object)
        .and_then(find_rows)
}
