use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, find_rows, flatten_fields};

/// Columns shown for installment rows, in display order.
const ROW_COLUMNS: [&str; 6] = ["number", "due_date", "payment", "amortization", "interest", "balance"];

/// Format output as tables: a Field/Value summary, then any row arrays.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_result(value),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    print_result(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_result(result: &Value) {
    match result {
        Value::Object(map) => {
            print_summary(map);
            if let Some(Value::Array(outcomes)) = map.get("outcomes") {
                println!("\nPrepayment outcomes:");
                print_rows(outcomes);
            }
            if let Some(rows) = find_rows(map) {
                println!();
                print_rows(rows);
            }
        }
        Value::Array(arr) => print_rows(arr),
        other => println!("{}", cell(other)),
    }
}

fn print_summary(map: &Map<String, Value>) {
    let mut fields = Vec::new();
    flatten_fields("", map, &mut fields);
    // Comparison results carry two full simulations; keep the summary readable.
    fields.retain(|(k, _)| !k.starts_with("price_simulation.") && !k.starts_with("sac_simulation."));
    if fields.is_empty() {
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in &fields {
        builder.push_record([key.as_str(), val.as_str()]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        if arr.is_empty() {
            println!("(empty)");
        }
        for item in arr {
            println!("{}", cell(item));
        }
        return;
    };

    let headers = row_headers(first);
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(String::as_str));
    for item in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h.as_str()).map(cell).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

/// Installment rows keep their natural column order; anything else uses its own keys.
pub(crate) fn row_headers(first: &Map<String, Value>) -> Vec<String> {
    if ROW_COLUMNS.iter().all(|c| first.contains_key(*c)) {
        ROW_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        first.keys().cloned().collect()
    }
}
