use serde_json::Value;

use super::cell;

/// Headline field per command, checked in order.
const PRIORITY_KEYS: [&str; 6] = [
    "interest_saved",
    "cheaper_method",
    "annual_rate",
    "first_payment",
    "total_interest",
    "id",
];

/// Print just the key answer from the output.
///
/// Falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let headline = PRIORITY_KEYS
                .iter()
                .find_map(|k| map.get(*k).filter(|v| !v.is_null()));
            match headline {
                Some(val) => println!("{}", cell(val)),
                None => {
                    if let Some((key, val)) = map.iter().next() {
                        println!("{}: {}", key, cell(val));
                    }
                }
            }
        }
        Value::Array(arr) => println!("{}", arr.len()),
        other => println!("{}", cell(other)),
    }
}
