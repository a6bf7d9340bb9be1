use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field of the object.
pub fn print_minimal(value: &Value) {
    // Evaluations with no value say so instead of printing null
    if let Some(Value::Null) = value.get("primary_value") {
        println!("n/a");
        return;
    }

    let priority_keys = [
        "primary_value",
        "band",
        "target_buy_price",
        "cagr_pct",
        "endpoint",
    ];

    match value {
        Value::Object(map) => {
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        // Tables: one line per row
        Value::Array(rows) => {
            for row in rows {
                print_minimal(row);
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
