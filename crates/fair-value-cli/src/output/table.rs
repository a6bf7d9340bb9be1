use colored::Colorize;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) if map.contains_key("primary_value") => print_valuation(map),
        Value::Object(_) => print_flat_object(value),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

/// An evaluation: headline, details, secondary tables, warnings.
fn print_valuation(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    if let Some(model) = map.get("model") {
        builder.push_record(["model", &format_value(model)]);
    }
    match map.get("primary_value") {
        Some(Value::Null) | None => {
            builder.push_record(["primary_value", "enter all required inputs"])
        }
        Some(v) => builder.push_record(["primary_value", &format_rounded(v, 2)]),
    }
    if let Some(diff) = map.get("comparison").filter(|v| !v.is_null()) {
        builder.push_record(["comparison", &format!("{}%", format_rounded(diff, 1))]);
    }
    for line in map.get("details").and_then(Value::as_array).into_iter().flatten() {
        let label = line.get("label").map(format_value).unwrap_or_default();
        let mut shown = line.get("value").map(|v| format_rounded(v, 2)).unwrap_or_default();
        if let Some(diff) = line.get("comparison").filter(|v| !v.is_null()) {
            shown = format!("{shown} ({}%)", format_rounded(diff, 1));
        }
        builder.push_record([label, shown]);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::String(band)) = map.get("band") {
        println!("Band: {}", colorize_band(band));
    }
    // Lines with their own scale, e.g. the Ten Cap hurdle
    for line in map.get("details").and_then(Value::as_array).into_iter().flatten() {
        if let Some(Value::String(color)) = line.get("color") {
            let label = line.get("label").map(format_value).unwrap_or_default();
            let shown = line.get("value").map(|v| format_rounded(v, 2)).unwrap_or_default();
            println!("{}: {}", label, paint(color, &shown));
        }
    }

    for table in map.get("secondary").and_then(Value::as_array).into_iter().flatten() {
        let kind = table.get("kind").map(format_value).unwrap_or_default();
        println!("\n{}", kind.replace('_', " "));
        if let Some(Value::Array(rows)) = table.get("rows") {
            print_array_table(rows);
        }
    }

    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }
}

fn colorize_band(band: &str) -> String {
    match band {
        "far_below_fair_value" => band.red().bold().to_string(),
        "moderately_below" => band.yellow().to_string(),
        "near_fair_value" => band.bright_green().to_string(),
        "undervalued" => band.green().bold().to_string(),
        _ => band.to_string(),
    }
}

fn paint(color: &str, text: &str) -> String {
    match color {
        "red" => text.red().bold().to_string(),
        "amber" => text.yellow().to_string(),
        "light_green" => text.bright_green().to_string(),
        "strong_green" => text.green().bold().to_string(),
        _ => text.to_string(),
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Decimals arrive as strings; show them to `dp` places.
fn format_rounded(value: &Value, dp: u32) -> String {
    let raw = format_value(value);
    match raw.parse::<Decimal>() {
        Ok(d) => d.round_dp(dp).to_string(),
        Err(_) => raw,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
