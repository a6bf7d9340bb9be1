pub mod evaluate;
pub mod margin_of_safety;
pub mod registry;
pub mod sync;
pub mod tables;

use fair_value_core::guard::sanitize_numeric_input;
use fair_value_core::input::{field_spec, FieldKind};
use fair_value_core::{InputRecord, ModelId};

/// Split a `field=value` override.
pub fn parse_assignment(raw: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("Empty field name in '{raw}'").into());
    }
    Ok((field.to_string(), value.trim().to_string()))
}

/// Apply `field=value` overrides the way the input widgets would: numeric
/// fields lose their thousand separators and must look like a number.
pub fn apply_overrides(
    model: ModelId,
    record: &mut InputRecord,
    overrides: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    for raw in overrides {
        let (field, value) = parse_assignment(raw)?;
        let value = match field_spec(model, &field).map(|spec| spec.kind) {
            Some(FieldKind::Numeric) => sanitize_numeric_input(&value)
                .ok_or_else(|| format!("'{value}' is not a number for {field}"))?,
            _ => value,
        };
        record.set(model, &field, &value);
    }
    Ok(())
}
