use clap::Args;
use serde_json::{json, Value};

use fair_value_core::input::schema;
use fair_value_core::sync::SHARED_FIELD_GROUPS;
use fair_value_core::{InputRecord, InputState, ModelId};

/// Arguments for printing defaults
#[derive(Args)]
pub struct DefaultsArgs {
    /// Only this model's record
    #[arg(long)]
    pub model: Option<ModelId>,
}

pub fn run_defaults(args: DefaultsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.model {
        Some(model) => Ok(serde_json::to_value(InputRecord::defaults(model))?),
        None => Ok(serde_json::to_value(InputState::new())?),
    }
}

/// Arguments for listing models
#[derive(Args)]
pub struct ModelsArgs {
    /// Print this model's input fields with labels and defaults
    #[arg(long)]
    pub model: Option<ModelId>,
}

pub fn run_models(args: ModelsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(model) = args.model {
        return Ok(serde_json::to_value(schema(model))?);
    }
    let models: Vec<Value> = ModelId::ALL
        .into_iter()
        .map(|model| {
            json!({
                "id": model.as_str(),
                "name": model.display_name(),
                "fields": schema(model).len(),
            })
        })
        .collect();
    Ok(Value::Array(models))
}

/// One row per member so the table and csv formats stay flat.
pub fn run_groups() -> Result<Value, Box<dyn std::error::Error>> {
    let mut rows = Vec::new();
    for group in SHARED_FIELD_GROUPS {
        for member in group.members {
            let condition = member
                .condition
                .map(|c| serde_json::to_string(&c))
                .transpose()?
                .unwrap_or_default();
            rows.push(json!({
                "group": group.name,
                "model": member.model.as_str(),
                "field": member.field,
                "condition": condition,
            }));
        }
    }
    Ok(Value::Array(rows))
}
