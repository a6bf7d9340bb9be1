use clap::Args;
use serde_json::Value;
use tracing::debug;

use fair_value_core::engine;
use fair_value_core::{InputRecord, InputState, ModelId};

use crate::commands::apply_overrides;
use crate::input;

/// Arguments for evaluating one model, or every model at once
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Model to run (dcf, price_to_fcf, rule_one, peter_lynch, ben_graham, ten_cap, margin_of_safety)
    #[arg(long, required_unless_present = "all")]
    pub model: Option<ModelId>,

    /// Evaluate every model from a full state document (model id to record)
    #[arg(long, conflicts_with_all = ["model", "set", "strict"])]
    pub all: bool,

    /// Path to a JSON or YAML record (field name to value); stdin is read when piped
    #[arg(long)]
    pub input: Option<String>,

    /// Override a field, e.g. --set currentPrice=123.45 (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// Keep the failure reason instead of returning an empty result
    #[arg(long)]
    pub strict: bool,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = match args.model {
        Some(model) if !args.all => model,
        _ => return run_evaluate_all(args.input.as_deref()),
    };
    let record = build_record(model, args.input.as_deref(), &args.set)?;

    let result = if args.strict {
        engine::try_evaluate(model, &record)?
    } else {
        engine::evaluate(model, &record)
    };
    Ok(serde_json::to_value(result)?)
}

/// Every model in registry order; records the document leaves out keep
/// their defaults.
fn run_evaluate_all(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let state = match input::read_input::<InputState>(path)? {
        Some(partial) => InputState::from_partial(partial),
        None => InputState::new(),
    };
    Ok(serde_json::to_value(engine::evaluate_all(&state))?)
}

/// Defaults, then the input document, then the overrides.
pub fn build_record(
    model: ModelId,
    path: Option<&str>,
    overrides: &[String],
) -> Result<InputRecord, Box<dyn std::error::Error>> {
    let mut record = InputRecord::defaults(model);
    if let Some(supplied) = input::read_input::<InputRecord>(path)? {
        record.overlay(&supplied);
    }
    apply_overrides(model, &mut record, overrides)?;
    debug!(model = %model, overrides = overrides.len(), "built input record");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_evaluate_all_from_state_file() {
        let path = std::env::temp_dir().join("fairval_evaluate_all_state.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"peter_lynch": {"eps": "2", "epsGrowthRate": "15"}}"#)
            .unwrap();

        let value = run_evaluate(EvaluateArgs {
            model: None,
            all: true,
            input: Some(path.to_string_lossy().into_owned()),
            set: Vec::new(),
            strict: false,
        })
        .unwrap();
        std::fs::remove_file(&path).ok();

        let results = value.as_array().unwrap();
        assert_eq!(results.len(), ModelId::ALL.len());
        let lynch = results
            .iter()
            .find(|r| r["model"] == "peter_lynch")
            .unwrap();
        assert!(!lynch["primary_value"].is_null());
        let graham = results.iter().find(|r| r["model"] == "ben_graham").unwrap();
        assert!(graham["primary_value"].is_null());
    }
}
