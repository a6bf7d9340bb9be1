use clap::Args;
use serde_json::{json, Value};

use fair_value_core::valuation::margin_of_safety::{
    build_request, parse_response, PREDICTION_ENDPOINT,
};
use fair_value_core::ModelId;

use crate::commands::evaluate::build_record;

/// Arguments for preparing a margin-of-safety prediction request
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MosRequestArgs {
    /// Path to a JSON or YAML record; stdin is read when piped
    #[arg(long)]
    pub input: Option<String>,

    /// Override a field, e.g. --set peRatio=18 (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// A saved service reply to turn into a result instead
    #[arg(long)]
    pub response: Option<String>,
}

pub fn run_mos_request(args: MosRequestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = args.response {
        let body = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read '{path}': {e}"))?;
        return Ok(serde_json::to_value(parse_response(&body)?)?);
    }

    let record = build_record(ModelId::MarginOfSafety, args.input.as_deref(), &args.set)?;
    let request = build_request(&record)
        .map_err(|e| format!("Please fill in all input fields before calculating ({e})"))?;

    Ok(json!({
        "endpoint": PREDICTION_ENDPOINT,
        "method": "POST",
        "body": request,
    }))
}
