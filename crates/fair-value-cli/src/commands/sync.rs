use clap::Args;
use serde_json::{json, Value};

use fair_value_core::sync::synchronize_with_report;
use fair_value_core::{InputState, ModelId};

use crate::input;

/// Arguments for applying one edit across models
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SyncArgs {
    /// Model the edit is made in
    #[arg(long)]
    pub model: ModelId,

    /// Field name, e.g. currentPrice
    #[arg(long)]
    pub field: String,

    /// New raw value
    #[arg(long)]
    pub value: String,

    /// Path to a JSON or YAML state (model to record); missing parts take defaults
    #[arg(long)]
    pub state: Option<String>,

    /// Print the list of propagated and skipped members with the state
    #[arg(long)]
    pub report: bool,
}

pub fn run_sync(args: SyncArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = match input::read_input::<InputState>(args.state.as_deref())? {
        Some(partial) => InputState::from_partial(partial),
        None => InputState::new(),
    };

    let (state, report) = synchronize_with_report(args.model, &args.field, &args.value, state);

    if args.report {
        Ok(json!({
            "state": state,
            "applied": report.applied,
            "skipped": report.skipped,
        }))
    } else {
        Ok(serde_json::to_value(state)?)
    }
}
