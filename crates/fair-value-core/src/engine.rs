//! The interface-facing entry point: evaluate a model's raw record.
//!
//! Every calculator reports failures as errors. Here they are folded into an
//! empty result, because the interface only ever says "enter all required
//! inputs" and never shows the cause.

use tracing::debug;

use crate::input::{InputRecord, InputState};
use crate::types::ModelId;
use crate::valuation::{
    ben_graham, dcf, margin_of_safety, peter_lynch, price_to_fcf, rule_one, ten_cap,
    ValuationResult,
};
use crate::FairValueResult;

/// Evaluate `record` with `model`. Never fails: missing or invalid inputs
/// give a result with no primary value.
pub fn evaluate(model: ModelId, record: &InputRecord) -> ValuationResult {
    match try_evaluate(model, record) {
        Ok(result) => result,
        Err(e) => {
            debug!(model = %model, error = %e, "evaluation produced no value");
            ValuationResult::empty(model)
        }
    }
}

/// Like [`evaluate`] but keeps the reason a value could not be produced.
pub fn try_evaluate(model: ModelId, record: &InputRecord) -> FairValueResult<ValuationResult> {
    match model {
        ModelId::Dcf => dcf::evaluate_record(record),
        ModelId::PeterLynch => peter_lynch::evaluate_record(record),
        ModelId::BenGraham => ben_graham::evaluate_record(record),
        ModelId::RuleOne => rule_one::evaluate_record(record),
        ModelId::TenCap => ten_cap::evaluate_record(record),
        ModelId::PriceToFcf => price_to_fcf::evaluate_record(record),
        ModelId::MarginOfSafety => margin_of_safety::evaluate_record(record),
    }
}

/// Evaluate every model in registry order.
pub fn evaluate_all(state: &InputState) -> Vec<ValuationResult> {
    ModelId::ALL
        .into_iter()
        .map(|model| evaluate(model, state.record(model)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::fields;

    #[test]
    fn test_defaults_evaluate_to_nothing() {
        let state = InputState::new();
        for result in evaluate_all(&state) {
            assert_eq!(result.primary_value, None, "{} had a value", result.model);
        }
    }

    #[test]
    fn test_error_reason_kept_by_try_evaluate() {
        let record = InputRecord::defaults(ModelId::BenGraham);
        let err = try_evaluate(ModelId::BenGraham, &record).unwrap_err();
        assert!(err.is_input_failure());
    }

    #[test]
    fn test_unparsable_field_collapses() {
        let mut record = InputRecord::defaults(ModelId::PeterLynch);
        record.set(ModelId::PeterLynch, fields::EPS, "1,000");
        record.set(ModelId::PeterLynch, fields::EPS_GROWTH_RATE, "10");
        assert_eq!(evaluate(ModelId::PeterLynch, &record).primary_value, None);
    }
}
