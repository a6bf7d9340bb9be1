//! Margin of Safety model.
//!
//! The fair value comes from a remote inference service, so nothing is
//! computed here. This module decides when a record may be submitted, builds
//! the request body and turns the service's answer into a [`ValuationResult`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FairValueError;
use crate::input::{schema, FieldKind, InputRecord};
use crate::types::ModelId;
use crate::FairValueResult;

use super::ValuationResult;

/// Where the hosted prediction service listens.
pub const PREDICTION_ENDPOINT: &str = "https://keskid83-stock-analysis-api.hf.space/predict";

/// JSON body posted to the prediction service: every text field of the
/// record under its input name, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest {
    pub fields: BTreeMap<String, String>,
}

/// Successful service reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted margin of safety in percent; negative suggests overvaluation.
    pub predicted_margin_of_safety: Decimal,
}

#[derive(Debug, Deserialize)]
struct PredictionFailure {
    error: String,
}

/// The form may be submitted only when no field, declared or extra, is blank.
pub fn is_submittable(record: &InputRecord) -> bool {
    missing_fields(record).is_empty()
}

/// Every blank text field, declared fields first, then extras.
pub fn missing_fields(record: &InputRecord) -> Vec<String> {
    let mut missing: Vec<String> = schema(ModelId::MarginOfSafety)
        .iter()
        .filter(|spec| spec.kind == FieldKind::Numeric)
        .filter(|spec| record.text(spec.name).trim().is_empty())
        .map(|spec| spec.name.to_string())
        .collect();
    for (name, value) in record.text_fields() {
        if value.trim().is_empty() && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}

/// Build the request body, or report the first blank field.
pub fn build_request(record: &InputRecord) -> FairValueResult<PredictionRequest> {
    if let Some(field) = missing_fields(record).into_iter().next() {
        return Err(FairValueError::MissingInput { field });
    }
    let fields = record
        .text_fields()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    Ok(PredictionRequest { fields })
}

/// Turn a service reply into a result. The prediction becomes the primary
/// value; there is no price comparison.
pub fn result_from_response(response: &PredictionResponse) -> ValuationResult {
    ValuationResult::valued(
        ModelId::MarginOfSafety,
        response.predicted_margin_of_safety,
        None,
    )
}

/// Parse a raw reply body. The service reports failures as
/// `{"error": "..."}`.
pub fn parse_response(body: &str) -> FairValueResult<ValuationResult> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Ok(failure) = serde_json::from_value::<PredictionFailure>(value.clone()) {
        return Err(FairValueError::InvalidDomain(format!(
            "prediction service error: {}",
            failure.error
        )));
    }
    let response: PredictionResponse = serde_json::from_value(value)?;
    Ok(result_from_response(&response))
}

/// Local evaluation never yields a value for this model.
pub fn evaluate_record(_record: &InputRecord) -> FairValueResult<ValuationResult> {
    Ok(ValuationResult::empty(ModelId::MarginOfSafety))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::fields;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn complete_record() -> InputRecord {
        let mut record = InputRecord::defaults(ModelId::MarginOfSafety);
        for spec in schema(ModelId::MarginOfSafety) {
            record.set(ModelId::MarginOfSafety, spec.name, "1");
        }
        record
    }

    #[test]
    fn test_blank_record_not_submittable() {
        let record = InputRecord::defaults(ModelId::MarginOfSafety);
        assert!(!is_submittable(&record));
        assert!(build_request(&record).is_err());
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let mut record = complete_record();
        record.set(ModelId::MarginOfSafety, fields::PE_RATIO, "   ");
        assert_eq!(missing_fields(&record), vec![fields::PE_RATIO.to_string()]);
    }

    #[test]
    fn test_request_body_keeps_raw_text() {
        let mut record = complete_record();
        record.set(ModelId::MarginOfSafety, fields::MARKET_CAP, "2500000000");
        let request = build_request(&record).unwrap();
        assert_eq!(request.fields.len(), 10);
        assert_eq!(request.fields[fields::MARKET_CAP], "2500000000");
    }

    #[test]
    fn test_parse_prediction() {
        let result = parse_response(r#"{"predicted_margin_of_safety": 12.5}"#).unwrap();
        assert_eq!(result.primary_value, Some(dec!(12.5)));
        assert_eq!(result.comparison, None);
    }

    #[test]
    fn test_parse_service_error() {
        let err = parse_response(r#"{"error": "model not loaded"}"#).unwrap_err();
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn test_local_evaluation_is_empty() {
        let result = evaluate_record(&complete_record()).unwrap();
        assert_eq!(result.primary_value, None);
    }
}
