use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use fair_value_core::comparison::{
    classify_cap_rate as classify_rate, classify_difference as classify, percentage_difference,
};
use fair_value_core::input::schema;
use fair_value_core::tables::{self, BuyPrice};
use fair_value_core::valuation::margin_of_safety;
use fair_value_core::{engine, sync, InputRecord, InputState, ModelId};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_model(model: &str) -> NapiResult<ModelId> {
    model.parse::<ModelId>().map_err(to_napi_error)
}

fn parse_decimal(field: &str, raw: &str) -> NapiResult<Decimal> {
    fair_value_core::guard::parse_decimal(raw)
        .ok_or_else(|| to_napi_error(format!("{field}: '{raw}' is not a decimal number")))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluate a model's record (`{"fieldName": "raw text" | bool}`). Fields the
/// record leaves out take their defaults.
#[napi]
pub fn evaluate(model: String, record_json: String) -> NapiResult<String> {
    let model = parse_model(&model)?;
    let supplied: InputRecord = serde_json::from_str(&record_json).map_err(to_napi_error)?;
    let mut record = InputRecord::defaults(model);
    record.overlay(&supplied);
    let result = engine::evaluate(model, &record);
    serde_json::to_string(&result).map_err(to_napi_error)
}

/// Apply one edit to the state and propagate it across shared fields.
#[napi]
pub fn synchronize(
    model: String,
    field: String,
    value: String,
    state_json: String,
) -> NapiResult<String> {
    let model = parse_model(&model)?;
    let partial: InputState = serde_json::from_str(&state_json).map_err(to_napi_error)?;
    let state = sync::synchronize(model, &field, &value, InputState::from_partial(partial));
    serde_json::to_string(&state).map_err(to_napi_error)
}

#[napi]
pub fn default_state() -> NapiResult<String> {
    serde_json::to_string(&InputState::new()).map_err(to_napi_error)
}

#[napi]
pub fn shared_field_groups() -> NapiResult<String> {
    serde_json::to_string(sync::SHARED_FIELD_GROUPS).map_err(to_napi_error)
}

/// Input fields of one model: name, label, kind and default.
#[napi]
pub fn model_schema(model: String) -> NapiResult<String> {
    let model = parse_model(&model)?;
    serde_json::to_string(schema(model)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison and tables
// ---------------------------------------------------------------------------

/// Band for a percentage difference; an absent difference is neutral.
#[napi]
pub fn classify_difference(difference: Option<String>) -> NapiResult<String> {
    let difference = difference
        .map(|d| parse_decimal("difference", &d))
        .transpose()?;
    let band = classify(difference);
    serde_json::to_string(&serde_json::json!({
        "band": band,
        "label": band.label(),
        "color": band.color(),
    }))
    .map_err(to_napi_error)
}

/// Ten Cap hurdle band; an absent cap rate is neutral.
#[napi]
pub fn classify_cap_rate(cap_rate: Option<String>) -> NapiResult<String> {
    let cap_rate = cap_rate
        .map(|r| parse_decimal("cap_rate", &r))
        .transpose()?;
    let band = classify_rate(cap_rate);
    serde_json::to_string(&serde_json::json!({
        "band": band,
        "color": band.color(),
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn margin_of_safety_ladder(value: String) -> NapiResult<String> {
    let value = parse_decimal("value", &value)?;
    serde_json::to_string(&tables::margin_of_safety_ladder(value)).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct CagrRequest {
    future_price: Decimal,
    years: u32,
    buy_prices: Vec<BuyPrice>,
}

/// `{"future_price": "..", "years": 10, "buy_prices": [{"label": "..", "price": ".."}]}`
#[napi]
pub fn cagr_table(input_json: String) -> NapiResult<String> {
    let request: CagrRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let rows = tables::cagr_table(&request.buy_prices, request.future_price, request.years);
    serde_json::to_string(&rows).map_err(to_napi_error)
}

/// Percentage difference of `value` against `price`, dividing by the value.
#[napi]
pub fn price_difference(value: String, price: String) -> NapiResult<Option<String>> {
    let value = parse_decimal("value", &value)?;
    let price = parse_decimal("price", &price)?;
    Ok(percentage_difference(
        value,
        Some(price),
        fair_value_core::comparison::DifferenceBasis::ComputedValue,
    )
    .map(|d| d.to_string()))
}

// ---------------------------------------------------------------------------
// Margin of Safety
// ---------------------------------------------------------------------------

/// Request body for the prediction service, or an error naming the first
/// blank field.
#[napi]
pub fn margin_of_safety_request(record_json: String) -> NapiResult<String> {
    let supplied: InputRecord = serde_json::from_str(&record_json).map_err(to_napi_error)?;
    let mut record = InputRecord::defaults(ModelId::MarginOfSafety);
    record.overlay(&supplied);
    let request = margin_of_safety::build_request(&record).map_err(to_napi_error)?;
    serde_json::to_string(&request).map_err(to_napi_error)
}

/// Turn the prediction service reply into a valuation result.
#[napi]
pub fn margin_of_safety_result(response_json: String) -> NapiResult<String> {
    let result = margin_of_safety::parse_response(&response_json).map_err(to_napi_error)?;
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Typed calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_dcf(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::dcf::DcfInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fair_value_core::valuation::dcf::calculate_dcf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_graham(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::ben_graham::GrahamInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fair_value_core::valuation::ben_graham::calculate_graham(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_lynch(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::peter_lynch::LynchInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fair_value_core::valuation::peter_lynch::calculate_lynch(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_rule_one(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::rule_one::RuleOneInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fair_value_core::valuation::rule_one::calculate_rule_one(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_ten_cap(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::ten_cap::TenCapInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fair_value_core::valuation::ten_cap::calculate_ten_cap(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_price_to_fcf(input_json: String) -> NapiResult<String> {
    let input: fair_value_core::valuation::price_to_fcf::PriceToFcfInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = fair_value_core::valuation::price_to_fcf::calculate_price_to_fcf(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
