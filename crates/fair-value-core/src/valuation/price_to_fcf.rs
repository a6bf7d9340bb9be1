use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{percentage_difference, DifferenceBasis};
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money, Multiple, Rate};
use crate::FairValueResult;

use super::ValuationResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceToFcfInput {
    pub free_cash_flow: Money,
    /// Expected change in FCF as a decimal (-0.1 = 10% decline)
    pub fcf_change: Rate,
    pub fcf_multiple: Multiple,
    pub shares_outstanding: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceToFcfOutput {
    pub adjusted_fcf: Money,
    pub target_market_cap: Money,
    pub target_buy_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
}

/// Target price = FCF * (1 + change) * multiple / shares.
pub fn calculate_price_to_fcf(
    input: &PriceToFcfInput,
) -> FairValueResult<ComputationOutput<PriceToFcfOutput>> {
    let start = Instant::now();
    let shares = guard::require_positive("shares_outstanding", input.shares_outstanding)?;

    let adjusted_fcf = input.free_cash_flow.try_mul(
        Decimal::ONE.try_add(input.fcf_change, "fcf change")?,
        "adjusted fcf",
    )?;
    let target_market_cap = adjusted_fcf.try_mul(input.fcf_multiple, "target market cap")?;
    let target_buy_price = target_market_cap.try_div(shares, "target buy price")?;

    let difference = percentage_difference(
        target_buy_price,
        input.current_price,
        DifferenceBasis::ComputedValue,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Price to free cash flow target",
        input,
        Vec::new(),
        elapsed,
        PriceToFcfOutput {
            adjusted_fcf,
            target_market_cap,
            target_buy_price,
            difference,
        },
    ))
}

pub fn input_from_record(record: &InputRecord) -> FairValueResult<PriceToFcfInput> {
    Ok(PriceToFcfInput {
        free_cash_flow: guard::required(record, fields::FCF)?,
        fcf_change: guard::required_pct(record, fields::FCF_CHANGE)?,
        fcf_multiple: guard::required(record, fields::FCF_MULTIPLE)?,
        shares_outstanding: guard::required(record, fields::SHARES_OUTSTANDING)?,
        current_price: guard::reference_price(record, fields::CURRENT_PRICE),
    })
}

pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let output = calculate_price_to_fcf(&input_from_record(record)?)?;
    Ok(ValuationResult::valued(
        ModelId::PriceToFcf,
        output.result.target_buy_price,
        output.result.difference,
    ))
}
