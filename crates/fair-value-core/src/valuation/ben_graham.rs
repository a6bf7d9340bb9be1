use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{percentage_difference, DifferenceBasis};
use crate::error::FairValueError;
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money};
use crate::FairValueResult;

use super::ValuationResult;

/// P/E of a company with no growth in Graham's revised formula.
pub const NO_GROWTH_PE: Decimal = dec!(8.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrahamInput {
    pub eps: Money,
    /// Expected EPS growth in percent (7 = 7%), used raw
    pub growth_pct: Decimal,
    /// Average AAA corporate bond yield in percent
    pub average_yield_pct: Decimal,
    /// Current AAA corporate bond yield in percent
    pub current_yield_pct: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrahamOutput {
    pub intrinsic_value: Money,
    /// 8.5 + 2g
    pub growth_multiple: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// V = EPS * (8.5 + 2g) * Y_avg / Y_current
pub fn calculate_graham(input: &GrahamInput) -> FairValueResult<ComputationOutput<GrahamOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.current_yield_pct <= Decimal::ZERO {
        return Err(FairValueError::InvalidInput {
            field: "current_yield_pct".into(),
            reason: "Current AAA yield must be greater than zero".into(),
        });
    }
    if input.eps < Decimal::ZERO {
        warnings.push("Negative EPS produces a negative Graham value".into());
    }

    let growth_premium = dec!(2).try_mul(input.growth_pct, "growth multiple")?;
    let growth_multiple = NO_GROWTH_PE.try_add(growth_premium, "growth multiple")?;
    let intrinsic_value = input
        .eps
        .try_mul(growth_multiple, "graham value")?
        .try_mul(input.average_yield_pct, "graham value")?
        .try_div(input.current_yield_pct, "graham value")?;

    let difference = percentage_difference(
        intrinsic_value,
        input.current_price,
        DifferenceBasis::ComputedValue,
    );

    let output = GrahamOutput {
        intrinsic_value,
        growth_multiple,
        difference,
    };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Benjamin Graham revised intrinsic value formula",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub fn input_from_record(record: &InputRecord) -> FairValueResult<GrahamInput> {
    Ok(GrahamInput {
        eps: guard::required(record, fields::EPS)?,
        growth_pct: guard::required(record, fields::EPS_GROWTH_RATE)?,
        average_yield_pct: guard::required(record, fields::AVG_YIELD)?,
        current_yield_pct: guard::required(record, fields::CURRENT_YIELD)?,
        current_price: guard::reference_price(record, fields::CURRENT_PRICE),
    })
}

pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let output = calculate_graham(&input_from_record(record)?)?;
    let mut result = ValuationResult::valued(
        ModelId::BenGraham,
        output.result.intrinsic_value,
        output.result.difference,
    );
    result.warnings = output.warnings;
    Ok(result)
}
