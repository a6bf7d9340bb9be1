use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{percentage_difference, DifferenceBasis};
use crate::error::FairValueError;
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money, Multiple, Rate};
use crate::FairValueResult;

use super::{ResultLine, ValuationResult};

/// The buy price is the sticker price at this discount.
pub const RULE_ONE_MARGIN: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOneInput {
    pub eps: Money,
    /// Expected EPS growth as a decimal
    pub growth_rate: Rate,
    pub future_pe: Multiple,
    /// Minimum acceptable annual return as a decimal
    pub min_return: Rate,
    pub years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOneOutput {
    pub future_eps: Money,
    pub future_price: Money,
    /// Future price discounted back at the minimum return
    pub sticker_price: Money,
    /// Half the sticker price
    pub margin_of_safety_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_rule_one(
    input: &RuleOneInput,
) -> FairValueResult<ComputationOutput<RuleOneOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.years == 0 {
        warnings.push("Zero-year horizon: sticker price equals today's EPS times the future P/E".into());
    }
    let years = i64::from(input.years);

    let future_eps = input.eps.try_mul(
        Decimal::ONE
            .try_add(input.growth_rate, "eps growth")?
            .try_powi(years, "future eps")?,
        "future eps",
    )?;
    let future_price = future_eps.try_mul(input.future_pe, "future price")?;
    let discount = Decimal::ONE
        .try_add(input.min_return, "minimum return")?
        .try_powi(years, "sticker discount")?;
    let sticker_price = future_price.try_div(discount, "sticker price")?;
    let margin_of_safety_price = sticker_price.try_mul(RULE_ONE_MARGIN, "margin of safety price")?;

    let difference = percentage_difference(
        sticker_price,
        input.current_price,
        DifferenceBasis::ComputedValue,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rule #1 sticker price (future EPS x future P/E discounted at the minimum return)",
        input,
        warnings,
        elapsed,
        RuleOneOutput {
            future_eps,
            future_price,
            sticker_price,
            margin_of_safety_price,
            difference,
        },
    ))
}

pub fn input_from_record(record: &InputRecord) -> FairValueResult<RuleOneInput> {
    Ok(RuleOneInput {
        eps: guard::required(record, fields::EPS)?,
        growth_rate: guard::required_pct(record, fields::EPS_GROWTH_RATE)?,
        future_pe: guard::required(record, fields::FUTURE_PE)?,
        min_return: guard::required_pct(record, fields::MIN_RATE_OF_RETURN)?,
        years: whole_years(guard::required(record, fields::YEARS)?)?,
        current_price: guard::reference_price(record, fields::CURRENT_PRICE),
    })
}

pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let output = calculate_rule_one(&input_from_record(record)?)?;
    let out = output.result;
    let mut result = ValuationResult::valued(ModelId::RuleOne, out.sticker_price, out.difference);
    result.details.push(ResultLine::new(
        "margin_of_safety_price",
        "Margin of Safety Price (50%)",
        out.margin_of_safety_price,
        None,
    ));
    result.warnings = output.warnings;
    Ok(result)
}

/// Years are whole: fractional input is truncated toward zero.
fn whole_years(raw: Decimal) -> FairValueResult<u32> {
    if raw < Decimal::ZERO {
        return Err(FairValueError::InvalidInput {
            field: fields::YEARS.into(),
            reason: "Number of years cannot be negative".into(),
        });
    }
    raw.trunc().to_u32().ok_or_else(|| FairValueError::InvalidInput {
        field: fields::YEARS.into(),
        reason: "Number of years is too large".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleOneInput {
        RuleOneInput {
            eps: dec!(1),
            growth_rate: dec!(0.10),
            future_pe: dec!(15),
            min_return: dec!(0.15),
            years: 10,
            current_price: None,
        }
    }

    #[test]
    fn test_sticker_price() {
        let out = calculate_rule_one(&sample()).unwrap().result;
        assert!(
            (out.sticker_price - dec!(9.617)).abs() < dec!(0.001),
            "Expected ~9.617, got {}",
            out.sticker_price
        );
    }

    #[test]
    fn test_margin_of_safety_is_half_sticker() {
        let out = calculate_rule_one(&sample()).unwrap().result;
        assert_eq!(out.margin_of_safety_price, out.sticker_price * dec!(0.5));
    }

    #[test]
    fn test_years_truncated() {
        assert_eq!(whole_years(dec!(7.9)).unwrap(), 7);
        assert_eq!(whole_years(dec!(10)).unwrap(), 10);
        assert!(whole_years(dec!(-1)).is_err());
    }

    #[test]
    fn test_zero_years_keeps_today() {
        let mut input = sample();
        input.years = 0;
        let out = calculate_rule_one(&input).unwrap().result;
        assert_eq!(out.sticker_price, dec!(15));
    }
}
