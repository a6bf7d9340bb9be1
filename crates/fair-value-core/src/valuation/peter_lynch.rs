use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{percentage_difference, DifferenceBasis};
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money, Multiple};
use crate::FairValueResult;

use super::ValuationResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LynchInput {
    pub eps: Money,
    /// EPS growth in percent, used raw as the fair P/E
    pub growth_pct: Decimal,
    pub peg_ratio: Multiple,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LynchOutput {
    pub fair_value: Money,
    /// growth * PEG, the P/E the stock "deserves"
    pub fair_pe: Multiple,
    /// Upside from the current price: (value - price) / price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
}

/// Fair value = EPS * growth * PEG.
pub fn calculate_lynch(input: &LynchInput) -> FairValueResult<ComputationOutput<LynchOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let fair_pe = input.growth_pct.try_mul(input.peg_ratio, "fair p/e")?;
    let fair_value = input.eps.try_mul(fair_pe, "lynch fair value")?;
    if fair_pe <= Decimal::ZERO {
        warnings.push("Non-positive growth gives no meaningful Lynch fair value".into());
    }

    let difference = percentage_difference(
        fair_value,
        input.current_price,
        DifferenceBasis::ReferencePrice,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Peter Lynch fair value (EPS x growth x PEG)",
        input,
        warnings,
        elapsed,
        LynchOutput {
            fair_value,
            fair_pe,
            difference,
        },
    ))
}

pub fn input_from_record(record: &InputRecord) -> FairValueResult<LynchInput> {
    Ok(LynchInput {
        eps: guard::required(record, fields::EPS)?,
        growth_pct: guard::required(record, fields::EPS_GROWTH_RATE)?,
        peg_ratio: guard::required(record, fields::PEG_RATIO)?,
        current_price: guard::reference_price(record, fields::CURRENT_PRICE),
    })
}

pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let output = calculate_lynch(&input_from_record(record)?)?;
    let mut result = ValuationResult::valued(
        ModelId::PeterLynch,
        output.result.fair_value,
        output.result.difference,
    );
    result.warnings = output.warnings;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lynch_fair_value() {
        let input = LynchInput {
            eps: dec!(2),
            growth_pct: dec!(15),
            peg_ratio: dec!(1),
            current_price: Some(dec!(20)),
        };
        let out = calculate_lynch(&input).unwrap().result;
        assert_eq!(out.fair_value, dec!(30));
        // (30 - 20) / 20 = +50%
        assert_eq!(out.difference, Some(dec!(50)));
    }

    #[test]
    fn test_lynch_no_price_no_comparison() {
        let input = LynchInput {
            eps: dec!(2),
            growth_pct: dec!(15),
            peg_ratio: dec!(1),
            current_price: None,
        };
        assert_eq!(calculate_lynch(&input).unwrap().result.difference, None);
    }

    #[test]
    fn test_lynch_missing_peg_is_error() {
        let mut record = InputRecord::defaults(ModelId::PeterLynch);
        record.set(ModelId::PeterLynch, fields::EPS, "2");
        record.set(ModelId::PeterLynch, fields::EPS_GROWTH_RATE, "15");
        record.set(ModelId::PeterLynch, fields::PEG_RATIO, "");
        assert!(input_from_record(&record).is_err());
    }
}
