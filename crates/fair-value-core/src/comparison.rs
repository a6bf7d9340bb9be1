use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::guard::DecimalExt;
use crate::types::Money;

/// Lower edge of the moderately-below band, in percent.
pub const FAR_BELOW_THRESHOLD: Decimal = dec!(-30);
/// Lower edge of the near-fair-value band, in percent.
pub const MODERATELY_BELOW_THRESHOLD: Decimal = dec!(-10);
/// Owner-earnings yield the ten-cap rule asks for, in percent.
pub const TEN_CAP_HURDLE: Decimal = dec!(10);

/// What the percentage difference is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceBasis {
    /// `(value - price) / value`: how far the price sits under the estimate.
    ComputedValue,
    /// `(value - price) / price`: upside from today's price.
    ReferencePrice,
}

/// Signed percentage difference between an estimate and a reference price.
///
/// `None` when the reference price is missing or non-positive, or when the
/// chosen divisor is zero.
pub fn percentage_difference(
    value: Money,
    reference_price: Option<Money>,
    basis: DifferenceBasis,
) -> Option<Decimal> {
    let price = reference_price.filter(|p| *p > Decimal::ZERO)?;
    let divisor = match basis {
        DifferenceBasis::ComputedValue => value,
        DifferenceBasis::ReferencePrice => price,
    };
    value
        .try_sub(price, "percentage difference")
        .and_then(|diff| diff.try_div(divisor, "percentage difference"))
        .and_then(|ratio| ratio.try_mul(dec!(100), "percentage difference"))
        .ok()
}

/// Ordered bands for a percentage difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationBand {
    /// No comparison available.
    Neutral,
    /// Below -30%.
    FarBelowFairValue,
    /// -30% (inclusive) to -10% (exclusive).
    ModeratelyBelow,
    /// -10% to 0%, both inclusive.
    NearFairValue,
    /// Above 0%.
    Undervalued,
}

impl ValuationBand {
    pub fn color(&self) -> BandColor {
        match self {
            ValuationBand::Neutral => BandColor::None,
            ValuationBand::FarBelowFairValue => BandColor::Red,
            ValuationBand::ModeratelyBelow => BandColor::Amber,
            ValuationBand::NearFairValue => BandColor::LightGreen,
            ValuationBand::Undervalued => BandColor::StrongGreen,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValuationBand::Neutral => "no comparison",
            ValuationBand::FarBelowFairValue => "far below fair value",
            ValuationBand::ModeratelyBelow => "moderately below fair value",
            ValuationBand::NearFairValue => "at or near fair value",
            ValuationBand::Undervalued => "undervalued",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandColor {
    None,
    Red,
    Amber,
    LightGreen,
    StrongGreen,
}

/// Map a signed percentage difference to its band.
pub fn classify_difference(difference: Option<Decimal>) -> ValuationBand {
    match difference {
        None => ValuationBand::Neutral,
        Some(d) if d < FAR_BELOW_THRESHOLD => ValuationBand::FarBelowFairValue,
        Some(d) if d < MODERATELY_BELOW_THRESHOLD => ValuationBand::ModeratelyBelow,
        Some(d) if d <= Decimal::ZERO => ValuationBand::NearFairValue,
        Some(_) => ValuationBand::Undervalued,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapRateBand {
    Neutral,
    BelowHurdle,
    MeetsHurdle,
}

impl CapRateBand {
    pub fn color(&self) -> BandColor {
        match self {
            CapRateBand::Neutral => BandColor::None,
            CapRateBand::BelowHurdle => BandColor::Amber,
            CapRateBand::MeetsHurdle => BandColor::StrongGreen,
        }
    }
}

pub fn classify_cap_rate(cap_rate: Option<Decimal>) -> CapRateBand {
    match cap_rate {
        None => CapRateBand::Neutral,
        Some(rate) if rate >= TEN_CAP_HURDLE => CapRateBand::MeetsHurdle,
        Some(_) => CapRateBand::BelowHurdle,
    }
}
