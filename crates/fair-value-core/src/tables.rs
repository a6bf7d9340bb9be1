use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::guard::DecimalExt;
use crate::types::Money;

/// Discounts applied to a fair value to get conservative buy prices, in percent.
pub const MARGIN_OF_SAFETY_STEPS: [u32; 5] = [10, 20, 30, 40, 50];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRow {
    pub discount_pct: u32,
    pub target_buy_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyPrice {
    pub label: String,
    pub price: Money,
}

impl BuyPrice {
    pub fn new(label: impl Into<String>, price: Money) -> Self {
        Self {
            label: label.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CagrRow {
    pub label: String,
    pub buy_price: Money,
    /// Required annual growth in percent; `None` when not applicable.
    pub cagr_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecondaryTable {
    MarginOfSafetyLadder {
        rows: Vec<LadderRow>,
    },
    Cagr {
        future_price: Money,
        years: u32,
        rows: Vec<CagrRow>,
    },
}

/// Target buy prices at each standard margin of safety.
pub fn margin_of_safety_ladder(value: Money) -> Vec<LadderRow> {
    MARGIN_OF_SAFETY_STEPS
        .iter()
        .map(|&pct| LadderRow {
            discount_pct: pct,
            target_buy_price: discounted(value, pct),
        })
        .collect()
}

/// `value * (1 - pct/100)`. Saturates rather than failing: a ladder of an
/// already valid value cannot overflow since every step shrinks it.
pub(crate) fn discounted(value: Money, pct: u32) -> Money {
    let keep = Decimal::ONE - Decimal::from(pct) / dec!(100);
    value.checked_mul(keep).unwrap_or(value)
}

/// Compound annual growth rate needed to go from `buy_price` to
/// `future_price` in `years`, in percent.
pub fn required_cagr(buy_price: Money, future_price: Money, years: u32) -> Option<Decimal> {
    if buy_price <= Decimal::ZERO || future_price <= Decimal::ZERO || years == 0 {
        return None;
    }
    let ratio = future_price.try_div(buy_price, "cagr").ok()?;
    let exponent = Decimal::ONE.try_div(Decimal::from(years), "cagr").ok()?;
    let growth = ratio.try_powd(exponent, "cagr").ok()?;
    (growth - Decimal::ONE).try_mul(dec!(100), "cagr").ok()
}

pub fn cagr_table(buy_prices: &[BuyPrice], future_price: Money, years: u32) -> Vec<CagrRow> {
    buy_prices
        .iter()
        .map(|bp| CagrRow {
            label: bp.label.clone(),
            buy_price: bp.price,
            cagr_pct: required_cagr(bp.price, future_price, years),
        })
        .collect()
}
