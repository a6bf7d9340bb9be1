use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{classify_cap_rate, CapRateBand};
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money, Rate};
use crate::FairValueResult;

use super::{ResultLine, ValuationResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How maintenance capital expenditure is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MaintenanceCapex {
    /// Entered directly.
    Direct { amount: Money },
    /// Share of total capex. Either part may be missing, in which case
    /// maintenance capex counts as zero.
    ShareOfTotal {
        total_capex: Option<Money>,
        /// Fraction of total capex spent on maintenance
        maintenance_share: Option<Rate>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenCapInput {
    pub net_income: Money,
    pub depreciation: Money,
    pub working_capital_change: Money,
    pub maintenance_capex: MaintenanceCapex,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenCapOutput {
    pub maintenance_capex: Money,
    /// Net income + D&A + working capital change - maintenance capex
    pub owner_earnings: Money,
    /// Owner earnings / market cap, in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_rate: Option<Decimal>,
    pub cap_rate_band: CapRateBand,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn calculate_ten_cap(input: &TenCapInput) -> FairValueResult<ComputationOutput<TenCapOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let maintenance_capex = match &input.maintenance_capex {
        MaintenanceCapex::Direct { amount } => *amount,
        MaintenanceCapex::ShareOfTotal {
            total_capex: Some(total),
            maintenance_share: Some(share),
        } => total.try_mul(*share, "maintenance capex")?,
        MaintenanceCapex::ShareOfTotal { .. } => {
            warnings.push(
                "Total capex or maintenance share missing; maintenance capex taken as zero".into(),
            );
            Decimal::ZERO
        }
    };

    let owner_earnings = input
        .net_income
        .try_add(input.depreciation, "owner earnings")?
        .try_add(input.working_capital_change, "owner earnings")?
        .try_sub(maintenance_capex, "owner earnings")?;

    let cap_rate = match input.market_cap.filter(|m| *m > Decimal::ZERO) {
        Some(market_cap) => Some(
            owner_earnings
                .try_div(market_cap, "cap rate")?
                .try_mul(dec!(100), "cap rate")?,
        ),
        None => {
            warnings.push("No positive market cap; cap rate not computed".into());
            None
        }
    };

    let output = TenCapOutput {
        maintenance_capex,
        owner_earnings,
        cap_rate,
        cap_rate_band: classify_cap_rate(cap_rate),
    };
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Ten Cap owner earnings yield",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub fn input_from_record(record: &InputRecord) -> FairValueResult<TenCapInput> {
    let maintenance_capex = if record.toggle(fields::USE_DIRECT_MAINT_CAPEX) {
        MaintenanceCapex::Direct {
            amount: guard::required(record, fields::MAINT_CAPEX_DIRECT)?,
        }
    } else {
        MaintenanceCapex::ShareOfTotal {
            total_capex: guard::parsed(record, fields::TOTAL_CAPEX),
            maintenance_share: guard::parsed(record, fields::MAINT_CAPEX_PERCENTAGE)
                .and_then(|pct| pct.try_div(dec!(100), fields::MAINT_CAPEX_PERCENTAGE).ok()),
        }
    };

    Ok(TenCapInput {
        net_income: guard::required(record, fields::NET_INCOME)?,
        depreciation: guard::required(record, fields::DEPRECIATION)?,
        working_capital_change: guard::required(record, fields::WORKING_CAPITAL)?,
        maintenance_capex,
        market_cap: guard::parsed(record, fields::MARKET_CAP),
    })
}

pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let output = calculate_ten_cap(&input_from_record(record)?)?;
    let out = output.result;
    let mut result = ValuationResult::valued(ModelId::TenCap, out.owner_earnings, None);
    if let Some(cap_rate) = out.cap_rate {
        result.details.push(
            ResultLine::new("cap_rate", "Cap Rate (%)", cap_rate, None)
                .with_color(out.cap_rate_band.color()),
        );
    }
    result.warnings = output.warnings;
    Ok(result)
}
