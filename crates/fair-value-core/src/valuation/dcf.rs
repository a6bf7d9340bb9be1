use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::comparison::{percentage_difference, DifferenceBasis};
use crate::error::FairValueError;
use crate::guard::{self, DecimalExt};
use crate::input::{fields, InputRecord};
use crate::tables::{cagr_table, margin_of_safety_ladder, BuyPrice, SecondaryTable, MARGIN_OF_SAFETY_STEPS};
use crate::types::{with_metadata, ComputationOutput, ModelId, Money, Multiple, Rate};
use crate::FairValueResult;

use super::{ResultLine, ValuationResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which cash flow the user entered. Only changes labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowBasis {
    FreeCashFlow,
    OperatingCashFlow,
}

impl CashFlowBasis {
    pub fn short_label(&self) -> &'static str {
        match self {
            CashFlowBasis::FreeCashFlow => "FCF",
            CashFlowBasis::OperatingCashFlow => "OCF",
        }
    }
}

/// Explicit projection horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    FiveYears,
    TenYears,
}

impl Horizon {
    pub fn years(&self) -> u32 {
        match self {
            Horizon::FiveYears => 5,
            Horizon::TenYears => 10,
        }
    }

    /// How many years each variable-growth bucket covers.
    fn bucket_spans(&self) -> &'static [usize] {
        match self {
            // Year 1, Years 2-3, Years 4-5
            Horizon::FiveYears => &[1, 2, 2],
            // Year 1, Years 2-4, Years 5-7, Years 8-10
            Horizon::TenYears => &[1, 3, 3, 3],
        }
    }
}

/// Growth assumption for the explicit horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GrowthInput {
    /// One rate for every year.
    Constant { rate: Rate },
    /// One rate per bucket: 4 buckets for ten years, 3 for five.
    Variable { buckets: Vec<Rate> },
}

/// Method for computing terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMethod {
    /// TV = CF_N * (1+g) / (r - g)
    PerpetuityGrowth,
    /// TV = CF_N * multiple
    ExitMultiple,
}

/// Input parameters for a multi-stage cash flow DCF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    pub cash_flow_basis: CashFlowBasis,
    /// Most recent annual cash flow (year 0)
    pub current_cash_flow: Money,
    pub growth: GrowthInput,
    pub horizon: Horizon,
    pub terminal_method: TerminalMethod,
    /// Perpetuity growth rate; required for PerpetuityGrowth and for the
    /// implied future price in either method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_growth_rate: Option<Rate>,
    /// Exit multiple on the final year's cash flow (required for ExitMultiple)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_multiple: Option<Multiple>,
    /// Discount rate (WACC)
    pub discount_rate: Rate,
    /// Shares outstanding today
    pub shares_outstanding: Decimal,
    /// Annual dilution (positive) or buyback (negative) rate
    pub shares_growth_rate: Rate,
    /// Cash minus debt; negative for net debt
    pub net_cash: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

/// Projection for a single year of the DCF model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfYearProjection {
    pub year: u32,
    pub growth_rate: Rate,
    pub cash_flow: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    pub projections: Vec<DcfYearProjection>,
    /// Sum of present values of the explicit-period cash flows
    pub pv_of_cash_flows: Money,
    /// Undiscounted terminal value at the horizon
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    /// PV(cash flows) + PV(TV)
    pub enterprise_value: Money,
    /// Enterprise value + net cash
    pub equity_value: Money,
    /// Share count at the horizon after dilution / buybacks
    pub future_shares_outstanding: Decimal,
    pub intrinsic_value_per_share: Money,
    /// Year-N price target: (TV + compounded net cash) / future shares
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_future_price: Option<Money>,
    /// Terminal value as a fraction of enterprise value
    pub terminal_value_pct: Rate,
    /// (IV - price) / IV, in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
    /// (future price - price) / price, in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_price_difference: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the multi-stage DCF.
pub fn calculate_dcf(input: &DcfInput) -> FairValueResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validate ---
    validate_dcf_input(input)?;

    let n_years = input.horizon.years();
    let one_plus_r = Decimal::ONE.try_add(input.discount_rate, "discount rate")?;

    // --- Project cash flows ---
    let schedule = build_growth_schedule(&input.growth, input.horizon)?;
    let projections = build_projections(input.current_cash_flow, &schedule, one_plus_r)?;

    let mut pv_of_cash_flows = Decimal::ZERO;
    for p in &projections {
        pv_of_cash_flows = pv_of_cash_flows.try_add(p.present_value, "sum of discounted cash flows")?;
    }
    let last = projections
        .last()
        .ok_or_else(|| FairValueError::InvalidDomain("No projection years generated".into()))?;

    // --- Terminal value ---
    let terminal_value = compute_terminal_value(input, last.cash_flow)?;

    // --- Discount TV to present ---
    let horizon_factor = one_plus_r.try_powi(i64::from(n_years), "terminal discount factor")?;
    let pv_of_terminal = terminal_value.try_div(horizon_factor, "terminal discount factor")?;

    // --- Enterprise and equity value ---
    let enterprise_value = pv_of_cash_flows.try_add(pv_of_terminal, "enterprise value")?;
    let equity_value = enterprise_value.try_add(input.net_cash, "equity value")?;

    let tv_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal.try_div(enterprise_value, "terminal value share")?
    };
    if tv_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider a longer explicit forecast",
            tv_pct * dec!(100)
        ));
    }

    // --- Per share ---
    let future_shares = compound(
        input.shares_outstanding,
        input.shares_growth_rate,
        n_years,
        "future shares outstanding",
    )?;
    let intrinsic_value = equity_value.try_div(future_shares, "intrinsic value per share")?;

    let implied_future_price = implied_future_price(input, terminal_value, future_shares, n_years);
    if implied_future_price.is_none() {
        warnings.push(
            "Implied future price unavailable: terminal growth rate is needed to compound net cash"
                .into(),
        );
    }

    let difference = percentage_difference(
        intrinsic_value,
        input.current_price,
        DifferenceBasis::ComputedValue,
    );
    let future_price_difference = implied_future_price.and_then(|fp| {
        percentage_difference(fp, input.current_price, DifferenceBasis::ReferencePrice)
    });

    let output = DcfOutput {
        projections,
        pv_of_cash_flows,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        equity_value,
        future_shares_outstanding: future_shares,
        intrinsic_value_per_share: intrinsic_value,
        implied_future_price,
        terminal_value_pct: tv_pct,
        difference,
        future_price_difference,
    };

    let basis = input.cash_flow_basis.short_label();
    let methodology = match input.terminal_method {
        TerminalMethod::PerpetuityGrowth => {
            format!("Multi-Stage {basis} DCF (perpetuity growth terminal value)")
        }
        TerminalMethod::ExitMultiple => {
            format!("Multi-Stage {basis} DCF (terminal {basis} multiple)")
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(&methodology, input, warnings, elapsed, output))
}

/// Read a DCF input out of the raw record.
pub fn input_from_record(record: &InputRecord) -> FairValueResult<DcfInput> {
    let horizon = if record.toggle(fields::USE_10_YEAR_PROJECTION) {
        Horizon::TenYears
    } else {
        Horizon::FiveYears
    };

    let growth = if record.toggle(fields::USE_CONSTANT_GROWTH) {
        let field = match horizon {
            Horizon::TenYears => fields::CONSTANT_GROWTH_RATE,
            Horizon::FiveYears => fields::CONSTANT_GROWTH_RATE_5YR,
        };
        GrowthInput::Constant {
            rate: guard::required_pct(record, field)?,
        }
    } else {
        let bucket_fields: &[&str] = match horizon {
            Horizon::TenYears => &[
                fields::VARIABLE_GROWTH_RATE_1,
                fields::VARIABLE_GROWTH_RATE_2_4,
                fields::VARIABLE_GROWTH_RATE_5_7,
                fields::VARIABLE_GROWTH_RATE_8_10,
            ],
            Horizon::FiveYears => &[
                fields::VARIABLE_GROWTH_RATE_5YR_1,
                fields::VARIABLE_GROWTH_RATE_5YR_2_3,
                fields::VARIABLE_GROWTH_RATE_5YR_4_5,
            ],
        };
        let buckets = bucket_fields
            .iter()
            .map(|f| guard::required_pct(record, f))
            .collect::<FairValueResult<Vec<Rate>>>()?;
        GrowthInput::Variable { buckets }
    };

    let terminal_method = if record.toggle(fields::USE_TERMINAL_GROWTH_RATE) {
        TerminalMethod::PerpetuityGrowth
    } else {
        TerminalMethod::ExitMultiple
    };

    let terminal_growth_rate = match terminal_method {
        TerminalMethod::PerpetuityGrowth => {
            Some(guard::required_pct(record, fields::TERMINAL_GROWTH_RATE)?)
        }
        TerminalMethod::ExitMultiple => guard::parsed(record, fields::TERMINAL_GROWTH_RATE)
            .and_then(|g| g.try_div(dec!(100), fields::TERMINAL_GROWTH_RATE).ok()),
    };
    let terminal_multiple = match terminal_method {
        TerminalMethod::ExitMultiple => Some(guard::required(record, fields::TERMINAL_MULTIPLE)?),
        TerminalMethod::PerpetuityGrowth => guard::parsed(record, fields::TERMINAL_MULTIPLE),
    };

    let cash_flow_basis = if record.toggle(fields::USE_FCF) {
        CashFlowBasis::FreeCashFlow
    } else {
        CashFlowBasis::OperatingCashFlow
    };

    Ok(DcfInput {
        cash_flow_basis,
        current_cash_flow: guard::required(record, fields::CASH_FLOW)?,
        growth,
        horizon,
        terminal_method,
        terminal_growth_rate,
        terminal_multiple,
        discount_rate: guard::required_pct(record, fields::DISCOUNT_RATE)?,
        shares_outstanding: guard::required(record, fields::SHARES_OUTSTANDING)?,
        shares_growth_rate: guard::required_pct(record, fields::SHARES_GROWTH_RATE)?,
        net_cash: guard::required(record, fields::NET_CASH)?,
        current_price: guard::reference_price(record, fields::CURRENT_PRICE),
    })
}

/// Evaluate a raw DCF record into the interface result.
pub fn evaluate_record(record: &InputRecord) -> FairValueResult<ValuationResult> {
    let input = input_from_record(record)?;
    let output = calculate_dcf(&input)?;
    let out = output.result;
    let iv = out.intrinsic_value_per_share;
    let years = input.horizon.years();

    let mut result = ValuationResult::valued(ModelId::Dcf, iv, out.difference);
    result.warnings = output.warnings;

    result.details.push(ResultLine::new(
        "terminal_value",
        format!(
            "Terminal Value (Year {years} {})",
            input.cash_flow_basis.short_label()
        ),
        out.terminal_value,
        None,
    ));

    if let Some(future_price) = out.implied_future_price {
        result.details.push(ResultLine::new(
            "implied_future_price",
            format!("Implied Future Price (Year {years})"),
            future_price,
            out.future_price_difference,
        ));

        let ladder = margin_of_safety_ladder(iv);
        let mut buy_prices = Vec::with_capacity(MARGIN_OF_SAFETY_STEPS.len() + 2);
        if let Some(price) = input.current_price {
            buy_prices.push(BuyPrice::new("Current Price", price));
        }
        buy_prices.push(BuyPrice::new("Intrinsic Value", iv));
        buy_prices.extend(ladder.iter().map(|row| {
            BuyPrice::new(
                format!("{}% Margin of Safety", row.discount_pct),
                row.target_buy_price,
            )
        }));

        result.secondary.push(SecondaryTable::MarginOfSafetyLadder { rows: ladder });
        result.secondary.push(SecondaryTable::Cagr {
            future_price,
            years,
            rows: cagr_table(&buy_prices, future_price, years),
        });
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_dcf_input(input: &DcfInput) -> FairValueResult<()> {
    if input.shares_outstanding <= Decimal::ZERO {
        return Err(FairValueError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Shares outstanding must be positive".into(),
        });
    }

    match input.terminal_method {
        TerminalMethod::PerpetuityGrowth => {
            let g = input
                .terminal_growth_rate
                .ok_or_else(|| FairValueError::MissingInput {
                    field: "terminal_growth_rate".into(),
                })?;
            // Gordon growth is undefined unless r > g
            if input.discount_rate <= g {
                return Err(FairValueError::InvalidDomain(format!(
                    "Discount rate ({}) must exceed terminal growth rate ({g})",
                    input.discount_rate
                )));
            }
        }
        TerminalMethod::ExitMultiple => {
            if input.terminal_multiple.is_none() {
                return Err(FairValueError::MissingInput {
                    field: "terminal_multiple".into(),
                });
            }
        }
    }

    Ok(())
}

/// Expand the growth assumption into one rate per projected year.
pub fn build_growth_schedule(growth: &GrowthInput, horizon: Horizon) -> FairValueResult<Vec<Rate>> {
    let n = horizon.years() as usize;
    match growth {
        GrowthInput::Constant { rate } => Ok(vec![*rate; n]),
        GrowthInput::Variable { buckets } => {
            let spans = horizon.bucket_spans();
            if buckets.len() != spans.len() {
                return Err(FairValueError::InvalidInput {
                    field: "growth.buckets".into(),
                    reason: format!(
                        "{}-year horizon needs {} growth buckets, got {}",
                        n,
                        spans.len(),
                        buckets.len()
                    ),
                });
            }
            let mut schedule = Vec::with_capacity(n);
            for (rate, span) in buckets.iter().zip(spans) {
                schedule.extend(std::iter::repeat(*rate).take(*span));
            }
            Ok(schedule)
        }
    }
}

fn build_projections(
    base_cash_flow: Money,
    schedule: &[Rate],
    one_plus_r: Decimal,
) -> FairValueResult<Vec<DcfYearProjection>> {
    let mut projections = Vec::with_capacity(schedule.len());
    let mut prev_cash_flow = base_cash_flow;

    for (idx, growth) in schedule.iter().enumerate() {
        let year = idx as u32 + 1;
        let cash_flow = prev_cash_flow
            .try_mul(Decimal::ONE.try_add(*growth, "growth rate")?, "projected cash flow")?;
        let factor = one_plus_r.try_powi(i64::from(year), "discount factor")?;
        let present_value = cash_flow.try_div(factor, "discount factor")?;

        projections.push(DcfYearProjection {
            year,
            growth_rate: *growth,
            cash_flow,
            discount_factor: Decimal::ONE.try_div(factor, "discount factor")?,
            present_value,
        });

        prev_cash_flow = cash_flow;
    }

    Ok(projections)
}

fn compute_terminal_value(input: &DcfInput, last_cash_flow: Money) -> FairValueResult<Money> {
    match input.terminal_method {
        TerminalMethod::PerpetuityGrowth => {
            let g = input
                .terminal_growth_rate
                .ok_or_else(|| FairValueError::MissingInput {
                    field: "terminal_growth_rate".into(),
                })?;
            let denom = input.discount_rate.try_sub(g, "terminal value")?;
            if denom <= Decimal::ZERO {
                return Err(FairValueError::InvalidDomain(
                    "Discount rate must exceed terminal growth rate".into(),
                ));
            }
            last_cash_flow
                .try_mul(Decimal::ONE.try_add(g, "terminal value")?, "terminal value")?
                .try_div(denom, "terminal value")
        }
        TerminalMethod::ExitMultiple => {
            let multiple = input
                .terminal_multiple
                .ok_or_else(|| FairValueError::MissingInput {
                    field: "terminal_multiple".into(),
                })?;
            last_cash_flow.try_mul(multiple, "terminal value")
        }
    }
}

/// `amount * (1 + rate)^years`
fn compound(amount: Decimal, rate: Rate, years: u32, context: &str) -> FairValueResult<Decimal> {
    let growth = Decimal::ONE
        .try_add(rate, context)?
        .try_powi(i64::from(years), context)?;
    amount.try_mul(growth, context)
}

fn implied_future_price(
    input: &DcfInput,
    terminal_value: Money,
    future_shares: Decimal,
    years: u32,
) -> Option<Money> {
    let g = input.terminal_growth_rate?;
    let future_net_cash = compound(input.net_cash, g, years, "future net cash").ok()?;
    terminal_value
        .try_add(future_net_cash, "future equity value")
        .and_then(|equity| equity.try_div(future_shares, "implied future price"))
        .ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
