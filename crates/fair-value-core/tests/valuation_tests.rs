use fair_value_core::comparison::ValuationBand;
use fair_value_core::input::fields;
use fair_value_core::tables::SecondaryTable;
use fair_value_core::valuation::{dcf, rule_one};
use fair_value_core::{evaluate, InputRecord, ModelId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn record(model: ModelId, values: &[(&str, &str)]) -> InputRecord {
    let mut record = InputRecord::defaults(model);
    for (field, value) in values {
        record.set(model, field, value);
    }
    record
}

fn dcf_constant_record() -> InputRecord {
    record(
        ModelId::Dcf,
        &[
            (fields::CASH_FLOW, "100"),
            (fields::CONSTANT_GROWTH_RATE, "5"),
            (fields::DISCOUNT_RATE, "10"),
            (fields::TERMINAL_GROWTH_RATE, "2.5"),
            (fields::SHARES_OUTSTANDING, "10"),
            (fields::SHARES_GROWTH_RATE, "0"),
            (fields::NET_CASH, "0"),
        ],
    )
}

// ===========================================================================
// DCF tests
// ===========================================================================

#[test]
fn test_dcf_constant_growth_known_answer() {
    let result = evaluate(ModelId::Dcf, &dcf_constant_record());
    let iv = result.primary_value.unwrap();
    // Exact value 163.9459778802...
    assert_eq!(iv.round_dp(2), dec!(163.95));
    assert!((iv - dec!(163.9459778802)).abs() < dec!(0.0000001), "got {iv}");

    let future = result.detail("implied_future_price").unwrap();
    assert_eq!(future.value.round_dp(2), dec!(222.62));
    assert_eq!(future.label, "Implied Future Price (Year 10)");
}

#[test]
fn test_dcf_terminal_value_share_warning() {
    let golden = evaluate(ModelId::Dcf, &dcf_constant_record());
    assert!(golden.warnings.is_empty(), "{:?}", golden.warnings);

    let mut heavy = dcf_constant_record();
    heavy.set(ModelId::Dcf, fields::DISCOUNT_RATE, "8");
    heavy.set(ModelId::Dcf, fields::TERMINAL_GROWTH_RATE, "6");
    let result = evaluate(ModelId::Dcf, &heavy);
    assert!(result.primary_value.is_some());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Terminal value represents")));
}

#[test]
fn test_dcf_terminal_value_label_follows_cash_flow_basis() {
    let fcf = evaluate(ModelId::Dcf, &dcf_constant_record());
    assert_eq!(
        fcf.detail("terminal_value").unwrap().label,
        "Terminal Value (Year 10 FCF)"
    );

    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::USE_FCF, "false");
    let ocf = evaluate(ModelId::Dcf, &record);
    assert_eq!(
        ocf.detail("terminal_value").unwrap().label,
        "Terminal Value (Year 10 OCF)"
    );
    assert_eq!(ocf.primary_value, fcf.primary_value);
}

#[test]
fn test_dcf_perpetuity_needs_discount_above_terminal_growth() {
    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::DISCOUNT_RATE, "10");
    record.set(ModelId::Dcf, fields::TERMINAL_GROWTH_RATE, "10");
    assert_eq!(evaluate(ModelId::Dcf, &record).primary_value, None);

    record.set(ModelId::Dcf, fields::TERMINAL_GROWTH_RATE, "12");
    assert_eq!(evaluate(ModelId::Dcf, &record).primary_value, None);
}

#[test]
fn test_dcf_five_year_variable_exit_multiple() {
    let record = record(
        ModelId::Dcf,
        &[
            (fields::USE_CONSTANT_GROWTH, "false"),
            (fields::USE_10_YEAR_PROJECTION, "false"),
            (fields::USE_TERMINAL_GROWTH_RATE, "false"),
            (fields::CASH_FLOW, "100"),
            (fields::VARIABLE_GROWTH_RATE_5YR_1, "10"),
            (fields::VARIABLE_GROWTH_RATE_5YR_2_3, "8"),
            (fields::VARIABLE_GROWTH_RATE_5YR_4_5, "6"),
            (fields::TERMINAL_MULTIPLE, "12"),
            (fields::SHARES_OUTSTANDING, "10"),
            (fields::NET_CASH, "0"),
        ],
    );
    let input = dcf::input_from_record(&record).unwrap();
    let out = dcf::calculate_dcf(&input).unwrap().result;

    let growth: Vec<Decimal> = out.projections.iter().map(|p| p.growth_rate).collect();
    assert_eq!(
        growth,
        vec![dec!(0.1), dec!(0.08), dec!(0.08), dec!(0.06), dec!(0.06)]
    );
    assert_eq!(out.projections[4].cash_flow.round_dp(7), dec!(144.1623744));
    assert!(
        (out.enterprise_value - dec!(1551.1452714978)).abs() < dec!(0.000001),
        "got {}",
        out.enterprise_value
    );
    assert!((out.intrinsic_value_per_share - dec!(155.11452714978)).abs() < dec!(0.0000001));
}

#[test]
fn test_dcf_exit_multiple_future_price_follows_terminal_growth_field() {
    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::USE_TERMINAL_GROWTH_RATE, "false");
    record.set(ModelId::Dcf, fields::TERMINAL_MULTIPLE, "15");

    // Default terminal growth 2.5 is still there, so the future price exists
    let result = evaluate(ModelId::Dcf, &record);
    assert!(result.primary_value.is_some());
    assert!(result.detail("implied_future_price").is_some());
    assert_eq!(result.secondary.len(), 2);

    record.set(ModelId::Dcf, fields::TERMINAL_GROWTH_RATE, "");
    let result = evaluate(ModelId::Dcf, &record);
    assert!(result.primary_value.is_some());
    assert!(result.detail("implied_future_price").is_none());
    assert!(result.secondary.is_empty());
}

#[test]
fn test_dcf_secondary_tables() {
    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::CURRENT_PRICE, "100");
    let result = evaluate(ModelId::Dcf, &record);
    let iv = result.primary_value.unwrap();

    match &result.secondary[0] {
        SecondaryTable::MarginOfSafetyLadder { rows } => {
            assert_eq!(rows.len(), 5);
            assert_eq!(rows[0].target_buy_price, iv * dec!(0.9));
            assert_eq!(rows[4].target_buy_price, iv * dec!(0.5));
        }
        other => panic!("expected ladder first, got {other:?}"),
    }
    match &result.secondary[1] {
        SecondaryTable::Cagr { years, rows, .. } => {
            assert_eq!(*years, 10);
            let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
            assert_eq!(labels[0], "Current Price");
            assert_eq!(labels[1], "Intrinsic Value");
            assert_eq!(labels.len(), 7);
            assert!(rows.iter().all(|r| r.cagr_pct.is_some()));
        }
        other => panic!("expected cagr second, got {other:?}"),
    }
}

#[test]
fn test_dcf_cagr_table_skips_current_price_without_one() {
    let result = evaluate(ModelId::Dcf, &dcf_constant_record());
    match &result.secondary[1] {
        SecondaryTable::Cagr { rows, .. } => {
            assert_eq!(rows.len(), 6);
            assert_eq!(rows[0].label, "Intrinsic Value");
        }
        other => panic!("expected cagr table, got {other:?}"),
    }
}

#[test]
fn test_dcf_comparison_band() {
    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::CURRENT_PRICE, "100");
    let result = evaluate(ModelId::Dcf, &record);
    assert_eq!(result.band, ValuationBand::Undervalued);

    record.set(ModelId::Dcf, fields::CURRENT_PRICE, "400");
    let result = evaluate(ModelId::Dcf, &record);
    assert_eq!(result.band, ValuationBand::FarBelowFairValue);
}

#[test]
fn test_dcf_malformed_number_gives_none() {
    let mut record = dcf_constant_record();
    record.set(ModelId::Dcf, fields::CASH_FLOW, "1,000");
    assert_eq!(evaluate(ModelId::Dcf, &record).primary_value, None);
}

// ===========================================================================
// Other models
// ===========================================================================

#[test]
fn test_graham_zero_current_yield_gives_none() {
    let record = record(
        ModelId::BenGraham,
        &[
            (fields::EPS, "5"),
            (fields::EPS_GROWTH_RATE, "10"),
            (fields::CURRENT_YIELD, "0"),
        ],
    );
    assert_eq!(evaluate(ModelId::BenGraham, &record).primary_value, None);
}

#[test]
fn test_graham_uses_default_average_yield() {
    let record = record(
        ModelId::BenGraham,
        &[
            (fields::EPS, "5"),
            (fields::EPS_GROWTH_RATE, "10"),
            (fields::CURRENT_YIELD, "4.4"),
        ],
    );
    assert_eq!(
        evaluate(ModelId::BenGraham, &record).primary_value,
        Some(dec!(142.5))
    );
}

#[test]
fn test_lynch_comparison_against_price() {
    let record = record(
        ModelId::PeterLynch,
        &[
            (fields::EPS, "2"),
            (fields::EPS_GROWTH_RATE, "15"),
            (fields::CURRENT_PRICE, "40"),
        ],
    );
    let result = evaluate(ModelId::PeterLynch, &record);
    assert_eq!(result.primary_value, Some(dec!(30)));
    // (30 - 40) / 40 = -25%
    assert_eq!(result.comparison, Some(dec!(-25)));
    assert_eq!(result.band, ValuationBand::ModeratelyBelow);
}

#[test]
fn test_rule_one_margin_of_safety_is_half_sticker() {
    let record = record(
        ModelId::RuleOne,
        &[
            (fields::EPS, "1"),
            (fields::EPS_GROWTH_RATE, "10"),
            (fields::FUTURE_PE, "15"),
        ],
    );
    let result = evaluate(ModelId::RuleOne, &record);
    let sticker = result.primary_value.unwrap();
    assert!((sticker - dec!(9.617)).abs() < dec!(0.001), "got {sticker}");
    let mos = result.detail("margin_of_safety_price").unwrap().value;
    assert_eq!(mos, sticker * dec!(0.5));
}

#[test]
fn test_rule_one_fractional_years_truncate() {
    let input = rule_one::input_from_record(&record(
        ModelId::RuleOne,
        &[
            (fields::EPS, "1"),
            (fields::EPS_GROWTH_RATE, "10"),
            (fields::FUTURE_PE, "15"),
            (fields::YEARS, "10.9"),
        ],
    ))
    .unwrap();
    assert_eq!(input.years, 10);
}

#[test]
fn test_ten_cap_indirect_blank_parts() {
    let record = record(
        ModelId::TenCap,
        &[
            (fields::NET_INCOME, "100"),
            (fields::DEPRECIATION, "20"),
            (fields::WORKING_CAPITAL, "-10"),
            (fields::TOTAL_CAPEX, "50"),
            (fields::MARKET_CAP, "1000"),
        ],
    );
    let result = evaluate(ModelId::TenCap, &record);
    assert_eq!(result.primary_value, Some(dec!(110)));
    assert_eq!(result.detail("cap_rate").unwrap().value, dec!(11));
    assert_eq!(result.comparison, None);
}

#[test]
fn test_price_to_fcf_requires_shares() {
    let mut record = record(
        ModelId::PriceToFcf,
        &[
            (fields::FCF, "1000"),
            (fields::FCF_MULTIPLE, "15"),
            (fields::SHARES_OUTSTANDING, "0"),
        ],
    );
    assert_eq!(evaluate(ModelId::PriceToFcf, &record).primary_value, None);

    record.set(ModelId::PriceToFcf, fields::SHARES_OUTSTANDING, "100");
    assert_eq!(
        evaluate(ModelId::PriceToFcf, &record).primary_value,
        Some(dec!(150))
    );
}

#[test]
fn test_margin_of_safety_never_evaluates_locally() {
    let mut record = InputRecord::defaults(ModelId::MarginOfSafety);
    for spec in fair_value_core::input::schema(ModelId::MarginOfSafety) {
        record.set(ModelId::MarginOfSafety, spec.name, "1");
    }
    assert_eq!(evaluate(ModelId::MarginOfSafety, &record).primary_value, None);
}
