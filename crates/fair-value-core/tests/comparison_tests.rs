use fair_value_core::comparison::{classify_difference, BandColor, ValuationBand};
use fair_value_core::guard::{parse_decimal, sanitize_numeric_input};
use fair_value_core::tables::{margin_of_safety_ladder, required_cagr};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_classification_partitions_the_line() {
    let mut value = dec!(-100);
    let mut last = ValuationBand::FarBelowFairValue;
    // Bands only move upward as the difference grows
    while value <= dec!(100) {
        let band = classify_difference(Some(value));
        assert_ne!(band, ValuationBand::Neutral);
        assert!(band >= last, "band went backwards at {value}");
        last = band;
        value += dec!(0.5);
    }
    assert_eq!(last, ValuationBand::Undervalued);
}

#[test]
fn test_band_edges_and_colors() {
    let cases = [
        (dec!(-31), ValuationBand::FarBelowFairValue, BandColor::Red),
        (dec!(-30), ValuationBand::ModeratelyBelow, BandColor::Amber),
        (dec!(-10), ValuationBand::NearFairValue, BandColor::LightGreen),
        (Decimal::ZERO, ValuationBand::NearFairValue, BandColor::LightGreen),
        (dec!(1), ValuationBand::Undervalued, BandColor::StrongGreen),
    ];
    for (difference, band, color) in cases {
        let got = classify_difference(Some(difference));
        assert_eq!(got, band, "at {difference}");
        assert_eq!(got.color(), color);
    }
}

#[test]
fn test_cagr_doubling() {
    let cagr = required_cagr(dec!(50), dec!(100), 10).unwrap();
    assert!((cagr - dec!(7.17734625)).abs() < dec!(0.0001), "got {cagr}");
}

#[test]
fn test_ladder_of_negative_value_still_scales() {
    let rows = margin_of_safety_ladder(dec!(-100));
    assert_eq!(rows[0].target_buy_price, dec!(-90));
}

#[test]
fn test_widget_sanitize_then_parse() {
    let cleaned = sanitize_numeric_input("1,234,567.89").unwrap();
    assert_eq!(parse_decimal(&cleaned), Some(dec!(1234567.89)));
    assert_eq!(sanitize_numeric_input("$12"), None);
}
