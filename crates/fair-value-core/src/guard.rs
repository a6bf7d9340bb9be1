//! Numeric parsing and domain guards shared by every evaluator.
//!
//! Raw field values are text. A value parses only if it is a plain decimal
//! literal: optional leading minus, digits, at most one decimal point and at
//! least one digit. Anything else (thousand separators, exponents, trailing
//! garbage, out-of-range magnitudes) is rejected rather than guessed at.

use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FairValueError;
use crate::input::InputRecord;
use crate::FairValueResult;

/// Parse a raw field value with the strict decimal grammar.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let text = raw.trim();
    if !is_decimal_literal(text) {
        return None;
    }
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let body = body.strip_suffix('.').unwrap_or(body);
    let normalized = if body.starts_with('.') {
        format!("{sign}0{body}")
    } else {
        format!("{sign}{body}")
    };
    Decimal::from_str(&normalized).ok()
}

fn is_decimal_literal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let mut digits = 0usize;
    let mut points = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

/// Clean a value typed into a numeric widget: drop thousand separators and
/// accept partial entries (`""`, `"-"`, `"12."`). Returns `None` when the
/// keystroke should be refused.
pub fn sanitize_numeric_input(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let body = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    let mut points = 0usize;
    for c in body.chars() {
        match c {
            '0'..='9' => {}
            '.' => points += 1,
            _ => return None,
        }
    }
    if points > 1 {
        return None;
    }
    Some(cleaned)
}

/// A present, parseable value, or `None` for blank and malformed text alike.
pub fn parsed(record: &InputRecord, field: &str) -> Option<Decimal> {
    parse_decimal(record.text(field))
}

/// A required numeric field.
pub fn required(record: &InputRecord, field: &str) -> FairValueResult<Decimal> {
    let raw = record.text(field);
    if raw.trim().is_empty() {
        return Err(FairValueError::MissingInput {
            field: field.to_string(),
        });
    }
    parse_decimal(raw).ok_or_else(|| FairValueError::InvalidInput {
        field: field.to_string(),
        reason: format!("'{raw}' is not a decimal number"),
    })
}

/// A required field entered as a percentage, returned as a fraction.
pub fn required_pct(record: &InputRecord, field: &str) -> FairValueResult<Decimal> {
    required(record, field)?.try_div(dec!(100), field)
}

/// A reference price is usable only when it parses and is strictly positive.
pub fn reference_price(record: &InputRecord, field: &str) -> Option<Decimal> {
    parsed(record, field).filter(|p| *p > Decimal::ZERO)
}

pub fn require_positive(field: &str, value: Decimal) -> FairValueResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(FairValueError::InvalidInput {
            field: field.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

/// Checked decimal arithmetic. Every formula goes through these so that an
/// absurd input overflows into an error instead of a panic.
pub trait DecimalExt: Sized {
    fn try_add(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal>;
    fn try_sub(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal>;
    fn try_mul(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal>;
    fn try_div(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal>;
    fn try_powi(self, exp: i64, context: &str) -> FairValueResult<Decimal>;
    fn try_powd(self, exp: Decimal, context: &str) -> FairValueResult<Decimal>;
}

fn overflow(context: &str) -> FairValueError {
    FairValueError::NumericOverflow {
        context: context.to_string(),
    }
}

impl DecimalExt for Decimal {
    fn try_add(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal> {
        self.checked_add(rhs).ok_or_else(|| overflow(context))
    }

    fn try_sub(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal> {
        self.checked_sub(rhs).ok_or_else(|| overflow(context))
    }

    fn try_mul(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal> {
        self.checked_mul(rhs).ok_or_else(|| overflow(context))
    }

    fn try_div(self, rhs: Decimal, context: &str) -> FairValueResult<Decimal> {
        if rhs.is_zero() {
            return Err(FairValueError::DivisionByZero {
                context: context.to_string(),
            });
        }
        self.checked_div(rhs).ok_or_else(|| overflow(context))
    }

    fn try_powi(self, exp: i64, context: &str) -> FairValueResult<Decimal> {
        if self.is_zero() && exp < 0 {
            return Err(FairValueError::DivisionByZero {
                context: context.to_string(),
            });
        }
        self.checked_powi(exp).ok_or_else(|| overflow(context))
    }

    fn try_powd(self, exp: Decimal, context: &str) -> FairValueResult<Decimal> {
        self.checked_powd(exp).ok_or_else(|| overflow(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_literals() {
        assert_eq!(parse_decimal("123.45"), Some(dec!(123.45)));
        assert_eq!(parse_decimal("-7"), Some(dec!(-7)));
        assert_eq!(parse_decimal(" 42 "), Some(dec!(42)));
        assert_eq!(parse_decimal(".5"), Some(dec!(0.5)));
        assert_eq!(parse_decimal("-.5"), Some(dec!(-0.5)));
        assert_eq!(parse_decimal("12."), Some(dec!(12)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "   ", "-", ".", "1,000", "1e5", "12abc", "--1", "1.2.3", "+5", "NaN"] {
            assert_eq!(parse_decimal(raw), None, "'{raw}' should not parse");
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_magnitude() {
        assert_eq!(parse_decimal("123456789012345678901234567890123"), None);
    }

    #[test]
    fn test_sanitize_strips_separators() {
        assert_eq!(sanitize_numeric_input("1,234.5").as_deref(), Some("1234.5"));
        assert_eq!(sanitize_numeric_input("-").as_deref(), Some("-"));
        assert_eq!(sanitize_numeric_input("").as_deref(), Some(""));
        assert_eq!(sanitize_numeric_input("12a"), None);
        assert_eq!(sanitize_numeric_input("1.2.3"), None);
    }

    #[test]
    fn test_checked_division_by_zero() {
        let err = dec!(1).try_div(Decimal::ZERO, "test").unwrap_err();
        assert!(matches!(err, FairValueError::DivisionByZero { .. }));
    }

    #[test]
    fn test_checked_overflow() {
        let err = Decimal::MAX.try_mul(dec!(2), "test").unwrap_err();
        assert!(matches!(err, FairValueError::NumericOverflow { .. }));
        let err = dec!(1000).try_powi(20, "test").unwrap_err();
        assert!(matches!(err, FairValueError::NumericOverflow { .. }));
    }

    #[test]
    fn test_negative_power_of_zero() {
        assert!(Decimal::ZERO.try_powi(-3, "test").is_err());
        assert_eq!(dec!(2).try_powi(-2, "test").unwrap(), dec!(0.25));
    }
}
