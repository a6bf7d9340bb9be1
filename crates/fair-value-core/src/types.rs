use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FairValueError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless a field name says `pct`.
pub type Rate = Decimal;

/// Multiples (e.g., 15x P/E)
pub type Multiple = Decimal;

/// The closed set of valuation models the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    Dcf,
    PeterLynch,
    BenGraham,
    RuleOne,
    TenCap,
    PriceToFcf,
    MarginOfSafety,
}

impl ModelId {
    /// Registry order, as presented to the user.
    pub const ALL: [ModelId; 7] = [
        ModelId::Dcf,
        ModelId::PriceToFcf,
        ModelId::RuleOne,
        ModelId::PeterLynch,
        ModelId::BenGraham,
        ModelId::TenCap,
        ModelId::MarginOfSafety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Dcf => "dcf",
            ModelId::PeterLynch => "peter_lynch",
            ModelId::BenGraham => "ben_graham",
            ModelId::RuleOne => "rule_one",
            ModelId::TenCap => "ten_cap",
            ModelId::PriceToFcf => "price_to_fcf",
            ModelId::MarginOfSafety => "margin_of_safety",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::Dcf => "Discounted Cash Flow (DCF)",
            ModelId::PeterLynch => "Peter Lynch",
            ModelId::BenGraham => "Ben Graham",
            ModelId::RuleOne => "Rule #1",
            ModelId::TenCap => "Ten Cap",
            ModelId::PriceToFcf => "Price to FCF",
            ModelId::MarginOfSafety => "Margin of Safety Model",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = FairValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| FairValueError::UnknownModel(s.to_string()))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_round_trips_through_str() {
        for model in ModelId::ALL {
            assert_eq!(model.as_str().parse::<ModelId>().unwrap(), model);
        }
    }

    #[test]
    fn test_model_id_accepts_kebab_case() {
        assert_eq!("price-to-fcf".parse::<ModelId>().unwrap(), ModelId::PriceToFcf);
        assert_eq!(" Rule_One ".parse::<ModelId>().unwrap(), ModelId::RuleOne);
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = "graham_dodd".parse::<ModelId>().unwrap_err();
        assert!(matches!(err, FairValueError::UnknownModel(_)));
    }

    #[test]
    fn test_model_id_serializes_snake_case() {
        let json = serde_json::to_string(&ModelId::MarginOfSafety).unwrap();
        assert_eq!(json, "\"margin_of_safety\"");
    }
}
