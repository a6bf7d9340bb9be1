pub mod ben_graham;
pub mod dcf;
pub mod margin_of_safety;
pub mod peter_lynch;
pub mod price_to_fcf;
pub mod rule_one;
pub mod ten_cap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::comparison::{classify_difference, BandColor, ValuationBand};
use crate::tables::SecondaryTable;
use crate::types::{ModelId, Money};

/// An additional named output of a model, e.g. the DCF implied future price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLine {
    pub key: String,
    pub label: String,
    pub value: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Decimal>,
    /// Set for lines with their own colour scale, e.g. the Ten Cap hurdle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<BandColor>,
}

impl ResultLine {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        value: Money,
        comparison: Option<Decimal>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value,
            comparison,
            color: None,
        }
    }

    pub fn with_color(mut self, color: BandColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// What a model evaluation hands back to the interface.
///
/// `primary_value` is `None` exactly when the inputs are missing or invalid;
/// the interface shows one generic "enter all required inputs" message then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub model: ModelId,
    pub primary_value: Option<Money>,
    pub comparison: Option<Decimal>,
    pub band: ValuationBand,
    pub details: Vec<ResultLine>,
    pub secondary: Vec<SecondaryTable>,
    pub warnings: Vec<String>,
}

impl ValuationResult {
    pub fn empty(model: ModelId) -> Self {
        Self {
            model,
            primary_value: None,
            comparison: None,
            band: ValuationBand::Neutral,
            details: Vec::new(),
            secondary: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn valued(model: ModelId, value: Money, comparison: Option<Decimal>) -> Self {
        Self {
            primary_value: Some(value),
            comparison,
            band: classify_difference(comparison),
            ..Self::empty(model)
        }
    }

    pub fn detail(&self, key: &str) -> Option<&ResultLine> {
        self.details.iter().find(|line| line.key == key)
    }
}
