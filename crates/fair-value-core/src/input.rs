//! Per-model input schema, input records and the full input state.
//!
//! Field values are kept as the raw text the user typed (empty = unset);
//! only toggles are stored typed. Parsing happens at evaluation time.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::ModelId;

/// Field names as used by the input widgets.
pub mod fields {
    pub const CURRENT_PRICE: &str = "currentPrice";
    pub const EPS: &str = "eps";
    pub const EPS_GROWTH_RATE: &str = "epsGrowthRate";
    pub const SHARES_OUTSTANDING: &str = "sharesOutstanding";
    pub const NET_CASH: &str = "netCash";
    pub const MARKET_CAP: &str = "marketCap";
    pub const FCF: &str = "fcf";

    // DCF
    pub const USE_FCF: &str = "useFcf";
    pub const CASH_FLOW: &str = "cashFlow";
    pub const USE_CONSTANT_GROWTH: &str = "useConstantGrowth";
    pub const USE_10_YEAR_PROJECTION: &str = "use10YearProjection";
    pub const CONSTANT_GROWTH_RATE: &str = "constantGrowthRate";
    pub const CONSTANT_GROWTH_RATE_5YR: &str = "constantGrowthRate5yr";
    pub const VARIABLE_GROWTH_RATE_1: &str = "variableGrowthRate1";
    pub const VARIABLE_GROWTH_RATE_2_4: &str = "variableGrowthRate2_4";
    pub const VARIABLE_GROWTH_RATE_5_7: &str = "variableGrowthRate5_7";
    pub const VARIABLE_GROWTH_RATE_8_10: &str = "variableGrowthRate8_10";
    pub const VARIABLE_GROWTH_RATE_5YR_1: &str = "variableGrowthRate5yr_1";
    pub const VARIABLE_GROWTH_RATE_5YR_2_3: &str = "variableGrowthRate5yr_2_3";
    pub const VARIABLE_GROWTH_RATE_5YR_4_5: &str = "variableGrowthRate5yr_4_5";
    pub const USE_TERMINAL_GROWTH_RATE: &str = "useTerminalGrowthRate";
    pub const TERMINAL_GROWTH_RATE: &str = "terminalGrowthRate";
    pub const TERMINAL_MULTIPLE: &str = "terminalMultiple";
    pub const DISCOUNT_RATE: &str = "discountRate";
    pub const SHARES_GROWTH_RATE: &str = "sharesGrowthRate";

    // Ben Graham
    pub const AVG_YIELD: &str = "avgYield";
    pub const CURRENT_YIELD: &str = "currentYield";

    // Peter Lynch
    pub const PEG_RATIO: &str = "pegRatio";

    // Rule One
    pub const FUTURE_PE: &str = "futurePe";
    pub const MIN_RATE_OF_RETURN: &str = "minRateOfReturn";
    pub const YEARS: &str = "years";

    // Ten Cap
    pub const NET_INCOME: &str = "netIncome";
    pub const DEPRECIATION: &str = "depreciation";
    pub const WORKING_CAPITAL: &str = "workingCapital";
    pub const USE_DIRECT_MAINT_CAPEX: &str = "useDirectMaintCapEx";
    pub const MAINT_CAPEX_DIRECT: &str = "maintCapExDirect";
    pub const TOTAL_CAPEX: &str = "totalCapEx";
    pub const MAINT_CAPEX_PERCENTAGE: &str = "maintCapExPercentage";

    // Price to FCF
    pub const FCF_CHANGE: &str = "fcfChange";
    pub const FCF_MULTIPLE: &str = "fcfMultiple";

    // Margin of Safety
    pub const PE_RATIO: &str = "peRatio";
    pub const PS_RATIO: &str = "psRatio";
    pub const REVENUE_CAGR: &str = "revenueCagr";
    pub const TOTAL_ASSETS: &str = "totalAssets";
    pub const TOTAL_DEBT: &str = "totalDebt";
    pub const LONG_TERM_DEBT: &str = "longTermDebt";
    pub const CAPEX: &str = "capEx";
}

use fields::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Toggle,
}

/// Static declaration of one input field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Text default for numeric fields, `"true"`/`"false"` for toggles.
    pub default: &'static str,
}

const fn numeric(name: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Numeric,
        default,
    }
}

const fn toggle(name: &'static str, label: &'static str, default: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Toggle,
        default: if default { "true" } else { "false" },
    }
}

const DCF_FIELDS: &[FieldSpec] = &[
    toggle(USE_FCF, "Use Free Cash Flow", true),
    numeric(CASH_FLOW, "Current Cash Flow", ""),
    toggle(USE_CONSTANT_GROWTH, "Constant Growth", true),
    toggle(USE_10_YEAR_PROJECTION, "10-Year Projection", true),
    numeric(CONSTANT_GROWTH_RATE, "Growth Rate (Next 10 Years, %)", ""),
    numeric(CONSTANT_GROWTH_RATE_5YR, "Growth Rate (Next 5 Years, %)", ""),
    numeric(VARIABLE_GROWTH_RATE_1, "Year 1 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_2_4, "Years 2-4 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_5_7, "Years 5-7 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_8_10, "Years 8-10 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_5YR_1, "Year 1 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_5YR_2_3, "Years 2-3 (%)", ""),
    numeric(VARIABLE_GROWTH_RATE_5YR_4_5, "Years 4-5 (%)", ""),
    toggle(USE_TERMINAL_GROWTH_RATE, "Perpetual Growth", true),
    numeric(TERMINAL_GROWTH_RATE, "Terminal Growth Rate (%)", "2.5"),
    numeric(TERMINAL_MULTIPLE, "Terminal Cash Flow Multiple", ""),
    numeric(DISCOUNT_RATE, "Discount Rate (WACC, %)", "10"),
    numeric(SHARES_OUTSTANDING, "Shares Outstanding", ""),
    numeric(SHARES_GROWTH_RATE, "Shares Outstanding Growth Rate (%)", "0"),
    numeric(NET_CASH, "Net Cash", ""),
    numeric(CURRENT_PRICE, "Current Stock Price", ""),
];

const BEN_GRAHAM_FIELDS: &[FieldSpec] = &[
    numeric(EPS, "Earnings Per Share (EPS)", ""),
    numeric(EPS_GROWTH_RATE, "Expected EPS Growth Rate (%)", ""),
    numeric(AVG_YIELD, "Average Yield of AAA Corporate Bonds (%)", "4.4"),
    numeric(CURRENT_YIELD, "Current Yield on AAA Corporate Bonds (%)", ""),
    numeric(CURRENT_PRICE, "Current Stock Price", ""),
];

const PETER_LYNCH_FIELDS: &[FieldSpec] = &[
    numeric(EPS, "Earnings Per Share (EPS)", ""),
    numeric(EPS_GROWTH_RATE, "EPS Growth Rate (%)", ""),
    numeric(PEG_RATIO, "Price/Earnings to Growth (PEG) Ratio", "1"),
    numeric(CURRENT_PRICE, "Current Stock Price", ""),
];

const RULE_ONE_FIELDS: &[FieldSpec] = &[
    numeric(EPS, "Current EPS", ""),
    numeric(EPS_GROWTH_RATE, "Expected EPS Growth Rate (%)", ""),
    numeric(FUTURE_PE, "Expected Future P/E", ""),
    numeric(MIN_RATE_OF_RETURN, "Minimum Acceptable Rate of Return (%)", "15"),
    numeric(YEARS, "Number of Years", "10"),
    numeric(CURRENT_PRICE, "Current Stock Price", ""),
];

const TEN_CAP_FIELDS: &[FieldSpec] = &[
    numeric(NET_INCOME, "Net Income", ""),
    numeric(DEPRECIATION, "Depreciation & Amortisation", ""),
    numeric(WORKING_CAPITAL, "Changes in Working Capital", ""),
    toggle(USE_DIRECT_MAINT_CAPEX, "Direct Maintenance CapEx", false),
    numeric(MAINT_CAPEX_DIRECT, "Direct Amount", ""),
    numeric(TOTAL_CAPEX, "Total CapEx", ""),
    numeric(MAINT_CAPEX_PERCENTAGE, "Maint. % of Total", ""),
    numeric(MARKET_CAP, "Market Cap", ""),
];

const PRICE_TO_FCF_FIELDS: &[FieldSpec] = &[
    numeric(FCF, "Free Cash Flow (FCF)", ""),
    numeric(FCF_CHANGE, "Expected % Increase/Decrease in FCF", "0"),
    numeric(FCF_MULTIPLE, "Price/FCF Multiple", ""),
    numeric(SHARES_OUTSTANDING, "Shares Outstanding", ""),
    numeric(CURRENT_PRICE, "Current Stock Price", ""),
];

const MARGIN_OF_SAFETY_FIELDS: &[FieldSpec] = &[
    numeric(MARKET_CAP, "Market Cap", ""),
    numeric(PE_RATIO, "P/E Ratio", ""),
    numeric(PS_RATIO, "P/S Ratio", ""),
    numeric(REVENUE_CAGR, "Revenue 3-year CAGR (%)", ""),
    numeric(TOTAL_ASSETS, "Total Assets", ""),
    numeric(TOTAL_DEBT, "Total Debt", ""),
    numeric(LONG_TERM_DEBT, "Long-Term Debt", ""),
    numeric(CAPEX, "Capital Expenditure", ""),
    numeric(FCF, "Free Cash Flow", ""),
    numeric(NET_CASH, "Net Cash", ""),
];

/// The declared fields of a model, in form order.
pub fn schema(model: ModelId) -> &'static [FieldSpec] {
    match model {
        ModelId::Dcf => DCF_FIELDS,
        ModelId::BenGraham => BEN_GRAHAM_FIELDS,
        ModelId::PeterLynch => PETER_LYNCH_FIELDS,
        ModelId::RuleOne => RULE_ONE_FIELDS,
        ModelId::TenCap => TEN_CAP_FIELDS,
        ModelId::PriceToFcf => PRICE_TO_FCF_FIELDS,
        ModelId::MarginOfSafety => MARGIN_OF_SAFETY_FIELDS,
    }
}

pub fn field_spec(model: ModelId, field: &str) -> Option<&'static FieldSpec> {
    schema(model).iter().find(|spec| spec.name == field)
}

/// Interpret toggle text. Unrecognised text reads as off.
pub fn parse_toggle(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// One stored field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Toggle(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde_json::Value;
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(FieldValue::Toggle(b)),
            Value::String(s) => Ok(FieldValue::Text(s)),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Null => Ok(FieldValue::Text(String::new())),
            other => Err(de::Error::custom(format!(
                "unsupported field value: {other}"
            ))),
        }
    }
}

/// The inputs of one model: field name to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputRecord {
    fields: BTreeMap<String, FieldValue>,
}

static EMPTY_RECORD: InputRecord = InputRecord {
    fields: BTreeMap::new(),
};

impl InputRecord {
    /// A record with every declared field at its default.
    pub fn defaults(model: ModelId) -> Self {
        let fields = schema(model)
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    FieldKind::Numeric => FieldValue::Text(spec.default.to_string()),
                    FieldKind::Toggle => FieldValue::Toggle(parse_toggle(spec.default)),
                };
                (spec.name.to_string(), value)
            })
            .collect();
        Self { fields }
    }

    /// Raw text of a field; empty for unset fields and toggles.
    pub fn text(&self, field: &str) -> &str {
        match self.fields.get(field) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn toggle(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(FieldValue::Toggle(b)) => *b,
            Some(FieldValue::Text(s)) => parse_toggle(s),
            None => false,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// The single mutation path: store `raw` under `field`, typed per the
    /// model's schema. Never fails; undeclared fields are kept as text.
    pub fn set(&mut self, model: ModelId, field: &str, raw: &str) {
        let value = match field_spec(model, field).map(|spec| spec.kind) {
            Some(FieldKind::Toggle) => FieldValue::Toggle(parse_toggle(raw)),
            _ => FieldValue::Text(raw.to_string()),
        };
        self.fields.insert(field.to_string(), value);
    }

    /// Copy every field of `other` over this record.
    pub fn overlay(&mut self, other: &InputRecord) {
        for (name, value) in &other.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Text fields, in name order.
    pub fn text_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(name, value)| match value {
            FieldValue::Text(s) => Some((name.as_str(), s.as_str())),
            FieldValue::Toggle(_) => None,
        })
    }

    /// Declared numeric fields of `model` that are blank.
    pub fn blank_fields(&self, model: ModelId) -> Vec<&'static str> {
        schema(model)
            .iter()
            .filter(|spec| spec.kind == FieldKind::Numeric)
            .filter(|spec| self.text(spec.name).trim().is_empty())
            .map(|spec| spec.name)
            .collect()
    }
}

/// Every model's record. Owned by the caller; the engine only borrows it or
/// takes it by value and hands back the successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputState {
    records: BTreeMap<ModelId, InputRecord>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        let records = ModelId::ALL
            .into_iter()
            .map(|model| (model, InputRecord::defaults(model)))
            .collect();
        Self { records }
    }

    /// Build a full state from a possibly partial one: defaults first, then
    /// whatever `partial` supplies.
    pub fn from_partial(partial: InputState) -> Self {
        let mut state = Self::new();
        for (model, record) in partial.records {
            state.record_mut(model).overlay(&record);
        }
        state
    }

    pub fn record(&self, model: ModelId) -> &InputRecord {
        self.records.get(&model).unwrap_or(&EMPTY_RECORD)
    }

    pub fn record_mut(&mut self, model: ModelId) -> &mut InputRecord {
        self.records
            .entry(model)
            .or_insert_with(|| InputRecord::defaults(model))
    }

    pub fn set(&mut self, model: ModelId, field: &str, raw: &str) {
        self.record_mut(model).set(model, field, raw);
    }

    /// Restore one model's record to its defaults.
    pub fn reset(&mut self, model: ModelId) {
        self.records.insert(model, InputRecord::defaults(model));
    }

    pub fn records(&self) -> impl Iterator<Item = (ModelId, &InputRecord)> {
        self.records.iter().map(|(model, record)| (*model, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_carry_conventions() {
        let dcf = InputRecord::defaults(ModelId::Dcf);
        assert_eq!(dcf.text(DISCOUNT_RATE), "10");
        assert_eq!(dcf.text(TERMINAL_GROWTH_RATE), "2.5");
        assert_eq!(dcf.text(CASH_FLOW), "");
        assert!(dcf.toggle(USE_FCF));
        assert!(dcf.toggle(USE_TERMINAL_GROWTH_RATE));

        let ten_cap = InputRecord::defaults(ModelId::TenCap);
        assert!(!ten_cap.toggle(USE_DIRECT_MAINT_CAPEX));
    }

    #[test]
    fn test_set_types_toggles_by_schema() {
        let mut record = InputRecord::defaults(ModelId::TenCap);
        record.set(ModelId::TenCap, USE_DIRECT_MAINT_CAPEX, "true");
        assert_eq!(
            record.get(USE_DIRECT_MAINT_CAPEX),
            Some(&FieldValue::Toggle(true))
        );
        record.set(ModelId::TenCap, USE_DIRECT_MAINT_CAPEX, "nonsense");
        assert!(!record.toggle(USE_DIRECT_MAINT_CAPEX));
    }

    #[test]
    fn test_set_unknown_field_kept_as_text() {
        let mut record = InputRecord::defaults(ModelId::BenGraham);
        record.set(ModelId::BenGraham, "notes", "cheap");
        assert_eq!(record.text("notes"), "cheap");
    }

    #[test]
    fn test_record_deserializes_flat_json() {
        let record: InputRecord =
            serde_json::from_str(r#"{"cashFlow": 100, "useFcf": false, "netCash": "-5", "x": null}"#)
                .unwrap();
        assert_eq!(record.text(CASH_FLOW), "100");
        assert_eq!(record.text(NET_CASH), "-5");
        assert_eq!(record.text("x"), "");
        assert!(!record.toggle(USE_FCF));
    }

    #[test]
    fn test_state_from_partial_keeps_defaults() {
        let partial: InputState =
            serde_json::from_str(r#"{"ben_graham": {"eps": "3"}}"#).unwrap();
        let state = InputState::from_partial(partial);
        assert_eq!(state.record(ModelId::BenGraham).text(EPS), "3");
        assert_eq!(state.record(ModelId::BenGraham).text(AVG_YIELD), "4.4");
        assert_eq!(state.record(ModelId::Dcf).text(DISCOUNT_RATE), "10");
    }

    #[test]
    fn test_blank_fields_lists_numeric_only() {
        let record = InputRecord::defaults(ModelId::PeterLynch);
        assert_eq!(
            record.blank_fields(ModelId::PeterLynch),
            vec![EPS, EPS_GROWTH_RATE, CURRENT_PRICE]
        );
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = InputState::new();
        state.set(ModelId::RuleOne, YEARS, "5");
        state.reset(ModelId::RuleOne);
        assert_eq!(state.record(ModelId::RuleOne).text(YEARS), "10");
    }
}
