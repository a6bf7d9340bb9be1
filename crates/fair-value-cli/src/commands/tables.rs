use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fair_value_core::comparison::{classify_cap_rate, classify_difference};
use fair_value_core::tables::{cagr_table, margin_of_safety_ladder, BuyPrice};

use crate::commands::parse_assignment;

/// Arguments for band classification
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ClassifyArgs {
    /// Signed percentage difference, e.g. -12.5
    #[arg(long, required_unless_present = "cap_rate")]
    pub difference: Option<Decimal>,

    /// Ten Cap rate in percent, classified against the 10% hurdle
    #[arg(long, conflicts_with = "difference")]
    pub cap_rate: Option<Decimal>,
}

/// Arguments for the margin-of-safety ladder
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LadderArgs {
    /// Fair value to discount
    #[arg(long)]
    pub value: Decimal,
}

/// Arguments for the CAGR table
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CagrArgs {
    /// Target future price
    #[arg(long)]
    pub future: Decimal,

    /// Years to reach the future price
    #[arg(long)]
    pub years: u32,

    /// Buy price as LABEL=PRICE (repeatable)
    #[arg(long = "buy", value_name = "LABEL=PRICE", required = true)]
    pub buy: Vec<String>,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(rate) = args.cap_rate {
        let band = classify_cap_rate(Some(rate));
        return Ok(json!({
            "cap_rate": rate,
            "band": band,
            "color": band.color(),
        }));
    }
    let band = classify_difference(args.difference);
    Ok(json!({
        "difference": args.difference,
        "band": band,
        "label": band.label(),
        "color": band.color(),
    }))
}

pub fn run_ladder(args: LadderArgs) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(margin_of_safety_ladder(args.value))?)
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let buy_prices = args
        .buy
        .iter()
        .map(|raw| {
            let (label, price) = parse_assignment(raw)?;
            let price: Decimal = price
                .parse()
                .map_err(|_| format!("'{price}' is not a price for {label}"))?;
            Ok(BuyPrice::new(label, price))
        })
        .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

    Ok(serde_json::to_value(cagr_table(
        &buy_prices,
        args.future,
        args.years,
    ))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ladder_output() {
        let value = run_ladder(LadderArgs { value: dec!(100) }).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4]["discount_pct"], 50);
        let price: Decimal = rows[4]["target_buy_price"].as_str().unwrap().parse().unwrap();
        assert_eq!(price, dec!(50));
    }

    #[test]
    fn test_cagr_rejects_bad_price() {
        let args = CagrArgs {
            future: dec!(100),
            years: 10,
            buy: vec!["Current Price=abc".to_string()],
        };
        assert!(run_cagr(args).is_err());
    }

    #[test]
    fn test_classify_cap_rate() {
        let value = run_classify(ClassifyArgs {
            difference: None,
            cap_rate: Some(dec!(12)),
        })
        .unwrap();
        assert_eq!(value["band"], "meets_hurdle");
    }
}
