use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};

use capm_core::returns::derive_return_table;
use capm_core::statistics::{describe, SummaryStatistics};

use crate::commands::load_table;
use crate::config::{DataArgs, RunConfig};

/// Arguments for the return table
#[derive(Args)]
pub struct ReturnsArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

/// Arguments for descriptive statistics of excess returns
#[derive(Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only describe this instrument (default: every instrument)
    #[arg(long)]
    pub instrument: Option<String>,
}

#[derive(Debug, Serialize)]
struct DescribeRow {
    name: String,
    #[serde(flatten)]
    statistics: SummaryStatistics,
}

/// One row per period: monthly risk-free rate plus `ret_*` and `retexc_*`
/// columns for every instrument.
pub fn run_returns(args: ReturnsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = RunConfig::resolve(&args.data)?;
    let table = load_table(&config)?;
    let rt = derive_return_table(&table)?;

    let rows: Vec<Value> = rt
        .dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let mut row = Map::new();
            row.insert("date".into(), Value::String(date.to_string()));
            row.insert(
                "rf_monthly".into(),
                serde_json::to_value(rt.risk_free_monthly[i]).unwrap_or(Value::Null),
            );
            for inst in &rt.instruments {
                row.insert(
                    format!("ret_{}", inst.name),
                    serde_json::to_value(inst.returns[i]).unwrap_or(Value::Null),
                );
                row.insert(
                    format!("retexc_{}", inst.name),
                    serde_json::to_value(inst.excess_returns[i]).unwrap_or(Value::Null),
                );
            }
            Value::Object(row)
        })
        .collect();

    Ok(Value::Array(rows))
}

pub fn run_describe(args: DescribeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = RunConfig::resolve(&args.data)?;
    let table = load_table(&config)?;
    let rt = derive_return_table(&table)?;

    let selected: Vec<_> = match args.instrument {
        Some(ref name) => vec![rt.instrument(name)?],
        None => rt.instruments.iter().collect(),
    };

    let rows = selected
        .into_iter()
        .map(|inst| {
            Ok(DescribeRow {
                name: inst.name.clone(),
                statistics: describe(&inst.excess_returns)?,
            })
        })
        .collect::<Result<Vec<_>, capm_core::CapmError>>()?;

    Ok(serde_json::to_value(rows)?)
}
