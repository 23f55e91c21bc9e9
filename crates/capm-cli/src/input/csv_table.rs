use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use capm_core::prices::{PriceRecord, PriceTable};

use crate::config::RunConfig;

/// Load a price table from a CSV file with a header row.
///
/// Only the date, market, stock and risk-free columns named in `config` are
/// read; any other columns are ignored.
pub fn read_price_csv(
    path: &str,
    config: &RunConfig,
) -> Result<PriceTable, Box<dyn std::error::Error>> {
    let canonical = super::file::resolve_path(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize, Box<dyn std::error::Error>> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("Column '{}' not found in '{}'", name, canonical.display()).into())
    };

    let date_idx = column(&config.date_column)?;
    let rf_idx = column(&config.risk_free)?;
    let instruments: Vec<(String, usize)> = std::iter::once(&config.market)
        .chain(config.stocks.iter())
        .map(|name| -> Result<(String, usize), Box<dyn std::error::Error>> {
            Ok((name.clone(), column(name)?))
        })
        .collect::<Result<_, _>>()?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let date = NaiveDate::parse_from_str(cell(date_idx), &config.date_format).map_err(|e| {
            format!(
                "Line {}: cannot parse date '{}' with format '{}': {}",
                line,
                cell(date_idx),
                config.date_format,
                e
            )
        })?;

        let mut prices = BTreeMap::new();
        for (name, idx) in &instruments {
            prices.insert(name.clone(), parse_number(cell(*idx), name, line)?);
        }
        let risk_free_yield = parse_number(cell(rf_idx), &config.risk_free, line)?;

        records.push(PriceRecord {
            date,
            prices,
            risk_free_yield,
        });
    }

    debug!(path = %canonical.display(), rows = records.len(), "loaded price table");
    Ok(PriceTable::new(
        config.market.clone(),
        config.stocks.clone(),
        records,
    )?)
}

fn parse_number(raw: &str, column: &str, line: usize) -> Result<f64, Box<dyn std::error::Error>> {
    raw.parse::<f64>()
        .map_err(|_| format!("Line {}: column '{}' holds '{}', expected a number", line, column, raw).into())
}
