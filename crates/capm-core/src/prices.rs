use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::CapmError;
use crate::types::{Obs, Rate};
use crate::CapmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One period of the price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Period end date
    pub date: NaiveDate,
    /// Price level per instrument name (market index and stocks)
    pub prices: BTreeMap<String, f64>,
    /// Annualized risk-free yield in percent (e.g. 4.5 for 4.5%)
    pub risk_free_yield: Rate,
}

/// Time-indexed price levels for a market index and a fixed set of stocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Column name of the market index
    pub market: String,
    /// Column names of the individual stocks
    pub stocks: Vec<String>,
    /// Records in strictly increasing date order
    pub records: Vec<PriceRecord>,
}

// ---------------------------------------------------------------------------
// Construction & validation
// ---------------------------------------------------------------------------

impl PriceTable {
    /// Build a table and check its invariants.
    pub fn new(
        market: impl Into<String>,
        stocks: Vec<String>,
        records: Vec<PriceRecord>,
    ) -> CapmResult<Self> {
        let table = PriceTable {
            market: market.into(),
            stocks,
            records,
        };
        table.validate()?;
        Ok(table)
    }

    /// Check the table invariants: at least two records, strictly increasing
    /// dates, unique instrument names and a price for every instrument in
    /// every record.
    ///
    /// Price positivity is enforced when returns are computed.
    pub fn validate(&self) -> CapmResult<()> {
        if self.market.trim().is_empty() {
            return Err(CapmError::invalid("market", "Market column name is empty"));
        }

        let mut seen = HashSet::new();
        for name in self.instruments() {
            if !seen.insert(name) {
                return Err(CapmError::invalid(
                    "stocks",
                    format!("Instrument '{}' is listed more than once", name),
                ));
            }
        }

        if self.records.len() < 2 {
            return Err(CapmError::InsufficientData(format!(
                "At least 2 price records are required to compute returns, got {}",
                self.records.len()
            )));
        }

        for (i, pair) in self.records.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(CapmError::invalid(
                    format!("records[{}].date", i + 1),
                    format!(
                        "Dates must be strictly increasing ({} follows {})",
                        pair[1].date, pair[0].date
                    ),
                ));
            }
        }

        for (i, record) in self.records.iter().enumerate() {
            for name in self.instruments() {
                if !record.prices.contains_key(name) {
                    return Err(CapmError::invalid(
                        format!("records[{}].prices", i),
                        format!("Missing price for '{}' on {}", name, record.date),
                    ));
                }
            }
            if !record.risk_free_yield.is_finite() {
                return Err(CapmError::invalid(
                    format!("records[{}].risk_free_yield", i),
                    "Risk-free yield must be a finite number",
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl PriceTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Market index first, then stocks in declaration order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.market.as_str()).chain(self.stocks.iter().map(String::as_str))
    }

    pub fn has_instrument(&self, name: &str) -> bool {
        self.instruments().any(|n| n == name)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Price column for one instrument.
    pub fn prices(&self, name: &str) -> CapmResult<Vec<f64>> {
        if !self.has_instrument(name) {
            return Err(CapmError::invalid(
                "instrument",
                format!("Unknown instrument '{}'", name),
            ));
        }
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.prices.get(name).copied().ok_or_else(|| {
                    CapmError::invalid(
                        format!("records[{}].prices", i),
                        format!("Missing price for '{}'", name),
                    )
                })
            })
            .collect()
    }

    /// Annualized risk-free yields as an aligned series.
    pub fn risk_free_yields(&self) -> Vec<Obs> {
        self.records
            .iter()
            .map(|r| Obs::value(r.risk_free_yield))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: (i32, u32, u32), market: f64, stock: f64, rf: f64) -> PriceRecord {
        let mut prices = BTreeMap::new();
        prices.insert("SANDP".to_string(), market);
        prices.insert("FORD".to_string(), stock);
        PriceRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            prices,
            risk_free_yield: rf,
        }
    }

    fn sample_records() -> Vec<PriceRecord> {
        vec![
            record((2002, 1, 31), 1130.2, 15.3, 1.7),
            record((2002, 2, 28), 1106.7, 14.9, 1.8),
            record((2002, 3, 28), 1147.4, 16.5, 1.8),
        ]
    }

    #[test]
    fn test_valid_table() {
        let t = PriceTable::new("SANDP", vec!["FORD".into()], sample_records()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.instruments().collect::<Vec<_>>(), vec!["SANDP", "FORD"]);
        assert_eq!(t.prices("FORD").unwrap(), vec![15.3, 14.9, 16.5]);
        assert_eq!(t.risk_free_yields()[1].get(), Some(1.8));
    }

    #[test]
    fn test_single_record_rejected() {
        let mut records = sample_records();
        records.truncate(1);
        let err = PriceTable::new("SANDP", vec!["FORD".into()], records).unwrap_err();
        assert!(matches!(err, CapmError::InsufficientData(_)));
    }

    #[test]
    fn test_non_increasing_dates_rejected() {
        let mut records = sample_records();
        records[2].date = records[1].date;
        let err = PriceTable::new("SANDP", vec!["FORD".into()], records).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("records[2].date"), "unexpected message: {msg}");
    }

    #[test]
    fn test_missing_instrument_price_rejected() {
        let mut records = sample_records();
        records[1].prices.remove("FORD");
        let err = PriceTable::new("SANDP", vec!["FORD".into()], records).unwrap_err();
        assert!(matches!(err, CapmError::InvalidInput { .. }));
    }

    #[test]
    fn test_duplicate_instrument_rejected() {
        let err = PriceTable::new("SANDP", vec!["SANDP".into()], sample_records()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unknown_instrument() {
        let t = PriceTable::new("SANDP", vec!["FORD".into()], sample_records()).unwrap();
        assert!(t.prices("GE").is_err());
    }
}
