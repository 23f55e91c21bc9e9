use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CapmError;
use crate::prices::PriceTable;
use crate::types::{Obs, Series};
use crate::CapmResult;

/// Periods per year used to de-annualize the risk-free yield.
pub const PERIODS_PER_YEAR: f64 = 12.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Return and excess-return series for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReturns {
    pub name: String,
    /// Continuously compounded returns in percent; first element missing
    pub returns: Series,
    /// Returns net of the per-period risk-free rate
    pub excess_returns: Series,
}

/// All derived return series, aligned with the source price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    pub dates: Vec<NaiveDate>,
    /// Annual yield / 12
    pub risk_free_monthly: Series,
    /// Market index first, then stocks
    pub instruments: Vec<InstrumentReturns>,
}

impl ReturnTable {
    pub fn instrument(&self, name: &str) -> CapmResult<&InstrumentReturns> {
        self.instruments
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| CapmError::invalid("instrument", format!("Unknown instrument '{}'", name)))
    }

    pub fn excess(&self, name: &str) -> CapmResult<&[Obs]> {
        Ok(&self.instrument(name)?.excess_returns)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Continuously compounded returns in percent: `100 * ln(p_t / p_{t-1})`.
///
/// The first element is missing since it has no prior price. Non-positive or
/// non-finite prices are rejected rather than producing NaN.
pub fn compute_log_returns(prices: &[f64]) -> CapmResult<Series> {
    if prices.len() < 2 {
        return Err(CapmError::InsufficientData(format!(
            "At least 2 prices are required to compute returns, got {}",
            prices.len()
        )));
    }
    if let Some((i, p)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(CapmError::invalid(
            format!("prices[{}]", i),
            format!("Price must be positive and finite to take a logarithm, got {}", p),
        ));
    }

    let mut out = Vec::with_capacity(prices.len());
    out.push(Obs::MISSING);
    out.extend(
        prices
            .windows(2)
            .map(|w| Obs::value(100.0 * (w[1] / w[0]).ln())),
    );
    Ok(out)
}

/// Convert an annualized yield series to a per-period (monthly) rate.
pub fn monthly_risk_free(annual_rate: &[Obs]) -> Series {
    annual_rate.iter().map(|r| *r / PERIODS_PER_YEAR).collect()
}

/// `returns[i] - annual_rate[i] / 12`, missing wherever either side is.
pub fn compute_excess_returns(returns: &[Obs], annual_rate: &[Obs]) -> CapmResult<Series> {
    if returns.len() != annual_rate.len() {
        return Err(CapmError::invalid(
            "annual_rate",
            format!(
                "Rate series length ({}) does not match return series length ({})",
                annual_rate.len(),
                returns.len()
            ),
        ));
    }
    Ok(returns
        .iter()
        .zip(monthly_risk_free(annual_rate))
        .map(|(r, rf)| *r - rf)
        .collect())
}

/// Derive log and excess returns for every instrument of a price table.
pub fn derive_return_table(table: &PriceTable) -> CapmResult<ReturnTable> {
    table.validate()?;

    let annual = table.risk_free_yields();
    let mut instruments = Vec::new();
    for name in table.instruments() {
        let prices = table.prices(name)?;
        let returns = compute_log_returns(&prices).map_err(|e| match e {
            CapmError::InvalidInput { field, reason } => CapmError::InvalidInput {
                field: format!("{}.{}", name, field),
                reason,
            },
            other => other,
        })?;
        let excess_returns = compute_excess_returns(&returns, &annual)?;
        instruments.push(InstrumentReturns {
            name: name.to_string(),
            returns,
            excess_returns,
        });
    }

    debug!(
        periods = table.len(),
        instruments = instruments.len(),
        "derived return table"
    );

    Ok(ReturnTable {
        dates: table.dates(),
        risk_free_monthly: monthly_risk_free(&annual),
        instruments,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::PriceRecord;
    use std::collections::BTreeMap;

    fn approx(a: Obs, b: f64, tol: f64) -> bool {
        a.get().map(|v| (v - b).abs() < tol).unwrap_or(false)
    }

    #[test]
    fn test_worked_example() {
        let r = compute_log_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(r.len(), 3);
        assert!(r[0].is_missing());
        assert!(approx(r[1], 9.531, 1e-3), "got {}", r[1]);
        assert!(approx(r[2], -10.536, 1e-3), "got {}", r[2]);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let err = compute_log_returns(&[100.0, 0.0, 99.0]).unwrap_err();
        assert!(err.to_string().contains("prices[1]"));
        assert!(compute_log_returns(&[-1.0, 2.0]).is_err());
        assert!(compute_log_returns(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(matches!(
            compute_log_returns(&[100.0]),
            Err(CapmError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_excess_returns_subtract_monthly_rate() {
        let returns = vec![Obs::MISSING, Obs::value(2.0), Obs::value(-1.0)];
        let rate = vec![Obs::value(6.0), Obs::value(6.0), Obs::MISSING];
        let ex = compute_excess_returns(&returns, &rate).unwrap();
        assert!(ex[0].is_missing());
        assert!(approx(ex[1], 1.5, 1e-12));
        assert!(ex[2].is_missing());
    }

    #[test]
    fn test_excess_returns_length_mismatch() {
        let returns = vec![Obs::MISSING, Obs::value(2.0)];
        let rate = vec![Obs::value(6.0)];
        assert!(compute_excess_returns(&returns, &rate).is_err());
    }

    #[test]
    fn test_derive_return_table() {
        let mk = |d: u32, m: f64, s: f64| {
            let mut prices = BTreeMap::new();
            prices.insert("SANDP".to_string(), m);
            prices.insert("FORD".to_string(), s);
            PriceRecord {
                date: NaiveDate::from_ymd_opt(2003, d, 1).unwrap(),
                prices,
                risk_free_yield: 1.2,
            }
        };
        let table = PriceTable::new(
            "SANDP",
            vec!["FORD".into()],
            vec![mk(1, 100.0, 10.0), mk(2, 101.0, 12.0), mk(3, 99.0, 11.0)],
        )
        .unwrap();
        let rt = derive_return_table(&table).unwrap();
        assert_eq!(rt.instruments.len(), 2);
        assert_eq!(rt.instruments[0].name, "SANDP");
        assert!(approx(rt.risk_free_monthly[0], 0.1, 1e-12));

        let ford = rt.excess("FORD").unwrap();
        let expected = 100.0 * (12.0_f64 / 10.0).ln() - 0.1;
        assert!(approx(ford[1], expected, 1e-12));
        assert!(rt.excess("GE").is_err());
    }

    #[test]
    fn test_derive_return_table_names_bad_instrument() {
        let mut prices_a = BTreeMap::new();
        prices_a.insert("SANDP".to_string(), 100.0);
        let mut prices_b = BTreeMap::new();
        prices_b.insert("SANDP".to_string(), -5.0);
        let table = PriceTable {
            market: "SANDP".into(),
            stocks: vec![],
            records: vec![
                PriceRecord {
                    date: NaiveDate::from_ymd_opt(2003, 1, 1).unwrap(),
                    prices: prices_a,
                    risk_free_yield: 1.0,
                },
                PriceRecord {
                    date: NaiveDate::from_ymd_opt(2003, 2, 1).unwrap(),
                    prices: prices_b,
                    risk_free_yield: 1.0,
                },
            ],
        };
        let err = derive_return_table(&table).unwrap_err();
        assert!(err.to_string().contains("SANDP.prices[1]"), "{}", err);
    }
}
