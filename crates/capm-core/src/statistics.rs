use serde::{Deserialize, Serialize};

use crate::error::CapmError;
use crate::types::{defined_values, Obs};
use crate::CapmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Descriptive statistics of the defined values of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of non-missing values
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (N - 1 denominator)
    pub std_dev: f64,
    pub min: f64,
    pub p25: f64,
    pub p75: f64,
    pub max: f64,
    /// Pearson kurtosis (normal = 3); `None` when the variance is zero
    pub kurtosis: Option<f64>,
    /// Population skewness; `None` when the variance is zero
    pub skewness: Option<f64>,
}

/// Summary statistics tagged with the series they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSummary {
    pub name: String,
    pub statistics: SummaryStatistics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Describe a series, ignoring missing values.
///
/// Skewness and kurtosis use population central moments
/// (`m3 / m2^1.5` and `m4 / m2^2`); both are undefined for a constant series.
pub fn describe(series: &[Obs]) -> CapmResult<SummaryStatistics> {
    let mut values = defined_values(series);
    describe_values(&mut values)
}

/// Describe a slice of defined values. The slice is sorted in place.
pub fn describe_values(values: &mut [f64]) -> CapmResult<SummaryStatistics> {
    if values.len() < 2 {
        return Err(CapmError::InsufficientData(format!(
            "At least 2 non-missing values are required for descriptive statistics, got {}",
            values.len()
        )));
    }
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(CapmError::invalid(
            "series",
            format!("Non-finite value {} in series", v),
        ));
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
        let d = v - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);

    // Sorted, so equal endpoints mean every value is identical. The moments
    // above are rounding noise in that case.
    let constant = values[0] == values[values.len() - 1];
    let (std_dev, skewness, kurtosis) = if constant || m2 <= 0.0 {
        (0.0, None, None)
    } else {
        let sample_var = m2 * n / (n - 1.0);
        (
            sample_var.sqrt(),
            Some(m3 / m2.powf(1.5)),
            Some(m4 / (m2 * m2)),
        )
    };

    Ok(SummaryStatistics {
        count: values.len(),
        mean,
        median: percentile_sorted(values, 50.0),
        std_dev,
        min: values[0],
        p25: percentile_sorted(values, 25.0),
        p75: percentile_sorted(values, 75.0),
        max: values[values.len() - 1],
        kurtosis,
        skewness,
    })
}

/// Compute the percentile value from a **sorted** slice using linear interpolation.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N - 1); exactly zero for fewer than two values
/// or when every value is identical.
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

pub(crate) fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
