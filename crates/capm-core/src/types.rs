use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Annualized or per-period rates in percent (5.0 = 5%), matching the
/// percentage scale of the return series.
pub type Rate = f64;

/// A time-aligned column of possibly-missing observations.
pub type Series = Vec<Obs>;

/// A single observation that may be missing.
///
/// Arithmetic between observations propagates missingness: if either operand
/// is missing, so is the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Obs(Option<f64>);

impl Obs {
    pub const MISSING: Obs = Obs(None);

    pub fn value(v: f64) -> Self {
        Obs(Some(v))
    }

    pub fn get(self) -> Option<f64> {
        self.0
    }

    pub fn is_missing(self) -> bool {
        self.0.is_none()
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Obs {
        Obs(self.0.map(f))
    }

    pub fn zip_with(self, other: Obs, f: impl FnOnce(f64, f64) -> f64) -> Obs {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Obs(Some(f(a, b))),
            _ => Obs::MISSING,
        }
    }
}

impl From<f64> for Obs {
    fn from(v: f64) -> Self {
        Obs(Some(v))
    }
}

impl From<Option<f64>> for Obs {
    fn from(v: Option<f64>) -> Self {
        Obs(v)
    }
}

impl fmt::Display for Obs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "NA"),
        }
    }
}

macro_rules! obs_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Obs {
            type Output = Obs;
            fn $method(self, rhs: Obs) -> Obs {
                self.zip_with(rhs, |a, b| a $op b)
            }
        }

        impl $trait<f64> for Obs {
            type Output = Obs;
            fn $method(self, rhs: f64) -> Obs {
                self.map(|a| a $op rhs)
            }
        }

        impl $trait<Obs> for f64 {
            type Output = Obs;
            fn $method(self, rhs: Obs) -> Obs {
                rhs.map(|b| self $op b)
            }
        }
    };
}

obs_binop!(Add, add, +);
obs_binop!(Sub, sub, -);
obs_binop!(Mul, mul, *);
obs_binop!(Div, div, /);

impl Neg for Obs {
    type Output = Obs;
    fn neg(self) -> Obs {
        self.map(|a| -a)
    }
}

/// Collect the defined values of a series, dropping missing entries.
pub fn defined_values(series: &[Obs]) -> Vec<f64> {
    series.iter().filter_map(|o| o.get()).collect()
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
            precision: "ieee754_f64".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_propagates_missing() {
        let a = Obs::value(3.0);
        let b = Obs::MISSING;
        assert_eq!(a + b, Obs::MISSING);
        assert_eq!(b - a, Obs::MISSING);
        assert_eq!(a * b, Obs::MISSING);
        assert_eq!(a / b, Obs::MISSING);
        assert_eq!(-b, Obs::MISSING);
        assert_eq!(b * 2.0, Obs::MISSING);
        assert_eq!(2.0 - b, Obs::MISSING);
    }

    #[test]
    fn test_arithmetic_on_defined_values() {
        let a = Obs::value(3.0);
        let b = Obs::value(1.5);
        assert_eq!((a + b).get(), Some(4.5));
        assert_eq!((a - b).get(), Some(1.5));
        assert_eq!((a * b).get(), Some(4.5));
        assert_eq!((a / b).get(), Some(2.0));
        assert_eq!((a - 1.0).get(), Some(2.0));
        assert_eq!((10.0 - a).get(), Some(7.0));
    }

    #[test]
    fn test_serializes_missing_as_null() {
        let series = vec![Obs::MISSING, Obs::value(1.25)];
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, "[null,1.25]");
        let back: Vec<Obs> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_defined_values_drops_missing() {
        let series = vec![Obs::MISSING, Obs::value(1.0), Obs::MISSING, Obs::value(2.0)];
        assert_eq!(defined_values(&series), vec![1.0, 2.0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Obs::MISSING.to_string(), "NA");
        assert_eq!(Obs::value(0.5).to_string(), "0.5");
    }
}
