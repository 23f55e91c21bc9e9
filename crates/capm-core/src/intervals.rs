use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::CapmError;
use crate::CapmResult;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Two-sided confidence interval around a point estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
    /// Student-t quantile at (1 + level) / 2
    pub critical_value: f64,
}

fn students_t(dof: usize) -> CapmResult<StudentsT> {
    if dof == 0 {
        return Err(CapmError::invalid(
            "dof",
            "Degrees of freedom must be at least 1",
        ));
    }
    StudentsT::new(0.0, 1.0, dof as f64).map_err(|e| {
        CapmError::invalid("dof", format!("Invalid Student-t parameters: {e}"))
    })
}

/// Two-sided Student-t critical value for the given confidence level.
pub fn t_critical_value(level: f64, dof: usize) -> CapmResult<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(CapmError::invalid(
            "level",
            format!("Confidence level must lie strictly between 0 and 1, got {}", level),
        ));
    }
    Ok(students_t(dof)?.inverse_cdf((1.0 + level) / 2.0))
}

/// Two-sided p-value of a t statistic.
pub fn two_sided_p_value(t_stat: f64, dof: usize) -> CapmResult<f64> {
    let dist = students_t(dof)?;
    Ok((2.0 * (1.0 - dist.cdf(t_stat.abs()))).clamp(0.0, 1.0))
}

/// `estimate +/- t_{dof, (1 + level) / 2} * std_error`
pub fn confidence_interval(
    estimate: f64,
    std_error: f64,
    dof: usize,
    level: f64,
) -> CapmResult<ConfidenceInterval> {
    if !std_error.is_finite() || std_error < 0.0 {
        return Err(CapmError::invalid(
            "std_error",
            format!("Standard error must be finite and non-negative, got {}", std_error),
        ));
    }
    let critical_value = t_critical_value(level, dof)?;
    let half_width = critical_value * std_error;
    Ok(ConfidenceInterval {
        estimate,
        lower: estimate - half_width,
        upper: estimate + half_width,
        level,
        critical_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_critical_values() {
        // Textbook table values
        assert!((t_critical_value(0.95, 3).unwrap() - 3.182446).abs() < 1e-4);
        assert!((t_critical_value(0.95, 30).unwrap() - 2.042272).abs() < 1e-4);
        assert!((t_critical_value(0.99, 10).unwrap() - 3.169273).abs() < 1e-4);
    }

    #[test]
    fn test_interval_is_symmetric() {
        let ci = confidence_interval(1.99, 0.059721576, 3, 0.95).unwrap();
        assert!((ci.lower - 1.799938).abs() < 1e-4, "lower {}", ci.lower);
        assert!((ci.upper - 2.180062).abs() < 1e-4, "upper {}", ci.upper);
        assert!(((ci.upper - ci.estimate) - (ci.estimate - ci.lower)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_std_error_collapses() {
        let ci = confidence_interval(0.5, 0.0, 10, 0.95).unwrap();
        assert_eq!(ci.lower, 0.5);
        assert_eq!(ci.upper, 0.5);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(confidence_interval(0.0, 1.0, 0, 0.95).is_err());
        assert!(confidence_interval(0.0, 1.0, 5, 1.0).is_err());
        assert!(confidence_interval(0.0, 1.0, 5, 0.0).is_err());
        assert!(confidence_interval(0.0, -1.0, 5, 0.95).is_err());
    }

    #[test]
    fn test_p_value() {
        let p = two_sided_p_value(3.182446, 3).unwrap();
        assert!((p - 0.05).abs() < 1e-4, "p {}", p);
        assert!((two_sided_p_value(0.0, 7).unwrap() - 1.0).abs() < 1e-12);
    }
}
