use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};
use tracing::debug;

use crate::error::CapmError;
use crate::intervals::{confidence_interval, two_sided_p_value, ConfidenceInterval};
use crate::statistics::{describe_values, mean, sample_std_dev};
use crate::types::Obs;
use crate::CapmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One estimated regression coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub estimate: f64,
    pub std_error: f64,
    /// `None` when the standard error is zero (exact fit)
    pub t_stat: Option<f64>,
    /// Two-sided p-value of the t statistic
    pub p_value: Option<f64>,
}

/// Result of regressing a dependent excess-return series on the market's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapmFit {
    /// Jensen's alpha (intercept)
    pub alpha: ParameterEstimate,
    /// Market beta (slope)
    pub beta: ParameterEstimate,
    /// Number of paired observations used
    pub n: usize,
    /// Residual degrees of freedom (n - 2)
    pub dof: usize,
    /// Row indices (into the input series) that entered the fit
    pub observations: Vec<usize>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    /// sqrt(SSR / (n - 2))
    pub residual_std_error: f64,
    /// Sample standard deviation of the residuals (N - 1 denominator)
    pub residual_std_dev: f64,
    pub r_squared: f64,
    pub adjusted_r_squared: f64,
    /// F test of the slope; `None` for an exact fit
    pub f_statistic: Option<f64>,
    pub f_p_value: Option<f64>,
    pub durbin_watson: f64,
    /// Jarque-Bera normality test on the residuals; `None` for an exact fit
    pub jarque_bera: Option<f64>,
    pub jarque_bera_p_value: Option<f64>,
    /// Gaussian log-likelihood; `None` for an exact fit
    pub log_likelihood: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub mean_dependent: f64,
    pub mean_independent: f64,
}

/// Confidence intervals for both CAPM parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterIntervals {
    pub alpha: ConfidenceInterval,
    pub beta: ConfidenceInterval,
}

/// Number of estimated parameters (intercept and slope).
const NUM_PARAMS: usize = 2;

/// Minimum paired observations for positive residual degrees of freedom.
const MIN_OBSERVATIONS: usize = 3;

/// Residuals within this many ulps of the dependent values count as an exact fit.
const EXACT_FIT_ULPS: f64 = 64.0;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fit `dependent = alpha + beta * independent + e` by ordinary least squares.
///
/// Rows where either series is missing are excluded pairwise before fitting.
pub fn fit_capm(dependent: &[Obs], independent: &[Obs]) -> CapmResult<CapmFit> {
    if dependent.len() != independent.len() {
        return Err(CapmError::invalid(
            "independent",
            format!(
                "Independent series length ({}) does not match dependent series length ({})",
                independent.len(),
                dependent.len()
            ),
        ));
    }

    let mut observations = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (i, (y, x)) in dependent.iter().zip(independent).enumerate() {
        if let (Some(y), Some(x)) = (y.get(), x.get()) {
            observations.push(i);
            xs.push(x);
            ys.push(y);
        }
    }

    let n = xs.len();
    if n < MIN_OBSERVATIONS {
        return Err(CapmError::InsufficientData(format!(
            "At least {} paired observations required for CAPM regression, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
        return Err(CapmError::invalid(
            "series",
            "Regression inputs must be finite",
        ));
    }

    // ------------------------------------------------------------------
    // 1. Centered moments and closed-form estimates
    // ------------------------------------------------------------------
    let x_mean = mean(&xs);
    let y_mean = mean(&ys);
    let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let syy: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();

    if xs.iter().all(|x| *x == xs[0]) || sxx <= 0.0 {
        return Err(CapmError::DegenerateInput(
            "Independent series has zero variance; beta is undefined".into(),
        ));
    }

    let beta = sxy / sxx;
    let alpha = y_mean - beta * x_mean;

    // ------------------------------------------------------------------
    // 2. Residuals and goodness of fit
    // ------------------------------------------------------------------
    let fitted: Vec<f64> = xs.iter().map(|x| alpha + beta * x).collect();
    let residuals: Vec<f64> = ys.iter().zip(&fitted).map(|(y, f)| y - f).collect();
    let raw_ssr: f64 = residuals.iter().map(|e| e * e).sum();

    // SSR at rounding-noise level relative to the data is an exact fit.
    let y_sq: f64 = ys.iter().map(|y| y * y).sum();
    let exact = raw_ssr <= (EXACT_FIT_ULPS * f64::EPSILON).powi(2) * y_sq;
    let ssr = if exact { 0.0 } else { raw_ssr };

    let n_f = n as f64;
    let dof = n - NUM_PARAMS;
    let dof_f = dof as f64;

    let r_squared = if exact || syy <= 0.0 { 1.0 } else { 1.0 - ssr / syy };
    let adjusted_r_squared = 1.0 - (1.0 - r_squared) * (n_f - 1.0) / dof_f;

    let sigma_sq = ssr / dof_f;
    let residual_std_error = sigma_sq.sqrt();
    let residual_std_dev = if exact { 0.0 } else { sample_std_dev(&residuals) };

    // ------------------------------------------------------------------
    // 3. Standard errors, t statistics, p-values
    // ------------------------------------------------------------------
    let alpha_se = (sigma_sq * (1.0 / n_f + x_mean * x_mean / sxx)).sqrt();
    let beta_se = (sigma_sq / sxx).sqrt();
    let alpha_est = parameter(alpha, alpha_se, dof, exact)?;
    let beta_est = parameter(beta, beta_se, dof, exact)?;

    // ------------------------------------------------------------------
    // 4. Diagnostics
    // ------------------------------------------------------------------
    let (f_statistic, f_p_value) = if exact {
        (None, None)
    } else {
        let f = (syy - ssr) / (ssr / dof_f);
        let p = FisherSnedecor::new(1.0, dof_f)
            .map(|d| 1.0 - d.cdf(f.max(0.0)))
            .ok();
        (Some(f), p)
    };

    // No autocorrelation and no distribution shape when the residuals vanish
    let durbin_watson = if exact { 2.0 } else { durbin_watson(&residuals) };

    let (jarque_bera, jarque_bera_p_value) = if exact {
        (None, None)
    } else {
        jarque_bera(&residuals)
    };

    let log_likelihood = if exact {
        None
    } else {
        Some(-n_f / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / n_f).ln() + 1.0))
    };
    let k = NUM_PARAMS as f64;
    let aic = log_likelihood.map(|ll| -2.0 * ll + 2.0 * k);
    let bic = log_likelihood.map(|ll| -2.0 * ll + k * n_f.ln());

    debug!(
        n,
        alpha,
        beta,
        r_squared,
        residual_std_error,
        "fitted CAPM regression"
    );

    Ok(CapmFit {
        alpha: alpha_est,
        beta: beta_est,
        n,
        dof,
        observations,
        fitted,
        residuals,
        residual_std_error,
        residual_std_dev,
        r_squared,
        adjusted_r_squared,
        f_statistic,
        f_p_value,
        durbin_watson,
        jarque_bera,
        jarque_bera_p_value,
        log_likelihood,
        aic,
        bic,
        mean_dependent: y_mean,
        mean_independent: x_mean,
    })
}

impl CapmFit {
    /// Confidence intervals for alpha and beta at the given level.
    pub fn conf_int(&self, level: f64) -> CapmResult<ParameterIntervals> {
        Ok(ParameterIntervals {
            alpha: confidence_interval(self.alpha.estimate, self.alpha.std_error, self.dof, level)?,
            beta: confidence_interval(self.beta.estimate, self.beta.std_error, self.dof, level)?,
        })
    }

    /// Model prediction `alpha + beta * x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.alpha.estimate + self.beta.estimate * x
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parameter(
    estimate: f64,
    std_error: f64,
    dof: usize,
    exact: bool,
) -> CapmResult<ParameterEstimate> {
    let (t_stat, p_value) = if !exact && std_error > 0.0 {
        let t = estimate / std_error;
        (Some(t), Some(two_sided_p_value(t, dof)?))
    } else {
        (None, None)
    };
    Ok(ParameterEstimate {
        estimate,
        std_error,
        t_stat,
        p_value,
    })
}

fn durbin_watson(residuals: &[f64]) -> f64 {
    let den: f64 = residuals.iter().map(|e| e * e).sum();
    if den <= 0.0 {
        return 2.0; // no autocorrelation when residuals are zero
    }
    let num: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    num / den
}

fn jarque_bera(residuals: &[f64]) -> (Option<f64>, Option<f64>) {
    let mut values = residuals.to_vec();
    let Ok(stats) = describe_values(&mut values) else {
        return (None, None);
    };
    let (Some(skew), Some(kurt)) = (stats.skewness, stats.kurtosis) else {
        return (None, None);
    };
    let n = residuals.len() as f64;
    let jb = n / 6.0 * (skew * skew + (kurt - 3.0).powi(2) / 4.0);
    let p = ChiSquared::new(2.0).map(|d| 1.0 - d.cdf(jb)).ok();
    (Some(jb), p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
