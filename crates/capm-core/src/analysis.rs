use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::density::{
    compare_densities, fitted_line, DensityComparison, FittedLine, DEFAULT_DENSITY_POINTS,
};
use crate::error::CapmError;
use crate::intervals::DEFAULT_CONFIDENCE_LEVEL;
use crate::prices::PriceTable;
use crate::regression::{fit_capm, CapmFit, ParameterIntervals};
use crate::returns::{derive_return_table, ReturnTable};
use crate::simulation::{simulate_from_fit, DEFAULT_SEED};
use crate::statistics::{describe, NamedSummary, SummaryStatistics};
use crate::types::{with_metadata, ComputationOutput, Series};
use crate::CapmResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Knobs of a full analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Stock whose excess return is regressed on the market's
    pub dependent: String,
    /// Confidence level for parameter intervals (default 0.95)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Seed for the residual simulation (default 1234)
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Grid size of the density comparison
    #[serde(default = "default_density_points")]
    pub density_points: usize,
    /// Summarise every instrument, not only the dependent and the market
    #[serde(default)]
    pub describe_all: bool,
}

fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_density_points() -> usize {
    DEFAULT_DENSITY_POINTS
}

impl AnalysisSettings {
    pub fn new(dependent: impl Into<String>) -> Self {
        AnalysisSettings {
            dependent: dependent.into(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            seed: DEFAULT_SEED,
            density_points: DEFAULT_DENSITY_POINTS,
            describe_all: false,
        }
    }
}

/// Input for `run_capm_analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapmAnalysisInput {
    pub prices: PriceTable,
    #[serde(flatten)]
    pub settings: AnalysisSettings,
}

/// Everything the analysis derives from the price table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapmAnalysisOutput {
    pub dependent: String,
    pub market: String,
    pub periods: usize,
    pub returns: ReturnTable,
    pub summaries: Vec<NamedSummary>,
    pub fit: CapmFit,
    pub intervals: ParameterIntervals,
    /// Simulated dependent excess returns, aligned with `returns.dates`
    pub simulated: Series,
    pub simulated_summary: SummaryStatistics,
    pub densities: DensityComparison,
    pub fitted_line: FittedLine,
}

/// Fewer fitted observations than this triggers a warning.
const RECOMMENDED_OBSERVATIONS: usize = 36;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full CAPM analysis: returns, excess returns, summaries,
/// regression, intervals, residual simulation and density comparison.
pub fn run_capm_analysis(
    input: &CapmAnalysisInput,
) -> CapmResult<ComputationOutput<CapmAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let settings = &input.settings;
    let table = &input.prices;

    // ------------------------------------------------------------------
    // 1. Validate
    // ------------------------------------------------------------------
    if !table.stocks.iter().any(|s| *s == settings.dependent) {
        return Err(CapmError::invalid(
            "dependent",
            format!(
                "'{}' is not one of the stock columns ({})",
                settings.dependent,
                table.stocks.join(", ")
            ),
        ));
    }

    // ------------------------------------------------------------------
    // 2. Returns & excess returns
    // ------------------------------------------------------------------
    let returns = derive_return_table(table)?;
    let dependent = returns.excess(&settings.dependent)?;
    let market = returns.excess(&table.market)?;

    // ------------------------------------------------------------------
    // 3. Summary statistics
    // ------------------------------------------------------------------
    let summaries = returns
        .instruments
        .iter()
        .filter(|i| {
            settings.describe_all || i.name == settings.dependent || i.name == table.market
        })
        .map(|i| {
            Ok(NamedSummary {
                name: i.name.clone(),
                statistics: describe(&i.excess_returns)?,
            })
        })
        .collect::<CapmResult<Vec<_>>>()?;

    // ------------------------------------------------------------------
    // 4. Regression & intervals
    // ------------------------------------------------------------------
    let fit = fit_capm(dependent, market)?;
    let intervals = fit.conf_int(settings.confidence_level)?;

    // ------------------------------------------------------------------
    // 5. Residual simulation & density comparison
    // ------------------------------------------------------------------
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let simulated = simulate_from_fit(&fit, market, &mut rng)?;
    let simulated_summary = describe(&simulated)?;
    let densities = compare_densities(dependent, &simulated, settings.density_points)?;
    let line = fitted_line(&fit, dependent, market);

    debug!(
        dependent = %settings.dependent,
        market = %table.market,
        n = fit.n,
        "completed CAPM analysis"
    );

    // ------------------------------------------------------------------
    // 6. Warnings
    // ------------------------------------------------------------------
    if fit.n < RECOMMENDED_OBSERVATIONS {
        warnings.push(format!(
            "Only {} observations: fewer than recommended {} for robust estimates",
            fit.n, RECOMMENDED_OBSERVATIONS
        ));
    }
    if fit.r_squared < 0.5 {
        warnings.push(format!(
            "Low R-squared ({:.4}): the market explains less than half the variance",
            fit.r_squared
        ));
    }
    if fit.durbin_watson < 1.5 || fit.durbin_watson > 2.5 {
        warnings.push(format!(
            "Durbin-Watson statistic ({:.4}) indicates possible autocorrelation in residuals",
            fit.durbin_watson
        ));
    }
    for w in &warnings {
        warn!("{}", w);
    }

    // ------------------------------------------------------------------
    // 7. Assemble output
    // ------------------------------------------------------------------
    let output = CapmAnalysisOutput {
        dependent: settings.dependent.clone(),
        market: table.market.clone(),
        periods: table.len(),
        returns,
        summaries,
        fit,
        intervals,
        simulated,
        simulated_summary,
        densities,
        fitted_line: line,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CAPM OLS regression of log excess returns with residual Monte Carlo",
        &serde_json::json!({
            "dependent": settings.dependent,
            "market": table.market,
            "return_definition": "100 * ln(p_t / p_{t-1})",
            "risk_free_conversion": "annual yield / 12",
            "confidence_level": settings.confidence_level,
            "seed": settings.seed,
            "density_bandwidth": "scott",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
