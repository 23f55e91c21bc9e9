use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;

use capm_core::regression::fit_capm;
use capm_core::returns::derive_return_table;
use capm_core::simulation::simulate_seeded;
use capm_core::with_metadata;

use crate::commands::load_table;
use crate::config::{DataArgs, RunConfig};

/// Arguments for the CAPM regression
#[derive(Args)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Stock regressed on the market (default from config: FORD)
    #[arg(long)]
    pub dependent: Option<String>,

    /// Confidence level for parameter intervals (e.g. 0.95 for 95%)
    #[arg(long)]
    pub confidence: Option<f64>,
}

/// Arguments for the residual Monte Carlo
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Stock regressed on the market (default from config: FORD)
    #[arg(long)]
    pub dependent: Option<String>,

    /// Seed for the noise generator
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct FitReport {
    dependent: String,
    market: String,
    n: usize,
    dof: usize,
    alpha: f64,
    alpha_std_error: f64,
    alpha_t_stat: Option<f64>,
    alpha_p_value: Option<f64>,
    alpha_ci_lower: f64,
    alpha_ci_upper: f64,
    beta: f64,
    beta_std_error: f64,
    beta_t_stat: Option<f64>,
    beta_p_value: Option<f64>,
    beta_ci_lower: f64,
    beta_ci_upper: f64,
    confidence_level: f64,
    r_squared: f64,
    adjusted_r_squared: f64,
    residual_std_error: f64,
    residual_std_dev: f64,
    f_statistic: Option<f64>,
    f_p_value: Option<f64>,
    durbin_watson: f64,
    jarque_bera: Option<f64>,
    jarque_bera_p_value: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
}

pub fn run_fit(args: FitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut config = RunConfig::resolve(&args.data)?;
    if let Some(ref d) = args.dependent {
        config.dependent = d.clone();
    }
    if let Some(c) = args.confidence {
        config.confidence_level = c;
    }

    let table = load_table(&config)?;
    let rt = derive_return_table(&table)?;
    let fit = fit_capm(rt.excess(&config.dependent)?, rt.excess(&table.market)?)?;
    let ci = fit.conf_int(config.confidence_level)?;

    let report = FitReport {
        dependent: config.dependent.clone(),
        market: table.market.clone(),
        n: fit.n,
        dof: fit.dof,
        alpha: fit.alpha.estimate,
        alpha_std_error: fit.alpha.std_error,
        alpha_t_stat: fit.alpha.t_stat,
        alpha_p_value: fit.alpha.p_value,
        alpha_ci_lower: ci.alpha.lower,
        alpha_ci_upper: ci.alpha.upper,
        beta: fit.beta.estimate,
        beta_std_error: fit.beta.std_error,
        beta_t_stat: fit.beta.t_stat,
        beta_p_value: fit.beta.p_value,
        beta_ci_lower: ci.beta.lower,
        beta_ci_upper: ci.beta.upper,
        confidence_level: config.confidence_level,
        r_squared: fit.r_squared,
        adjusted_r_squared: fit.adjusted_r_squared,
        residual_std_error: fit.residual_std_error,
        residual_std_dev: fit.residual_std_dev,
        f_statistic: fit.f_statistic,
        f_p_value: fit.f_p_value,
        durbin_watson: fit.durbin_watson,
        jarque_bera: fit.jarque_bera,
        jarque_bera_p_value: fit.jarque_bera_p_value,
        log_likelihood: fit.log_likelihood,
        aic: fit.aic,
        bic: fit.bic,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "CAPM OLS regression of excess returns (closed form)",
        &serde_json::json!({
            "dependent": config.dependent,
            "market": table.market,
            "confidence_level": config.confidence_level,
        }),
        Vec::new(),
        elapsed,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

/// One row per period with the market and observed excess returns and the
/// simulated dependent excess return.
pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = RunConfig::resolve(&args.data)?;
    if let Some(ref d) = args.dependent {
        config.dependent = d.clone();
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }

    let table = load_table(&config)?;
    let rt = derive_return_table(&table)?;
    let dependent = rt.excess(&config.dependent)?;
    let market = rt.excess(&table.market)?;
    let fit = fit_capm(dependent, market)?;
    let simulated = simulate_seeded(
        fit.alpha.estimate,
        fit.beta.estimate,
        market,
        fit.residual_std_dev,
        config.seed,
    )?;

    let rows: Vec<Value> = rt
        .dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let mut row = Map::new();
            row.insert("date".into(), Value::String(date.to_string()));
            row.insert(
                format!("retexc_{}", table.market),
                serde_json::to_value(market[i]).unwrap_or(Value::Null),
            );
            row.insert(
                format!("retexc_{}", config.dependent),
                serde_json::to_value(dependent[i]).unwrap_or(Value::Null),
            );
            row.insert(
                format!("retexc_{}_sim", config.dependent),
                serde_json::to_value(simulated[i]).unwrap_or(Value::Null),
            );
            Value::Object(row)
        })
        .collect();

    Ok(Value::Array(rows))
}
