use clap::Args;
use serde::{Deserialize, Serialize};

use capm_core::analysis::AnalysisSettings;
use capm_core::density::DEFAULT_DENSITY_POINTS;
use capm_core::intervals::DEFAULT_CONFIDENCE_LEVEL;
use capm_core::simulation::DEFAULT_SEED;

use crate::input;

/// Run configuration, loaded from `--config` and overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Price table path (CSV or JSON)
    pub data: Option<String>,
    pub date_column: String,
    /// chrono format string for the date column
    pub date_format: String,
    pub market: String,
    pub stocks: Vec<String>,
    pub risk_free: String,
    pub dependent: String,
    pub confidence_level: f64,
    pub seed: u64,
    pub density_points: usize,
    pub describe_all: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data: None,
            date_column: "Date".into(),
            date_format: "%Y-%m-%d".into(),
            market: "SANDP".into(),
            stocks: ["FORD", "GE", "MICROSOFT", "ORACLE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            risk_free: "USTB3M".into(),
            dependent: "FORD".into(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            seed: DEFAULT_SEED,
            density_points: DEFAULT_DENSITY_POINTS,
            describe_all: false,
        }
    }
}

/// Data source arguments shared by every analysis subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Path to a CSV or JSON price table (JSON may also be piped on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a YAML or JSON run configuration
    #[arg(long)]
    pub config: Option<String>,

    /// Market index column
    #[arg(long)]
    pub market: Option<String>,

    /// Comma-separated stock columns (e.g. "FORD,GE")
    #[arg(long, value_delimiter = ',')]
    pub stocks: Option<Vec<String>>,

    /// Annualized risk-free yield column
    #[arg(long)]
    pub risk_free: Option<String>,

    /// Date column of the CSV input
    #[arg(long)]
    pub date_column: Option<String>,
}

impl RunConfig {
    /// Load the config file named by `--config` (if any) and apply flag overrides.
    pub fn resolve(args: &DataArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match args.config {
            Some(ref path) => input::file::read_structured::<RunConfig>(path)?,
            None => RunConfig::default(),
        };
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: &DataArgs) {
        if let Some(ref v) = args.input {
            self.data = Some(v.clone());
        }
        if let Some(ref v) = args.market {
            self.market = v.clone();
        }
        if let Some(ref v) = args.stocks {
            self.stocks = v.clone();
        }
        if let Some(ref v) = args.risk_free {
            self.risk_free = v.clone();
        }
        if let Some(ref v) = args.date_column {
            self.date_column = v.clone();
        }
    }

    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            dependent: self.dependent.clone(),
            confidence_level: self.confidence_level,
            seed: self.seed,
            density_points: self.density_points,
            describe_all: self.describe_all,
        }
    }
}
