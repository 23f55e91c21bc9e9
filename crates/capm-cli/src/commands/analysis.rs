use clap::Args;
use serde_json::Value;

use capm_core::analysis::{self, CapmAnalysisInput};

use crate::commands::load_table;
use crate::config::{DataArgs, RunConfig};

/// Arguments for the end-to-end CAPM analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Stock regressed on the market (default from config: FORD)
    #[arg(long)]
    pub dependent: Option<String>,

    /// Seed for the residual simulation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Confidence level for parameter intervals
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Number of grid points for the density comparison
    #[arg(long)]
    pub density_points: Option<usize>,

    /// Summarise every instrument instead of only the dependent and market
    #[arg(long)]
    pub describe_all: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = RunConfig::resolve(&args.data)?;
    if let Some(ref d) = args.dependent {
        config.dependent = d.clone();
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }
    if let Some(c) = args.confidence {
        config.confidence_level = c;
    }
    if let Some(p) = args.density_points {
        config.density_points = p;
    }
    if args.describe_all {
        config.describe_all = true;
    }

    let input = CapmAnalysisInput {
        prices: load_table(&config)?,
        settings: config.settings(),
    };
    let result = analysis::run_capm_analysis(&input)?;
    Ok(serde_json::to_value(result)?)
}
