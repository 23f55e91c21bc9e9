mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::AnalyzeArgs;
use commands::regression::{FitArgs, SimulateArgs};
use commands::returns::{DescribeArgs, ReturnsArgs};

/// CAPM excess-return regression analysis
#[derive(Parser)]
#[command(
    name = "capm",
    version,
    about = "CAPM excess-return regression analysis",
    long_about = "Computes log returns and excess returns from monthly price levels, \
                  descriptive statistics, the OLS regression of a stock's excess return \
                  on the market's, parameter confidence intervals and a seeded residual \
                  Monte Carlo of the fitted model."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log returns and excess returns per period
    Returns(ReturnsArgs),
    /// Descriptive statistics of excess returns
    Describe(DescribeArgs),
    /// Fit the CAPM regression with confidence intervals
    Fit(FitArgs),
    /// Simulate excess returns from the fitted model
    Simulate(SimulateArgs),
    /// Run the full analysis (statistics, fit, simulation, densities)
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Returns(args) => commands::returns::run_returns(args),
        Commands::Describe(args) => commands::returns::run_describe(args),
        Commands::Fit(args) => commands::regression::run_fit(args),
        Commands::Simulate(args) => commands::regression::run_simulate(args),
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Version => {
            println!("capm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
