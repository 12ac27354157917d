mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::history::HistoryCommand;
use commands::prepayment::PrepayArgs;
use commands::rates::ConvertRateArgs;
use commands::simulation::{CompareArgs, SimulateArgs};
use config::CliConfig;

/// PRICE and SAC loan amortization simulator
#[derive(Parser)]
#[command(
    name = "loansim",
    version,
    about = "PRICE and SAC loan amortization simulator",
    long_about = "A CLI for simulating loan amortization schedules with decimal precision. \
                  Supports PRICE (level payment) and SAC (constant amortization) schedules, \
                  method comparison, rate conversion, prepayment recalculation and a \
                  local history of saved simulations."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Saved-simulation history file
    #[arg(long, env = "LOANSIM_STORE", global = true)]
    store: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a PRICE or SAC amortization schedule
    Simulate(SimulateArgs),
    /// Compare PRICE and SAC for the same loan terms
    Compare(CompareArgs),
    /// Recalculate a schedule after one or more prepayments
    Prepay(PrepayArgs),
    /// Convert between effective monthly and annual rates
    ConvertRate(ConvertRateArgs),
    /// Saved simulations
    #[command(subcommand)]
    History(HistoryCommand),
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

/// Diagnostics go to stderr so they never mix with command output.
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.store, cli.log_level);
    init_tracing(&config);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args, &config),
        Commands::Compare(args) => commands::simulation::run_compare(args),
        Commands::Prepay(args) => commands::prepayment::run_prepay(args, &config),
        Commands::ConvertRate(args) => commands::rates::run_convert_rate(args),
        Commands::History(cmd) => commands::history::run_history(cmd, &config),
        Commands::Version => Ok(serde_json::json!({
            "name": "loansim",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "PRICE and SAC loan amortization simulator",
        })),
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
