use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::analyze::{self, AnalyzeArgs};
use tracing_subscriber::EnvFilter;

mod commands;
mod frame;

#[derive(Parser, Debug)]
#[command(name = "causa", about = "Causal discovery and effect estimation CLI")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Learn a causal graph from a CSV file and estimate a treatment effect.
    Analyze(AnalyzeArgs),
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Analyze(args) => analyze::run(&args),
    }
}
