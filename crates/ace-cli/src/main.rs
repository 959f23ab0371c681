use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    solve::{self, SolveArgs},
    sweep::{self, SweepArgs},
    synth::{self, SynthArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ace", about = "Adaptive cluster expansion for pairwise binary models")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit fields and couplings to a sample file at a fixed threshold.
    Solve(SolveArgs),
    /// Sweep decreasing thresholds until the model reproduces the data.
    Sweep(SweepArgs),
    /// Write synthetic samples for testing and benchmarking.
    Synth(SynthArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Solve(args) => solve::run(&args),
        Command::Sweep(args) => sweep::run(&args),
        Command::Synth(args) => synth::run(&args),
    }
}

/// Installs the global subscriber; `RUST_LOG` takes precedence over the flags.
pub(crate) fn init_tracing(verbose: bool, very_verbose: bool) {
    let level = if very_verbose {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
