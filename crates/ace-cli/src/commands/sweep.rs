use std::error::Error;
use std::path::PathBuf;

use ace_core::CoocMatrix;
use ace_expand::{sweep, SweepReport};
use clap::Args;

use super::io::{load_config, read_samples, write_json, Basis};
use crate::init_tracing;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Header-less CSV with one sample per row.
    #[arg(long)]
    pub samples: PathBuf,
    /// Encoding of the sample file.
    #[arg(long, value_enum, default_value_t = Basis::Spin)]
    pub basis: Basis,
    /// YAML configuration; the `sweep` section controls the thresholds.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for `sweep_report.json` and `params.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Log each generation and sweep step.
    #[arg(long)]
    pub verbose: bool,
    /// Log each cluster evaluation.
    #[arg(long)]
    pub very_verbose: bool,
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(args.config.as_deref(), None, Some(1e-2))?;
    config.verbose |= args.verbose;
    config.very_verbose |= args.very_verbose;
    init_tracing(config.verbose, config.very_verbose);

    let samples = read_samples(&args.samples, args.basis)?;
    if config.num_samples.is_none() {
        config.num_samples = Some(samples.len());
    }
    let cooc = CoocMatrix::from_samples(&samples)?;
    let outcome = sweep(&cooc, &config)?;
    let report = SweepReport::new(&outcome, &config)?;
    write_json(&args.out.join("sweep_report.json"), &report)?;
    write_json(&args.out.join("params.json"), &outcome.selected_step().params)?;
    println!(
        "{:?} threshold={} clusters={}",
        outcome.stop,
        outcome.selected_step().threshold,
        outcome.selected_step().num_clusters
    );
    Ok(())
}
