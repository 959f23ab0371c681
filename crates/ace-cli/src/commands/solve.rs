use std::error::Error;
use std::path::PathBuf;

use ace_expand::{solve_full, SolveReport};
use clap::Args;
use tracing::info;

use super::io::{load_config, read_samples, write_json, Basis};
use crate::init_tracing;

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Header-less CSV with one sample per row.
    #[arg(long)]
    pub samples: PathBuf,
    /// Encoding of the sample file.
    #[arg(long, value_enum, default_value_t = Basis::Spin)]
    pub basis: Basis,
    /// YAML solver configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides the configured threshold.
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Output directory for `report.json` and `params.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Log each generation.
    #[arg(long)]
    pub verbose: bool,
    /// Log each cluster evaluation.
    #[arg(long)]
    pub very_verbose: bool,
}

pub fn run(args: &SolveArgs) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(args.config.as_deref(), args.threshold, None)?;
    config.verbose |= args.verbose;
    config.very_verbose |= args.very_verbose;
    init_tracing(config.verbose, config.very_verbose);

    let samples = read_samples(&args.samples, args.basis)?;
    if config.num_samples.is_none() {
        config.num_samples = Some(samples.len());
    }
    info!(samples = samples.len(), variables = samples.dim(), "loaded samples");

    let expansion = solve_full(&samples, &config)?;
    let report = SolveReport::new(&expansion, &config)?;
    write_json(&args.out.join("report.json"), &report)?;
    write_json(&args.out.join("params.json"), &expansion.solution.params)?;
    println!("{}", report.hash);
    Ok(())
}
