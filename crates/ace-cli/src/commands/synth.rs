use std::error::Error;
use std::path::PathBuf;

use ace_core::synth::{chain_samples, independent_samples};
use ace_core::RngHandle;
use clap::Args;

use super::io::{write_samples, Basis};

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Number of variables in a correlated chain.
    #[arg(long, default_value_t = 6, conflicts_with = "freqs")]
    pub variables: usize,
    /// Activation frequency of chain variables.
    #[arg(long, default_value_t = 0.4)]
    pub base: f64,
    /// Probability that a chain variable copies its predecessor.
    #[arg(long, default_value_t = 0.3)]
    pub coupling: f64,
    /// Independent variables with these frequencies instead of a chain.
    #[arg(long, value_delimiter = ',')]
    pub freqs: Option<Vec<f64>>,
    #[arg(long, default_value_t = 1000)]
    pub count: usize,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Replicate index; each replicate draws from its own substream of `seed`.
    #[arg(long, default_value_t = 0)]
    pub replicate: u64,
    #[arg(long, value_enum, default_value_t = Basis::Spin)]
    pub basis: Basis,
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &SynthArgs) -> Result<(), Box<dyn Error>> {
    let mut rng = RngHandle::substream(args.seed, args.replicate);
    let samples = match &args.freqs {
        Some(freqs) => independent_samples(freqs, args.count, &mut rng)?,
        None => chain_samples(args.variables, args.base, args.coupling, args.count, &mut rng)?,
    };
    write_samples(&args.out, &samples, args.basis)
}
