#![deny(missing_docs)]
#![doc = "Adaptive cluster expansion for the inverse Ising problem: recursive entropy decomposition, threshold-driven cluster growth and model assembly."]

/// Model assembly and spin-convention parameters.
pub mod assemble;
/// Solver configuration.
pub mod config;
/// Recursive cluster entropy decomposition.
pub mod decompose;
/// Adaptive cluster growth.
pub mod grow;
/// Stable hashing helpers.
pub mod hash;
/// Reference model selection.
pub mod reference;
/// Memoized cluster contributions.
pub mod registry;
/// Serializable run summaries.
pub mod report;
/// Canonical JSON and YAML helpers.
pub mod serde;
/// Expansion entry points.
pub mod solve;
/// Subset enumeration.
pub mod subsets;
/// Decreasing-threshold sweeps.
pub mod sweep;

pub use assemble::{assemble, IsingParams};
pub use config::{AceConfig, FitNumerics, ResidualWeighting, SweepConfig};
pub use decompose::Decomposer;
pub use grow::{grow, Generation, GrowthOutcome};
pub use reference::ReferenceMode;
pub use registry::{ClusterRegistry, Contribution, MemoKey};
pub use report::{ContributionRecord, SolveReport, SweepReport, REPORT_SCHEMA};
pub use solve::{solve, solve_cooc, solve_full, Expansion, Solution};
pub use subsets::{binomial, subsets};
pub use sweep::{
    log_thresholds, residual_errors, sweep, ResidualErrors, SweepOutcome, SweepStep, SweepStop,
};
