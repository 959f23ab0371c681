#![deny(missing_docs)]
#![doc = "Small-cluster solvers used by the adaptive cluster expansion: closed forms, exact fits by enumeration, and reference models."]

/// Closed-form one- and two-variable solutions.
pub mod closed;
/// Cluster-to-system embedding helpers.
pub mod embed;
/// Exact observables by state enumeration.
pub mod enumerate;
/// Exact regularised cluster fits.
pub mod exact;
/// Independent and mean-field reference models.
pub mod reference;
/// Cluster solver trait and the default analytic implementation.
pub mod solver;

pub use closed::{binary_entropy, field_from_frequency, pair_interactions};
pub use embed::{add_into_block, add_into_full, embed_in_full};
pub use enumerate::{cooccurrences_of, entropy_of, MAX_ENUMERATION};
pub use reference::{independent_reference, mean_field_reference};
pub use solver::{
    prior_lambda, AnalyticOpts, AnalyticSolver, ClusterFit, ClusterSolver, MAX_EXACT_CLUSTER,
};
