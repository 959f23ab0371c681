use ace_analytic::{AnalyticSolver, ClusterSolver};
use ace_core::{AceError, CoocMatrix, SampleMatrix};
use nalgebra::DMatrix;
use tracing::info;

use crate::assemble::{assemble, IsingParams};
use crate::config::AceConfig;
use crate::decompose::Decomposer;
use crate::grow::{grow, GrowthOutcome};
use crate::registry::ClusterRegistry;

/// Model produced by one expansion at a fixed threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Entropy estimate: reference entropy plus retained contributions.
    pub entropy: f64,
    /// Spin-convention parameters.
    pub params: IsingParams,
    /// Full interaction matrix in the internal `sᵀ J s` convention.
    pub interactions: DMatrix<f64>,
    /// Retained generations and the truncation flag.
    pub growth: GrowthOutcome,
}

/// A [`Solution`] together with the registry it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// The fitted model.
    pub solution: Solution,
    /// Every cluster evaluated during growth, retained or not.
    pub registry: ClusterRegistry,
}

/// Fits spin-convention parameters to `samples`.
pub fn solve(samples: &SampleMatrix, config: &AceConfig) -> Result<IsingParams, AceError> {
    Ok(solve_full(samples, config)?.solution.params)
}

/// Fits `samples` and returns the model with its generations and registry.
pub fn solve_full(samples: &SampleMatrix, config: &AceConfig) -> Result<Expansion, AceError> {
    config.validate()?;
    let cooc = CoocMatrix::from_samples(samples)?;
    let mut registry = ClusterRegistry::new(cooc.dim(), config.reference_mode()?);
    let solver = AnalyticSolver::new(config.analytic_opts());
    let solution = solve_cooc(&cooc, config, &solver, &mut registry)?;
    Ok(Expansion { solution, registry })
}

/// Runs the expansion on precomputed statistics with a caller-owned registry.
///
/// The registry may already hold contributions from an earlier threshold on
/// the same statistics. It must match the system size, the configured
/// reference, the solver's coupling prior and the statistics themselves.
pub fn solve_cooc<S: ClusterSolver>(
    cooc: &CoocMatrix,
    config: &AceConfig,
    solver: &S,
    registry: &mut ClusterRegistry,
) -> Result<Solution, AceError> {
    config.validate()?;
    let reference = config.reference_mode()?;
    let variables = config.variables(cooc.dim())?;
    let decomposer = Decomposer::new(cooc, solver, reference);
    registry.ensure_compatible(decomposer.key())?;
    info!(
        dim = cooc.dim(),
        variables = variables.len(),
        threshold = config.threshold,
        reference = reference.label(),
        "starting cluster expansion"
    );

    let growth = grow(
        &decomposer,
        registry,
        &variables,
        config.threshold,
        config.max_cluster_size,
    )?;
    let (entropy, interactions) = assemble(&decomposer, registry, &variables, &growth)?;
    let params = IsingParams::from_interactions(&interactions);
    info!(
        entropy,
        clusters = growth.num_clusters(),
        max_cluster_size = growth.max_cluster_size(),
        truncated = growth.truncated,
        "cluster expansion finished"
    );
    Ok(Solution {
        entropy,
        params,
        interactions,
        growth,
    })
}
