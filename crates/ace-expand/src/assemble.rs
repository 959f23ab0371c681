use ace_analytic::{add_into_full, embed_in_full, ClusterSolver};
use ace_core::{AceError, Cluster};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::decompose::Decomposer;
use crate::grow::GrowthOutcome;
use crate::registry::ClusterRegistry;

/// Reference model over `variables` plus every retained contribution.
///
/// Returns the entropy estimate and the full `n × n` interaction matrix in
/// the internal `sᵀ J s` convention.
pub fn assemble<S: ClusterSolver>(
    decomposer: &Decomposer<'_, S>,
    registry: &mut ClusterRegistry,
    variables: &Cluster,
    growth: &GrowthOutcome,
) -> Result<(f64, DMatrix<f64>), AceError> {
    let n = decomposer.cooc().dim();
    let reference = decomposer.reference().fit(decomposer.cooc(), variables)?;
    let mut entropy = reference.entropy;
    let mut interactions = embed_in_full(&reference.interactions, variables, n);
    for cluster in growth.clusters() {
        let part = decomposer.delta_s(cluster, registry)?;
        entropy += part.entropy;
        add_into_full(&mut interactions, &part.interactions, cluster, 1.0);
    }
    Ok((entropy, interactions))
}

/// Fields and couplings in the `{-1, +1}` spin convention shared by the
/// solver family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingParams {
    /// One field per variable.
    pub fields: Vec<f64>,
    /// Pair couplings for `i < j` in row-major order.
    pub couplings: Vec<f64>,
}

fn pair_index(n: usize, i: usize, j: usize) -> usize {
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    i * n - i * (i + 1) / 2 + (j - i - 1)
}

impl IsingParams {
    /// Converts an internal interaction matrix into spin-convention parameters.
    ///
    /// With `h = -diag(J)` and `K_ij = -2 J_ij` (the `{0, 1}` fields and
    /// couplings), the spin parameters are `h/2 + Σ_j K_ij/4` and `K/4`.
    pub fn from_interactions(interactions: &DMatrix<f64>) -> Self {
        let n = interactions.nrows();
        let mut zero_one = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                zero_one.push(-interactions[(i, j)] * 2.0);
            }
        }
        let fields = (0..n)
            .map(|i| {
                let h = -interactions[(i, i)];
                let row: f64 = (0..n)
                    .map(|j| if i == j { 0.0 } else { zero_one[pair_index(n, i, j)] })
                    .sum();
                h / 2.0 + row / 4.0
            })
            .collect();
        let couplings = zero_one.iter().map(|k| k / 4.0).collect();
        Self { fields, couplings }
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.fields.len()
    }

    /// Spin coupling between `i` and `j` (`i != j`).
    pub fn coupling(&self, i: usize, j: usize) -> f64 {
        self.couplings[pair_index(self.dim(), i, j)]
    }

    /// Flattened `[fields..., couplings...]` multiplier vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.fields
            .iter()
            .chain(self.couplings.iter())
            .copied()
            .collect()
    }

    /// Converts back to `{0, 1}` fields and couplings: `2(h - Σ_j J_ij)` and `4J`.
    pub fn to_zero_one(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.dim();
        let fields = (0..n)
            .map(|i| {
                let row: f64 = (0..n)
                    .map(|j| if i == j { 0.0 } else { self.coupling(i, j) })
                    .sum();
                2.0 * (self.fields[i] - row)
            })
            .collect();
        let couplings = self.couplings.iter().map(|j| j * 4.0).collect();
        (fields, couplings)
    }
}
