//! Closed-form solutions for one- and two-variable clusters.

use ace_core::errors::{AceError, ErrorInfo};
use ace_core::Cluster;

/// Entropy (nats) of a single binary variable with activation frequency `p`.
pub fn binary_entropy(p: f64) -> f64 {
    -p * p.ln() - (1.0 - p) * (1.0 - p).ln()
}

/// Field term `-ln(p / (1 - p))` reproducing frequency `p` in isolation.
pub fn field_from_frequency(p: f64) -> f64 {
    -(p / (1.0 - p)).ln()
}

/// Fails when a frequency sits on the boundary of `(0, 1)`, where the closed
/// forms produce infinite fields.
pub fn check_frequency(cluster: &Cluster, index: usize, p: f64) -> Result<(), AceError> {
    if p > 0.0 && p < 1.0 {
        return Ok(());
    }
    Err(AceError::Numerical(
        ErrorInfo::new(
            "degenerate-frequency",
            "single-variable frequency must lie strictly inside (0, 1)",
        )
        .with_context("cluster", cluster.to_string())
        .with_context("index", index.to_string())
        .with_context("p", p.to_string())
        .with_hint("use a positive prior strength or drop constant variables"),
    ))
}

/// Fails unless all four joint states of a pair have positive probability.
pub fn check_pair(
    cluster: &Cluster,
    (i, j): (usize, usize),
    pi: f64,
    pj: f64,
    pij: f64,
) -> Result<(), AceError> {
    let joint = [pij, pi - pij, pj - pij, 1.0 - pi - pj + pij];
    if joint.iter().all(|&p| p > 0.0) {
        return Ok(());
    }
    Err(AceError::Numerical(
        ErrorInfo::new(
            "degenerate-pair",
            "pair statistics leave a joint state with zero probability; coupling diverges",
        )
        .with_context("cluster", cluster.to_string())
        .with_context("pair", format!("({i},{j})"))
        .with_context("p_i", pi.to_string())
        .with_context("p_j", pj.to_string())
        .with_context("p_ij", pij.to_string()),
    ))
}

/// Pairwise analytic formula for a two-variable cluster.
///
/// Returns the 2×2 interaction block with fields on the diagonal and half of
/// the pair coupling on each off-diagonal entry, so that `E(s) = sᵀ J s`.
pub fn pair_interactions(pi: f64, pj: f64, pij: f64) -> [[f64; 2]; 2] {
    let empty = 1.0 - pi - pj + pij;
    let jii = -((pi - pij) / empty).ln();
    let jjj = -((pj - pij) / empty).ln();
    let jij = -pij.ln() + (pi - pij).ln() + (pj - pij).ln() - empty.ln();
    [[jii, 0.5 * jij], [0.5 * jij, jjj]]
}
