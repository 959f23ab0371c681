//! Placement of cluster-local blocks into full system matrices.

use ace_core::Cluster;
use nalgebra::DMatrix;

/// Embeds a `|cluster|²` block into an `n × n` matrix that is zero outside
/// the cluster's indices.
pub fn embed_in_full(sub: &DMatrix<f64>, cluster: &Cluster, n: usize) -> DMatrix<f64> {
    let mut full = DMatrix::<f64>::zeros(n, n);
    add_into_full(&mut full, sub, cluster, 1.0);
    full
}

/// Accumulates `sign * sub` into `full` at the cluster's indices.
pub fn add_into_full(full: &mut DMatrix<f64>, sub: &DMatrix<f64>, cluster: &Cluster, sign: f64) {
    let idx = cluster.indices();
    for (a, &i) in idx.iter().enumerate() {
        for (b, &j) in idx.iter().enumerate() {
            full[(i, j)] += sign * sub[(a, b)];
        }
    }
}

/// Accumulates `sign * sub[inner]` into `outer_block`, where `inner` is a
/// subset of `outer` and both blocks use their clusters' local coordinates.
pub fn add_into_block(
    outer_block: &mut DMatrix<f64>,
    outer: &Cluster,
    sub: &DMatrix<f64>,
    inner: &Cluster,
    sign: f64,
) {
    let positions: Vec<usize> = inner
        .indices()
        .iter()
        .filter_map(|&i| outer.position_of(i))
        .collect();
    debug_assert_eq!(positions.len(), inner.len());
    for (a, &pa) in positions.iter().enumerate() {
        for (b, &pb) in positions.iter().enumerate() {
            outer_block[(pa, pb)] += sign * sub[(a, b)];
        }
    }
}
