//! Reference models that cluster contributions are measured against.

use ace_core::errors::{AceError, ErrorInfo};
use ace_core::{Cluster, CoocMatrix};
use nalgebra::DMatrix;

use crate::closed::{binary_entropy, check_frequency, field_from_frequency};
use crate::solver::ClusterFit;

/// Independent-variable reference: summed single-variable entropies and a
/// diagonal interaction block of fields.
pub fn independent_reference(cooc: &CoocMatrix, cluster: &Cluster) -> Result<ClusterFit, AceError> {
    let k = cluster.len();
    let mut interactions = DMatrix::<f64>::zeros(k, k);
    let mut entropy = 0.0;
    for (pos, &index) in cluster.indices().iter().enumerate() {
        let p = cooc.frequency(index);
        check_frequency(cluster, index, p)?;
        interactions[(pos, pos)] = field_from_frequency(p);
        entropy += binary_entropy(p);
    }
    Ok(ClusterFit {
        entropy,
        interactions,
    })
}

fn singular(cluster: &Cluster, what: &str) -> AceError {
    AceError::Numerical(
        ErrorInfo::new(
            "singular-correlation",
            format!("mean-field reference: {what}"),
        )
        .with_context("cluster", cluster.to_string())
        .with_hint("increase the mean-field prior strength"),
    )
}

/// Naive mean-field reference with a diagonal regulariser `lambda` on the
/// connected correlation matrix.
///
/// Entropy is `Σ S(p_i) + ½ ln det M` with `M` the normalised regularised
/// correlation matrix; couplings come from `-C̃⁻¹` and fields from the
/// mean-field self-consistency equations. Singletons reduce exactly to
/// [`independent_reference`].
pub fn mean_field_reference(
    cooc: &CoocMatrix,
    cluster: &Cluster,
    lambda: f64,
) -> Result<ClusterFit, AceError> {
    let base = independent_reference(cooc, cluster)?;
    let k = cluster.len();
    if k < 2 {
        return Ok(base);
    }
    let idx = cluster.indices();
    let freqs: Vec<f64> = idx.iter().map(|&i| cooc.frequency(i)).collect();
    let mut connected = DMatrix::<f64>::from_fn(k, k, |a, b| {
        if a == b {
            freqs[a] * (1.0 - freqs[a])
        } else {
            cooc.pair(idx[a], idx[b]) - freqs[a] * freqs[b]
        }
    });
    for a in 0..k {
        connected[(a, a)] += lambda;
    }

    let scale: Vec<f64> = (0..k).map(|a| connected[(a, a)].sqrt()).collect();
    let normalised = DMatrix::<f64>::from_fn(k, k, |a, b| connected[(a, b)] / (scale[a] * scale[b]));
    let chol = normalised
        .cholesky()
        .ok_or_else(|| singular(cluster, "normalised correlation is not positive definite"))?;
    let log_det: f64 = 2.0 * chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    let inverse = connected
        .cholesky()
        .ok_or_else(|| singular(cluster, "correlation matrix is not invertible"))?
        .inverse();

    let mut interactions = DMatrix::<f64>::zeros(k, k);
    for a in 0..k {
        let mut h = -field_from_frequency(freqs[a]);
        for b in 0..k {
            if a != b {
                // K_ab = -inverse[(a, b)]
                let inv = 0.5 * (inverse[(a, b)] + inverse[(b, a)]);
                h += inv * freqs[b];
                interactions[(a, b)] = 0.5 * inv;
            }
        }
        interactions[(a, a)] = -h;
    }

    let entropy = base.entropy + 0.5 * log_det;
    if !entropy.is_finite() || interactions.iter().any(|v| !v.is_finite()) {
        return Err(singular(cluster, "non-finite reference"));
    }
    Ok(ClusterFit {
        entropy,
        interactions,
    })
}
