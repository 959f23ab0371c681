//! Exact observables of small pairwise models by full state enumeration.

use ace_core::errors::{AceError, ErrorInfo};
use nalgebra::DMatrix;

/// Largest model that will be enumerated exhaustively (2^n states).
pub const MAX_ENUMERATION: usize = 20;

pub(crate) fn check_enumerable(n: usize) -> Result<(), AceError> {
    if n <= MAX_ENUMERATION {
        return Ok(());
    }
    Err(AceError::Unsupported(
        ErrorInfo::new(
            "enumeration-too-large",
            "exact enumeration is limited to small models",
        )
        .with_context("n", n.to_string())
        .with_context("max", MAX_ENUMERATION.to_string()),
    ))
}

/// Log-weight `-sᵀ J s` of every state, indexed by bitmask.
fn log_weights(j: &DMatrix<f64>) -> Vec<f64> {
    let n = j.nrows();
    (0..1usize << n)
        .map(|mask| {
            let mut energy = 0.0;
            for a in 0..n {
                if mask & (1 << a) == 0 {
                    continue;
                }
                energy += j[(a, a)];
                for b in (a + 1)..n {
                    if mask & (1 << b) != 0 {
                        energy += 2.0 * j[(a, b)];
                    }
                }
            }
            -energy
        })
        .collect()
}

pub(crate) fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn non_finite(what: &str) -> AceError {
    AceError::numerical(
        "non-finite-model",
        format!("{what} is not finite for the supplied interaction matrix"),
    )
}

/// Exact entropy (nats) of the model `P(s) ∝ exp(-sᵀ J s)` over `s ∈ {0,1}ⁿ`.
pub fn entropy_of(j: &DMatrix<f64>) -> Result<f64, AceError> {
    check_enumerable(j.nrows())?;
    let weights = log_weights(j);
    let log_z = log_sum_exp(&weights);
    if !log_z.is_finite() {
        return Err(non_finite("partition function"));
    }
    let mean_log_weight: f64 = weights
        .iter()
        .map(|&w| (w - log_z).exp() * w)
        .sum();
    let entropy = log_z - mean_log_weight;
    if !entropy.is_finite() {
        return Err(non_finite("entropy"));
    }
    Ok(entropy)
}

/// Exact co-occurrence matrix of the model defined by `j`.
pub fn cooccurrences_of(j: &DMatrix<f64>) -> Result<DMatrix<f64>, AceError> {
    check_enumerable(j.nrows())?;
    let n = j.nrows();
    let weights = log_weights(j);
    let log_z = log_sum_exp(&weights);
    if !log_z.is_finite() {
        return Err(non_finite("partition function"));
    }
    let mut cooc = DMatrix::<f64>::zeros(n, n);
    for (mask, &w) in weights.iter().enumerate() {
        let p = (w - log_z).exp();
        for a in 0..n {
            if mask & (1 << a) == 0 {
                continue;
            }
            for b in a..n {
                if mask & (1 << b) != 0 {
                    cooc[(a, b)] += p;
                }
            }
        }
    }
    for a in 0..n {
        for b in (a + 1)..n {
            cooc[(b, a)] = cooc[(a, b)];
        }
    }
    Ok(cooc)
}
