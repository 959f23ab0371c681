//! Exact maximum-entropy fit of a small cluster by damped Newton iteration.

use ace_core::errors::{AceError, ErrorInfo};
use ace_core::Cluster;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::closed::field_from_frequency;
use crate::enumerate::{check_enumerable, log_sum_exp};

/// Numerical knobs for [`fit_exact`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOpts {
    /// Gaussian prior strength on pair couplings (already scaled by sample count).
    pub lambda: f64,
    /// Convergence threshold on the largest gradient component.
    pub tolerance: f64,
    /// Maximum Newton iterations.
    pub max_iters: usize,
}

const ARMIJO: f64 = 1e-4;
const MAX_HALVINGS: usize = 40;
// Accepted when the line search stalls on rounding noise.
const STALL_TOLERANCE: f64 = 1e-7;

/// Binary features `s_a` and `s_a s_b` (a < b), listed per state.
struct Features {
    n: usize,
    pairs: Vec<(usize, usize)>,
    active: Vec<Vec<usize>>,
}

impl Features {
    fn new(n: usize) -> Self {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|a| ((a + 1)..n).map(move |b| (a, b)))
            .collect();
        let active = (0..1usize << n)
            .map(|mask| {
                let mut on: Vec<usize> = (0..n).filter(|&a| mask & (1 << a) != 0).collect();
                for (q, &(a, b)) in pairs.iter().enumerate() {
                    if mask & (1 << a) != 0 && mask & (1 << b) != 0 {
                        on.push(n + q);
                    }
                }
                on
            })
            .collect();
        Self { n, pairs, active }
    }

    fn dim(&self) -> usize {
        self.n + self.pairs.len()
    }

    fn targets(&self, sub: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(self.dim(), |f, _| {
            if f < self.n {
                sub[(f, f)]
            } else {
                let (a, b) = self.pairs[f - self.n];
                sub[(a, b)]
            }
        })
    }
}

struct Moments {
    log_z: f64,
    mean: DVector<f64>,
    // Empty unless requested.
    second: DMatrix<f64>,
}

fn moments(features: &Features, theta: &DVector<f64>, with_second: bool) -> Moments {
    let weights: Vec<f64> = features
        .active
        .iter()
        .map(|on| on.iter().map(|&f| theta[f]).sum())
        .collect();
    let log_z = log_sum_exp(&weights);
    let dim = features.dim();
    let mut mean = DVector::<f64>::zeros(dim);
    let second_dim = if with_second { dim } else { 0 };
    let mut second = DMatrix::<f64>::zeros(second_dim, second_dim);
    for (on, &w) in features.active.iter().zip(&weights) {
        let p = (w - log_z).exp();
        for &a in on {
            mean[a] += p;
        }
        if with_second {
            for &a in on {
                for &b in on {
                    second[(a, b)] += p;
                }
            }
        }
    }
    Moments {
        log_z,
        mean,
        second,
    }
}

fn objective(
    features: &Features,
    theta: &DVector<f64>,
    targets: &DVector<f64>,
    lambda: f64,
) -> f64 {
    let log_z = moments(features, theta, false).log_z;
    let penalty: f64 = theta.iter().skip(features.n).map(|t| t * t).sum();
    log_z - theta.dot(targets) + 0.5 * lambda * penalty
}

fn solve_newton_step(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Option<DVector<f64>> {
    let rhs = -gradient;
    match hessian.clone().cholesky() {
        Some(chol) => Some(chol.solve(&rhs)),
        None => hessian.lu().solve(&rhs),
    }
}

fn fit_failure(cluster: &Cluster, code: &str, message: &str, iter: usize) -> AceError {
    AceError::Numerical(
        ErrorInfo::new(code, message)
            .with_context("cluster", cluster.to_string())
            .with_context("iteration", iter.to_string()),
    )
}

/// Fits fields and couplings so the model reproduces `sub` exactly (up to
/// the coupling prior), returning the interaction block in `sᵀ J s` form.
///
/// `sub` is the cluster's co-occurrence sub-matrix in canonical order. Cost is
/// `O(2^k · d²)` per iteration with `d = k(k+1)/2`.
pub fn fit_exact(
    cluster: &Cluster,
    sub: &DMatrix<f64>,
    opts: &NewtonOpts,
) -> Result<DMatrix<f64>, AceError> {
    let n = sub.nrows();
    check_enumerable(n)?;
    let features = Features::new(n);
    let targets = features.targets(sub);
    let mut theta = DVector::<f64>::zeros(features.dim());
    for a in 0..n {
        theta[a] = -field_from_frequency(sub[(a, a)]);
    }

    let mut converged = false;
    for iter in 0..opts.max_iters {
        let current = moments(&features, &theta, true);
        let mut gradient = &current.mean - &targets;
        for f in n..features.dim() {
            gradient[f] += opts.lambda * theta[f];
        }
        let grad_max = gradient.amax();
        if !grad_max.is_finite() {
            return Err(fit_failure(cluster, "non-finite-gradient", "gradient diverged", iter));
        }
        trace!(%cluster, iter, grad_max, "newton iteration");
        if grad_max < opts.tolerance {
            converged = true;
            break;
        }

        let mut hessian = current.second - &current.mean * current.mean.transpose();
        for f in n..features.dim() {
            hessian[(f, f)] += opts.lambda;
        }
        let step = solve_newton_step(hessian, &gradient).ok_or_else(|| {
            fit_failure(cluster, "singular-hessian", "Newton system is singular", iter)
        })?;

        let value = current.log_z - theta.dot(&targets)
            + 0.5 * opts.lambda * theta.iter().skip(n).map(|t| t * t).sum::<f64>();
        let slope = gradient.dot(&step);
        let mut scale = 1.0;
        let mut accepted = false;
        for _ in 0..MAX_HALVINGS {
            let candidate = &theta + &step * scale;
            let candidate_value = objective(&features, &candidate, &targets, opts.lambda);
            if candidate_value.is_finite() && candidate_value <= value + ARMIJO * scale * slope {
                theta = candidate;
                accepted = true;
                break;
            }
            scale *= 0.5;
        }
        if !accepted {
            if grad_max < STALL_TOLERANCE {
                converged = true;
                break;
            }
            return Err(fit_failure(
                cluster,
                "line-search-failed",
                "no descent step found for exact cluster fit",
                iter,
            ));
        }
    }

    if !converged {
        return Err(fit_failure(
            cluster,
            "fit-not-converged",
            "exact cluster fit did not converge",
            opts.max_iters,
        ));
    }

    let mut j = DMatrix::<f64>::zeros(n, n);
    for a in 0..n {
        j[(a, a)] = -theta[a];
    }
    for (q, &(a, b)) in features.pairs.iter().enumerate() {
        let half = -0.5 * theta[n + q];
        j[(a, b)] = half;
        j[(b, a)] = half;
    }
    Ok(j)
}
