use ace_core::errors::{AceError, ErrorInfo};
use ace_core::{Cluster, CoocMatrix};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::closed::{binary_entropy, check_frequency, check_pair, field_from_frequency, pair_interactions};
use crate::enumerate::entropy_of;
use crate::exact::{fit_exact, NewtonOpts};

/// Largest cluster the exact sub-solver accepts.
pub const MAX_EXACT_CLUSTER: usize = 12;

/// Entropy and interaction block of a fitted cluster, in cluster-local
/// coordinates (`|cluster| × |cluster|`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFit {
    /// Model entropy in nats.
    pub entropy: f64,
    /// Interaction block in `sᵀ J s` form.
    pub interactions: DMatrix<f64>,
}

/// Fits a pairwise model to the co-occurrence statistics of one cluster.
///
/// Implementations must be deterministic: the expansion memoizes results by
/// cluster identity and never asks twice.
pub trait ClusterSolver {
    /// Returns the full entropy and interaction block of `cluster`.
    fn solve_cluster(&self, cooc: &CoocMatrix, cluster: &Cluster) -> Result<ClusterFit, AceError>;

    /// Effective coupling prior applied by every fit.
    ///
    /// Fits made under different priors are not interchangeable, so the
    /// expansion refuses to mix them in one registry.
    fn coupling_prior(&self) -> f64 {
        0.0
    }
}

/// Effective coupling prior: `prior_strength / num_samples` when the sample
/// count is known, otherwise `prior_strength` itself.
pub fn prior_lambda(prior_strength: f64, num_samples: Option<usize>) -> f64 {
    match num_samples {
        Some(count) if count > 0 => prior_strength / count as f64,
        _ => prior_strength,
    }
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iters() -> usize {
    200
}

/// Options for [`AnalyticSolver`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticOpts {
    /// Strength of the Gaussian prior on pair couplings. It applies to clusters
    /// of size ≥ 3 and to pairs whose statistics leave a joint state unobserved.
    #[serde(default)]
    pub prior_strength: f64,
    /// Number of data samples used to scale the prior.
    #[serde(default)]
    pub num_samples: Option<usize>,
    /// Gradient tolerance of the exact fit.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap of the exact fit.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
}

impl Default for AnalyticOpts {
    fn default() -> Self {
        Self {
            prior_strength: 0.0,
            num_samples: None,
            tolerance: default_tolerance(),
            max_iters: default_max_iters(),
        }
    }
}

/// Default cluster solver: closed forms for one and two variables, an exact
/// regularised fit by enumeration for larger clusters.
#[derive(Debug, Clone, Default)]
pub struct AnalyticSolver {
    opts: AnalyticOpts,
}

impl AnalyticSolver {
    /// Creates a solver with the given options.
    pub fn new(opts: AnalyticOpts) -> Self {
        Self { opts }
    }

    /// Options in use.
    pub fn opts(&self) -> &AnalyticOpts {
        &self.opts
    }

    fn newton_opts(&self) -> NewtonOpts {
        NewtonOpts {
            lambda: self.coupling_prior(),
            tolerance: self.opts.tolerance,
            max_iters: self.opts.max_iters,
        }
    }

    fn fit_by_enumeration(&self, cooc: &CoocMatrix, cluster: &Cluster) -> Result<ClusterFit, AceError> {
        let interactions = fit_exact(cluster, &cooc.submatrix(cluster), &self.newton_opts())?;
        let entropy = entropy_of(&interactions)?;
        Ok(ClusterFit {
            entropy,
            interactions,
        })
    }
}

impl ClusterSolver for AnalyticSolver {
    fn solve_cluster(&self, cooc: &CoocMatrix, cluster: &Cluster) -> Result<ClusterFit, AceError> {
        cooc.check_cluster(cluster)?;
        let idx = cluster.indices();
        for &i in idx {
            check_frequency(cluster, i, cooc.frequency(i))?;
        }
        // A positive prior keeps couplings finite, so unobserved joint states
        // are left to the regularised fit.
        let regularised = self.coupling_prior() > 0.0;
        let mut degenerate = false;
        for (a, &i) in idx.iter().enumerate() {
            for &j in &idx[a + 1..] {
                let checked =
                    check_pair(cluster, (i, j), cooc.frequency(i), cooc.frequency(j), cooc.pair(i, j));
                match checked {
                    Ok(()) => {}
                    Err(err) if regularised => {
                        debug!(%cluster, code = err.info().code.as_str(), "degenerate pair left to the prior");
                        degenerate = true;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        match idx {
            [] => Err(AceError::input(
                "empty-cluster",
                "cannot fit a model to an empty cluster",
            )),
            [i] => {
                let p = cooc.frequency(*i);
                Ok(ClusterFit {
                    entropy: binary_entropy(p),
                    interactions: DMatrix::from_element(1, 1, field_from_frequency(p)),
                })
            }
            [_, _] if degenerate => self.fit_by_enumeration(cooc, cluster),
            [i, j] => {
                let block = pair_interactions(cooc.frequency(*i), cooc.frequency(*j), cooc.pair(*i, *j));
                let interactions = DMatrix::from_fn(2, 2, |a, b| block[a][b]);
                let entropy = entropy_of(&interactions)?;
                Ok(ClusterFit {
                    entropy,
                    interactions,
                })
            }
            _ if idx.len() > MAX_EXACT_CLUSTER => Err(AceError::Unsupported(
                ErrorInfo::new(
                    "cluster-too-large",
                    "exact cluster fit is limited to small clusters",
                )
                .with_context("cluster", cluster.to_string())
                .with_context("max", MAX_EXACT_CLUSTER.to_string())
                .with_hint("set max_cluster_size or raise the threshold"),
            )),
            _ => {
                debug!(%cluster, "exact fit");
                self.fit_by_enumeration(cooc, cluster)
            }
        }
    }

    fn coupling_prior(&self) -> f64 {
        prior_lambda(self.opts.prior_strength, self.opts.num_samples)
    }
}
