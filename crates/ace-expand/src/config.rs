use ace_analytic::AnalyticOpts;
use ace_core::errors::{AceError, ErrorInfo};
use ace_core::Cluster;
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceMode;

/// YAML-configurable parameters of one expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AceConfig {
    /// Minimum `|ΔS|` for a cluster to survive into the next generation.
    pub threshold: f64,
    /// Gaussian prior on couplings used by exact cluster fits.
    #[serde(default)]
    pub prior_strength: f64,
    /// Regulariser of the mean-field reference; falls back to `prior_strength`.
    #[serde(default)]
    pub mean_field_prior_strength: Option<f64>,
    /// Number of samples behind the statistics; scales both priors.
    #[serde(default)]
    pub num_samples: Option<usize>,
    /// Measure contributions against the independent reference.
    #[serde(default = "default_independent_ref")]
    pub independent_ref: bool,
    /// Measure contributions against the mean-field reference.
    #[serde(default)]
    pub mean_field_ref: bool,
    /// Largest cluster size grown before stopping early.
    #[serde(default)]
    pub max_cluster_size: Option<usize>,
    /// Restricts the expansion to these variables.
    #[serde(default)]
    pub cluster: Option<Vec<usize>>,
    /// Per-generation progress logging.
    #[serde(default)]
    pub verbose: bool,
    /// Per-cluster logging.
    #[serde(default)]
    pub very_verbose: bool,
    /// Convergence controls of the exact cluster fits.
    #[serde(default)]
    pub analytic: FitNumerics,
    /// Threshold sweep settings.
    #[serde(default)]
    pub sweep: SweepConfig,
}

fn default_independent_ref() -> bool {
    true
}

impl AceConfig {
    /// Configuration with the given threshold and every other field defaulted.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            prior_strength: 0.0,
            mean_field_prior_strength: None,
            num_samples: None,
            independent_ref: default_independent_ref(),
            mean_field_ref: false,
            max_cluster_size: None,
            cluster: None,
            verbose: false,
            very_verbose: false,
            analytic: FitNumerics::default(),
            sweep: SweepConfig::default(),
        }
    }

    /// Checks field ranges and the reference selection.
    pub fn validate(&self) -> Result<(), AceError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(AceError::Configuration(
                ErrorInfo::new("invalid-threshold", "threshold must be finite and positive")
                    .with_context("threshold", self.threshold.to_string()),
            ));
        }
        let priors = [
            ("prior_strength", Some(self.prior_strength)),
            ("mean_field_prior_strength", self.mean_field_prior_strength),
        ];
        for (field, value) in priors {
            if let Some(value) = value.filter(|v| !v.is_finite() || *v < 0.0) {
                return Err(AceError::Configuration(
                    ErrorInfo::new("invalid-prior", "prior strengths must be finite and non-negative")
                        .with_context(field, value.to_string()),
                ));
            }
        }
        if self.num_samples == Some(0) {
            return Err(AceError::configuration(
                "invalid-num-samples",
                "num_samples must be positive",
            ));
        }
        if self.max_cluster_size == Some(0) {
            return Err(AceError::configuration(
                "invalid-max-cluster-size",
                "max_cluster_size must be at least one",
            ));
        }
        if !self.analytic.tolerance.is_finite() || self.analytic.tolerance <= 0.0 {
            return Err(AceError::Configuration(
                ErrorInfo::new("invalid-tolerance", "fit tolerance must be finite and positive")
                    .with_context("tolerance", self.analytic.tolerance.to_string()),
            ));
        }
        if self.analytic.max_iters == 0 {
            return Err(AceError::configuration(
                "invalid-max-iters",
                "fit max_iters must be positive",
            ));
        }
        self.reference_mode()?;
        Ok(())
    }

    /// Resolves the reference flags into a single mode.
    pub fn reference_mode(&self) -> Result<ReferenceMode, AceError> {
        match (self.independent_ref, self.mean_field_ref) {
            (true, false) => Ok(ReferenceMode::Independent),
            (false, true) => Ok(ReferenceMode::MeanField {
                prior_strength: self
                    .mean_field_prior_strength
                    .unwrap_or(self.prior_strength),
                num_samples: self.num_samples,
            }),
            (both, _) => Err(AceError::Configuration(
                ErrorInfo::new(
                    "reference-selection",
                    if both {
                        "independent and mean-field references are mutually exclusive"
                    } else {
                        "one of independent_ref or mean_field_ref must be set"
                    },
                )
                .with_hint("set exactly one of independent_ref and mean_field_ref"),
            )),
        }
    }

    /// Variables the expansion runs over for a system of `n` variables.
    pub fn variables(&self, n: usize) -> Result<Cluster, AceError> {
        let Some(indices) = &self.cluster else {
            return Cluster::new(0..n);
        };
        let cluster = Cluster::new(indices.iter().copied())?;
        if cluster.is_empty() {
            return Err(AceError::configuration(
                "empty-variable-set",
                "cluster restriction is empty",
            ));
        }
        if let Some(max) = cluster.max_index() {
            if max >= n {
                return Err(AceError::Input(
                    ErrorInfo::new("index-out-of-range", "cluster restriction exceeds system size")
                        .with_context("index", max.to_string())
                        .with_context("dim", n.to_string()),
                ));
            }
        }
        Ok(cluster)
    }

    /// Options handed to the analytic cluster solver.
    pub fn analytic_opts(&self) -> AnalyticOpts {
        AnalyticOpts {
            prior_strength: self.prior_strength,
            num_samples: self.num_samples,
            tolerance: self.analytic.tolerance,
            max_iters: self.analytic.max_iters,
        }
    }
}

/// Convergence controls for exact fits of clusters with three or more variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitNumerics {
    /// Gradient norm below which a fit has converged.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Newton iteration limit.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iters() -> usize {
    200
}

impl Default for FitNumerics {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iters: default_max_iters(),
        }
    }
}

/// How model/data residuals are scored during a threshold sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidualWeighting {
    /// Each frequency and co-occurrence residual scored independently.
    #[default]
    Independent,
    /// Residuals whitened by their joint covariance.
    Covariance,
}

/// Settings of the decreasing-threshold sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Base-10 exponents of the smallest and largest threshold.
    #[serde(default = "default_log_threshold_range")]
    pub log_threshold_range: (f64, f64),
    /// Number of logarithmically spaced thresholds.
    #[serde(default = "default_num_thresholds")]
    pub num_thresholds: usize,
    /// Both residual errors must fall below this value to stop.
    #[serde(default = "default_eps_threshold")]
    pub eps_threshold: f64,
    /// Sweep stops once the threshold drops below this value.
    #[serde(default)]
    pub min_threshold: f64,
    /// Sweep stops once the largest retained cluster exceeds this size.
    #[serde(default)]
    pub max_max_cluster_size: Option<usize>,
    /// Non-interacting prior strength; when set the coupling prior becomes
    /// `gamma / (p̄² (1 - p̄)²)` with `p̄` the mean frequency.
    #[serde(default)]
    pub noninteracting_prior: Option<f64>,
    /// Residual scoring scheme.
    #[serde(default)]
    pub residual: ResidualWeighting,
}

fn default_log_threshold_range() -> (f64, f64) {
    (-6.0, -2.0)
}

fn default_num_thresholds() -> usize {
    1000
}

fn default_eps_threshold() -> f64 {
    1.0
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            log_threshold_range: default_log_threshold_range(),
            num_thresholds: default_num_thresholds(),
            eps_threshold: default_eps_threshold(),
            min_threshold: 0.0,
            max_max_cluster_size: None,
            noninteracting_prior: None,
            residual: ResidualWeighting::default(),
        }
    }
}
