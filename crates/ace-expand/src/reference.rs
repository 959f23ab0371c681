use ace_analytic::{independent_reference, mean_field_reference, prior_lambda, ClusterFit};
use ace_core::{AceError, Cluster, CoocMatrix};
use serde::{Deserialize, Serialize};

/// Baseline model that cluster contributions are measured against.
///
/// Selected once per solve and shared by the whole recursion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReferenceMode {
    /// Independent variables: summed binary entropies, fields only.
    Independent,
    /// Regularised naive mean field.
    MeanField {
        /// Diagonal regulariser strength before sample scaling.
        prior_strength: f64,
        /// Sample count used to scale the regulariser.
        #[serde(default)]
        num_samples: Option<usize>,
    },
}

impl ReferenceMode {
    /// Reference entropy and interaction block for `cluster`.
    pub fn fit(&self, cooc: &CoocMatrix, cluster: &Cluster) -> Result<ClusterFit, AceError> {
        match *self {
            ReferenceMode::Independent => independent_reference(cooc, cluster),
            ReferenceMode::MeanField {
                prior_strength,
                num_samples,
            } => mean_field_reference(cooc, cluster, prior_lambda(prior_strength, num_samples)),
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceMode::Independent => "independent",
            ReferenceMode::MeanField { .. } => "mean-field",
        }
    }
}
