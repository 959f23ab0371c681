use std::collections::BTreeMap;

use ace_analytic::{embed_in_full, ClusterSolver};
use ace_core::errors::{AceError, ErrorInfo};
use ace_core::{Cluster, CoocMatrix};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceMode;

/// Marginal entropy and interaction contribution of one cluster.
///
/// `interactions` is stored in the cluster's local coordinates; it is the
/// restriction of an `n × n` matrix that vanishes outside the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Marginal entropy `ΔS`.
    pub entropy: f64,
    /// Marginal interaction block `ΔJ`.
    pub interactions: DMatrix<f64>,
}

impl Contribution {
    /// The contribution as a full `n × n` matrix.
    pub fn to_full(&self, cluster: &Cluster, n: usize) -> DMatrix<f64> {
        embed_in_full(&self.interactions, cluster, n)
    }
}

/// Everything a memoized contribution depends on besides its cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoKey {
    /// System size.
    pub dim: usize,
    /// Reference the contributions are measured against.
    pub reference: ReferenceMode,
    /// Effective coupling prior of the cluster solver.
    pub coupling_prior: f64,
    /// [`CoocMatrix::fingerprint`] of the statistics.
    pub statistics: u64,
}

impl MemoKey {
    /// Key for contributions of `cooc` fitted by `solver` against `reference`.
    pub fn new<S: ClusterSolver>(cooc: &CoocMatrix, solver: &S, reference: ReferenceMode) -> Self {
        Self {
            dim: cooc.dim(),
            reference,
            coupling_prior: solver.coupling_prior(),
            statistics: cooc.fingerprint(),
        }
    }
}

/// Memo of cluster contributions for one co-occurrence matrix and reference.
///
/// Entries are written once and never replaced. The registry is bound to the
/// statistics and solver prior of its first use; later uses must match.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRegistry {
    dim: usize,
    reference: ReferenceMode,
    bound: Option<(f64, u64)>,
    entries: BTreeMap<Cluster, Contribution>,
}

fn mismatch(message: &str) -> ErrorInfo {
    ErrorInfo::new("registry-mismatch", message)
        .with_hint("start from an empty registry when the data or priors change")
}

impl ClusterRegistry {
    /// Empty registry for a system of `dim` variables.
    pub fn new(dim: usize, reference: ReferenceMode) -> Self {
        Self {
            dim,
            reference,
            bound: None,
            entries: BTreeMap::new(),
        }
    }

    /// Fails when the registry was filled for a different system, reference,
    /// solver prior or set of statistics. The first successful call binds an
    /// unbound registry to `key`.
    pub fn ensure_compatible(&mut self, key: &MemoKey) -> Result<(), AceError> {
        if self.dim != key.dim || self.reference != key.reference {
            return Err(AceError::Configuration(
                mismatch("cluster registry was built for a different system or reference")
                    .with_context("registry_dim", self.dim.to_string())
                    .with_context("dim", key.dim.to_string())
                    .with_context("registry_reference", self.reference.label())
                    .with_context("reference", key.reference.label()),
            ));
        }
        match self.bound {
            None => {
                self.bound = Some((key.coupling_prior, key.statistics));
                Ok(())
            }
            Some((prior, _)) if prior != key.coupling_prior => Err(AceError::Configuration(
                mismatch("cluster registry was filled under a different coupling prior")
                    .with_context("registry_prior", prior.to_string())
                    .with_context("prior", key.coupling_prior.to_string()),
            )),
            Some((_, statistics)) if statistics != key.statistics => Err(AceError::Configuration(
                mismatch("cluster registry was filled from different statistics")
                    .with_context("registry_statistics", format!("{statistics:016x}"))
                    .with_context("statistics", format!("{:016x}", key.statistics)),
            )),
            Some(_) => Ok(()),
        }
    }

    /// System size the registry belongs to.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Reference the contributions are measured against.
    pub fn reference(&self) -> &ReferenceMode {
        &self.reference
    }

    /// Memoized contribution of `cluster`, if any.
    pub fn get(&self, cluster: &Cluster) -> Option<&Contribution> {
        self.entries.get(cluster)
    }

    /// Returns `true` when `cluster` has been evaluated.
    pub fn contains(&self, cluster: &Cluster) -> bool {
        self.entries.contains_key(cluster)
    }

    /// Number of memoized clusters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in canonical cluster order.
    pub fn iter(&self) -> impl Iterator<Item = (&Cluster, &Contribution)> + '_ {
        self.entries.iter()
    }

    pub(crate) fn insert(&mut self, cluster: Cluster, contribution: Contribution) {
        self.entries.entry(cluster).or_insert(contribution);
    }
}
