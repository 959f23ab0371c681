use ace_analytic::{add_into_block, ClusterSolver};
use ace_core::errors::{AceError, ErrorInfo};
use ace_core::{Cluster, CoocMatrix};
use tracing::{debug, trace};

use crate::reference::ReferenceMode;
use crate::registry::{ClusterRegistry, Contribution, MemoKey};
use crate::subsets::subsets;

/// Recursive cluster entropy decomposition ("Algorithm 1").
///
/// A cluster's marginal contribution is its full fitted entropy minus the
/// reference entropy minus the marginal contributions of every strict
/// non-empty sub-cluster. Sub-cluster results come from the registry, so each
/// cluster identity is solved at most once per registry.
#[derive(Debug)]
pub struct Decomposer<'a, S: ClusterSolver> {
    cooc: &'a CoocMatrix,
    solver: &'a S,
    key: MemoKey,
}

impl<'a, S: ClusterSolver> Decomposer<'a, S> {
    /// Binds the statistics, the cluster solver and the reference model.
    pub fn new(cooc: &'a CoocMatrix, solver: &'a S, reference: ReferenceMode) -> Self {
        Self {
            cooc,
            solver,
            key: MemoKey::new(cooc, solver, reference),
        }
    }

    /// Statistics being decomposed.
    pub fn cooc(&self) -> &CoocMatrix {
        self.cooc
    }

    /// Reference model in use.
    pub fn reference(&self) -> &ReferenceMode {
        &self.key.reference
    }

    /// Identity of the contributions this decomposer produces.
    pub fn key(&self) -> &MemoKey {
        &self.key
    }

    /// Marginal entropy and interaction contribution of `cluster`.
    pub fn delta_s(
        &self,
        cluster: &Cluster,
        registry: &mut ClusterRegistry,
    ) -> Result<Contribution, AceError> {
        if cluster.is_empty() {
            return Err(AceError::input(
                "empty-cluster",
                "entropy decomposition requires a non-empty cluster",
            ));
        }
        self.cooc.check_cluster(cluster)?;
        registry.ensure_compatible(&self.key)?;
        self.decompose(cluster, registry)
    }

    fn decompose(
        &self,
        cluster: &Cluster,
        registry: &mut ClusterRegistry,
    ) -> Result<Contribution, AceError> {
        if let Some(found) = registry.get(cluster) {
            trace!(%cluster, "memoized contribution");
            return Ok(found.clone());
        }
        debug!(%cluster, reference = self.key.reference.label(), "computing cluster entropy");

        let full = self.solver.solve_cluster(self.cooc, cluster)?;
        let reference = self.key.reference.fit(self.cooc, cluster)?;
        let mut entropy = full.entropy - reference.entropy;
        let mut interactions = full.interactions - reference.interactions;

        for size in (1..cluster.len()).rev() {
            for indices in subsets(cluster.indices(), size)? {
                let sub = Cluster::new(indices)?;
                let part = self.decompose(&sub, registry)?;
                entropy -= part.entropy;
                add_into_block(&mut interactions, cluster, &part.interactions, &sub, -1.0);
            }
        }

        if !entropy.is_finite() {
            return Err(AceError::Numerical(
                ErrorInfo::new("non-finite-contribution", "cluster entropy is not finite")
                    .with_context("cluster", cluster.to_string()),
            ));
        }
        let contribution = Contribution {
            entropy,
            interactions,
        };
        registry.insert(cluster.clone(), contribution.clone());
        Ok(contribution)
    }
}
