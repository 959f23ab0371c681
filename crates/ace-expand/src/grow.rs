use std::collections::BTreeSet;

use ace_analytic::ClusterSolver;
use ace_core::{AceError, Cluster};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decompose::Decomposer;
use crate::registry::ClusterRegistry;

/// Clusters of one size that survived the threshold test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Number of variables in every cluster of this generation.
    pub size: usize,
    /// Surviving clusters in discovery order.
    pub clusters: Vec<Cluster>,
}

/// Result of the adaptive growth loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthOutcome {
    /// Non-empty generations, starting with the singletons.
    pub generations: Vec<Generation>,
    /// `true` when growth stopped at the cluster size cap while the last
    /// generation still proposed larger clusters. The proposals are not
    /// evaluated, so some of them might have fallen below the threshold.
    pub truncated: bool,
}

impl GrowthOutcome {
    /// Total number of retained clusters across generations.
    pub fn num_clusters(&self) -> usize {
        self.generations.iter().map(|g| g.clusters.len()).sum()
    }

    /// Size of the largest retained cluster.
    pub fn max_cluster_size(&self) -> usize {
        self.generations.last().map(|g| g.size).unwrap_or(0)
    }

    /// Iterates every retained cluster, smallest generation first.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> + '_ {
        self.generations.iter().flat_map(|g| g.clusters.iter())
    }
}

/// Adaptive breadth-first cluster growth ("Algorithm 2").
///
/// Starting from the singletons of `variables`, two alive clusters of size
/// `k` sharing `k - 1` indices propose their union; the union survives when
/// its marginal entropy exceeds `threshold` in magnitude. Growth halts at the
/// first empty generation, or once the next generation would exceed
/// `max_cluster_size`.
pub fn grow<S: ClusterSolver>(
    decomposer: &Decomposer<'_, S>,
    registry: &mut ClusterRegistry,
    variables: &Cluster,
    threshold: f64,
    max_cluster_size: Option<usize>,
) -> Result<GrowthOutcome, AceError> {
    let mut generations = vec![Generation {
        size: 1,
        clusters: variables.indices().iter().copied().map(Cluster::singleton).collect(),
    }];
    let mut truncated = false;

    loop {
        let current = &generations[generations.len() - 1];
        if current.clusters.len() < 2 {
            break;
        }
        let next_size = current.size + 1;
        if max_cluster_size.is_some_and(|cap| next_size > cap) {
            truncated = proposes_union(current);
            if truncated {
                info!(next_size, "cluster size cap reached; keeping clusters found so far");
            }
            break;
        }
        let next = next_generation(decomposer, registry, current, threshold)?;
        info!(
            size = next_size,
            survivors = next.clusters.len(),
            memoized = registry.len(),
            "generation complete"
        );
        if next.clusters.is_empty() {
            break;
        }
        generations.push(next);
    }

    Ok(GrowthOutcome {
        generations,
        truncated,
    })
}

fn proposes_union(current: &Generation) -> bool {
    let shared = current.size - 1;
    current
        .clusters
        .iter()
        .enumerate()
        .any(|(pos, first)| {
            current.clusters[pos + 1..]
                .iter()
                .any(|second| first.intersection_len(second) == shared)
        })
}

fn next_generation<S: ClusterSolver>(
    decomposer: &Decomposer<'_, S>,
    registry: &mut ClusterRegistry,
    current: &Generation,
    threshold: f64,
) -> Result<Generation, AceError> {
    let shared = current.size - 1;
    let mut proposed = BTreeSet::new();
    let mut survivors = Vec::new();
    for (pos, first) in current.clusters.iter().enumerate() {
        for second in &current.clusters[pos + 1..] {
            if first.intersection_len(second) != shared {
                continue;
            }
            let union = first.union(second);
            if !proposed.insert(union.clone()) {
                continue;
            }
            let contribution = decomposer.delta_s(&union, registry)?;
            if contribution.entropy.abs() > threshold {
                survivors.push(union);
            }
        }
    }
    Ok(Generation {
        size: current.size + 1,
        clusters: survivors,
    })
}
