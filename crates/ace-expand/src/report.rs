use ace_core::errors::{AceError, ErrorInfo};
use ace_core::SchemaVersion;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::assemble::IsingParams;
use crate::config::AceConfig;
use crate::hash::stable_hash_string;
use crate::solve::Expansion;
use crate::sweep::{SweepOutcome, SweepStep, SweepStop};

/// Schema version written into every report.
pub const REPORT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

fn rows_of(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// One registry entry as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Sorted variable indices.
    pub cluster: Vec<usize>,
    /// Marginal entropy.
    pub entropy: f64,
    /// Marginal interaction block in cluster-local coordinates.
    pub interactions: Vec<Vec<f64>>,
    /// Whether the cluster survived into the final model.
    pub retained: bool,
}

/// Serializable summary of one expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Report layout version.
    pub schema: SchemaVersion,
    /// Configuration the model was fitted with.
    pub config: AceConfig,
    /// Entropy estimate.
    pub entropy: f64,
    /// Spin-convention parameters.
    pub params: IsingParams,
    /// Internal interaction matrix, row by row.
    pub interactions: Vec<Vec<f64>>,
    /// Retained clusters grouped by generation.
    pub generations: Vec<Vec<Vec<usize>>>,
    /// Growth stopped at `max_cluster_size`.
    pub truncated: bool,
    /// Every evaluated cluster in canonical order.
    pub contributions: Vec<ContributionRecord>,
    /// SHA-256 of the report with this field empty.
    #[serde(default)]
    pub hash: String,
}

impl SolveReport {
    /// Builds and hashes the report for `expansion`.
    pub fn new(expansion: &Expansion, config: &AceConfig) -> Result<Self, AceError> {
        let solution = &expansion.solution;
        let retained: std::collections::BTreeSet<_> = solution.growth.clusters().collect();
        let contributions = expansion
            .registry
            .iter()
            .map(|(cluster, contribution)| ContributionRecord {
                cluster: cluster.indices().to_vec(),
                entropy: contribution.entropy,
                interactions: rows_of(&contribution.interactions),
                retained: retained.contains(cluster),
            })
            .collect();
        let generations = solution
            .growth
            .generations
            .iter()
            .map(|g| g.clusters.iter().map(|c| c.indices().to_vec()).collect())
            .collect();
        let mut report = Self {
            schema: REPORT_SCHEMA,
            config: config.clone(),
            entropy: solution.entropy,
            params: solution.params.clone(),
            interactions: rows_of(&solution.interactions),
            generations,
            truncated: solution.growth.truncated,
            contributions,
            hash: String::new(),
        };
        report.hash = report.compute_hash()?;
        Ok(report)
    }

    fn compute_hash(&self) -> Result<String, AceError> {
        let mut unhashed = self.clone();
        unhashed.hash.clear();
        stable_hash_string(&unhashed)
    }

    /// Recomputes the hash and compares it with the stored one.
    pub fn verify(&self) -> Result<(), AceError> {
        check_hash(&self.hash, self.compute_hash()?)
    }
}

fn check_hash(stored: &str, computed: String) -> Result<(), AceError> {
    if computed == stored {
        return Ok(());
    }
    Err(AceError::Serde(
        ErrorInfo::new("report-hash-mismatch", "report contents do not match their hash")
            .with_context("stored", stored)
            .with_context("computed", computed),
    ))
}

/// Serializable summary of a threshold sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Report layout version.
    pub schema: SchemaVersion,
    /// Configuration the sweep ran with.
    pub config: AceConfig,
    /// Recorded steps in decreasing threshold order.
    pub steps: Vec<SweepStep>,
    /// Index of the selected step.
    pub selected: usize,
    /// Stop condition.
    pub stop: SweepStop,
    /// Number of clusters evaluated across the sweep.
    pub evaluated_clusters: usize,
    /// SHA-256 of the report with this field empty.
    #[serde(default)]
    pub hash: String,
}

impl SweepReport {
    /// Builds and hashes the report for `outcome`.
    pub fn new(outcome: &SweepOutcome, config: &AceConfig) -> Result<Self, AceError> {
        let mut report = Self {
            schema: REPORT_SCHEMA,
            config: config.clone(),
            steps: outcome.steps.clone(),
            selected: outcome.selected,
            stop: outcome.stop,
            evaluated_clusters: outcome.registry.len(),
            hash: String::new(),
        };
        report.hash = report.compute_hash()?;
        Ok(report)
    }

    fn compute_hash(&self) -> Result<String, AceError> {
        let mut unhashed = self.clone();
        unhashed.hash.clear();
        stable_hash_string(&unhashed)
    }

    /// Recomputes the hash and compares it with the stored one.
    pub fn verify(&self) -> Result<(), AceError> {
        check_hash(&self.hash, self.compute_hash()?)
    }
}
