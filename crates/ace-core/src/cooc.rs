//! Empirical co-occurrence statistics.

use std::hash::Hasher;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::cluster::Cluster;
use crate::errors::{AceError, ErrorInfo};
use crate::samples::SampleMatrix;

/// Absolute tolerance used when validating symmetry and probability bounds.
pub const COOC_TOLERANCE: f64 = 1e-10;

/// Symmetric matrix of pairwise co-occurrence frequencies.
///
/// Diagonal entry `i` is `P(x_i = 1)`; off-diagonal entry `(i, j)` is
/// `P(x_i = 1, x_j = 1)`. The matrix is validated on construction and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DMatrix<f64>", into = "DMatrix<f64>")]
pub struct CoocMatrix {
    matrix: DMatrix<f64>,
}

fn cooc_error(code: &str, message: &str, i: usize, j: usize) -> AceError {
    AceError::Input(
        ErrorInfo::new(code, message)
            .with_context("row", i.to_string())
            .with_context("col", j.to_string()),
    )
}

impl CoocMatrix {
    /// Validates and wraps a co-occurrence matrix.
    pub fn new(matrix: DMatrix<f64>) -> Result<Self, AceError> {
        if !matrix.is_square() {
            return Err(AceError::Input(
                ErrorInfo::new("non-square-cooc", "co-occurrence matrix must be square")
                    .with_context("rows", matrix.nrows().to_string())
                    .with_context("cols", matrix.ncols().to_string()),
            ));
        }
        if matrix.nrows() == 0 {
            return Err(AceError::input(
                "empty-cooc",
                "co-occurrence matrix must describe at least one variable",
            ));
        }
        let n = matrix.nrows();
        for i in 0..n {
            for j in 0..n {
                let value = matrix[(i, j)];
                if !value.is_finite() {
                    return Err(cooc_error("non-finite-cooc", "entry is not finite", i, j));
                }
                if value < -COOC_TOLERANCE || value > 1.0 + COOC_TOLERANCE {
                    return Err(cooc_error(
                        "cooc-out-of-range",
                        "entries must be probabilities in [0, 1]",
                        i,
                        j,
                    ));
                }
                if j > i && (value - matrix[(j, i)]).abs() > COOC_TOLERANCE {
                    return Err(cooc_error(
                        "asymmetric-cooc",
                        "co-occurrence matrix must be symmetric",
                        i,
                        j,
                    ));
                }
                if i != j && value > matrix[(i, i)].min(matrix[(j, j)]) + COOC_TOLERANCE {
                    return Err(cooc_error(
                        "cooc-exceeds-marginal",
                        "pair frequency exceeds a single-variable frequency",
                        i,
                        j,
                    ));
                }
            }
        }
        Ok(Self { matrix })
    }

    /// Builds the matrix from a square row-major slice of rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, AceError> {
        let n = rows.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(AceError::Input(
                ErrorInfo::new("non-square-cooc", "co-occurrence matrix must be square")
                    .with_context("row", idx.to_string())
                    .with_context("len", row.len().to_string()),
            ));
        }
        Self::new(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }

    /// Computes `XᵀX / n_samples` from 0/1 samples.
    pub fn from_samples(samples: &SampleMatrix) -> Result<Self, AceError> {
        let n = samples.dim();
        let count = samples.len();
        if count == 0 {
            return Err(AceError::input(
                "empty-samples",
                "at least one sample is required",
            ));
        }
        let mut counts = DMatrix::<f64>::zeros(n, n);
        for row in samples.rows() {
            let active: Vec<usize> = (0..n).filter(|&idx| row[idx] == 1).collect();
            for &i in &active {
                for &j in &active {
                    counts[(i, j)] += 1.0;
                }
            }
        }
        Self::new(counts / count as f64)
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Single-variable frequency `P(x_i = 1)`.
    pub fn frequency(&self, i: usize) -> f64 {
        self.matrix[(i, i)]
    }

    /// Pair frequency `P(x_i = 1, x_j = 1)`.
    pub fn pair(&self, i: usize, j: usize) -> f64 {
        self.matrix[(i, j)]
    }

    /// Diagonal frequencies.
    pub fn frequencies(&self) -> Vec<f64> {
        self.matrix.diagonal().iter().copied().collect()
    }

    /// Co-occurrence sub-matrix restricted to `cluster`, in cluster order.
    pub fn submatrix(&self, cluster: &Cluster) -> DMatrix<f64> {
        let idx = cluster.indices();
        DMatrix::from_fn(idx.len(), idx.len(), |a, b| self.matrix[(idx[a], idx[b])])
    }

    /// Checks that every index of `cluster` addresses a variable.
    pub fn check_cluster(&self, cluster: &Cluster) -> Result<(), AceError> {
        match cluster.max_index() {
            Some(max) if max >= self.dim() => Err(AceError::Input(
                ErrorInfo::new("index-out-of-range", "cluster index exceeds system size")
                    .with_context("cluster", cluster.to_string())
                    .with_context("dim", self.dim().to_string()),
            )),
            _ => Ok(()),
        }
    }

    /// SipHash of the dimension and every entry's bit pattern.
    ///
    /// Equal statistics always share a fingerprint, so memoized cluster
    /// results can be tied to the matrix they were computed from.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        hasher.write_usize(self.dim());
        for value in self.matrix.iter() {
            hasher.write_u64(value.to_bits());
        }
        hasher.finish()
    }
}

impl TryFrom<DMatrix<f64>> for CoocMatrix {
    type Error = AceError;

    fn try_from(matrix: DMatrix<f64>) -> Result<Self, Self::Error> {
        CoocMatrix::new(matrix)
    }
}

impl From<CoocMatrix> for DMatrix<f64> {
    fn from(cooc: CoocMatrix) -> Self {
        cooc.matrix
    }
}
