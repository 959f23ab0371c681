//! Canonical cluster identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{AceError, ErrorInfo};

/// Unordered set of variable indices stored in canonical (sorted) order.
///
/// Two clusters built from the same indices compare equal and hash equal
/// regardless of the order in which the indices were supplied, so a
/// `Cluster` is directly usable as a memo key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Cluster(Vec<usize>);

impl Cluster {
    /// Builds a cluster from arbitrary-order indices, rejecting duplicates.
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Result<Self, AceError> {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        if let Some(pair) = indices.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(AceError::Input(
                ErrorInfo::new("duplicate-index", "cluster indices must be distinct")
                    .with_context("index", pair[0].to_string()),
            ));
        }
        Ok(Self(indices))
    }

    /// Singleton cluster `{index}`.
    pub fn singleton(index: usize) -> Self {
        Self(vec![index])
    }

    /// Canonical index sequence.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of variables in the cluster.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the cluster holds no variables.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest index in the cluster.
    pub fn max_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Returns `true` if `index` belongs to the cluster.
    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Local position of `index` within the canonical ordering.
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.0.binary_search(&index).ok()
    }

    /// Size of the intersection with `other`.
    pub fn intersection_len(&self, other: &Cluster) -> usize {
        let (mut a, mut b, mut shared) = (0, 0, 0);
        while a < self.0.len() && b < other.0.len() {
            match self.0[a].cmp(&other.0[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    a += 1;
                    b += 1;
                }
            }
        }
        shared
    }

    /// Canonical union with `other`.
    pub fn union(&self, other: &Cluster) -> Cluster {
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut a, mut b) = (0, 0);
        while a < self.0.len() || b < other.0.len() {
            let next = match (self.0.get(a), other.0.get(b)) {
                (Some(&x), Some(&y)) if x == y => {
                    a += 1;
                    b += 1;
                    x
                }
                (Some(&x), Some(&y)) if x < y => {
                    a += 1;
                    x
                }
                (_, Some(&y)) => {
                    b += 1;
                    y
                }
                (Some(&x), None) => {
                    a += 1;
                    x
                }
                (None, None) => break,
            };
            merged.push(next);
        }
        Cluster(merged)
    }
}

impl TryFrom<Vec<usize>> for Cluster {
    type Error = AceError;

    fn try_from(indices: Vec<usize>) -> Result<Self, Self::Error> {
        Cluster::new(indices)
    }
}

impl From<Cluster> for Vec<usize> {
    fn from(cluster: Cluster) -> Self {
        cluster.0
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (pos, index) in self.0.iter().enumerate() {
            if pos > 0 {
                write!(f, ",")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}
