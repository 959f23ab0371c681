use std::collections::BTreeSet;

use ace_core::errors::{AceError, ErrorInfo};
use itertools::Itertools;

/// Every distinct `size`-element subset of `indices`.
///
/// Subsets keep the input order of their elements. `size == 0` or a size
/// larger than the input yields no subsets; the full size yields the input
/// itself. Inputs containing duplicates are rejected.
pub fn subsets(indices: &[usize], size: usize) -> Result<Vec<Vec<usize>>, AceError> {
    let distinct: BTreeSet<usize> = indices.iter().copied().collect();
    if distinct.len() != indices.len() {
        return Err(AceError::Input(
            ErrorInfo::new("duplicate-index", "subset enumeration requires distinct indices")
                .with_context("indices", format!("{indices:?}")),
        ));
    }
    if size == 0 || size > indices.len() {
        return Ok(Vec::new());
    }
    if size == indices.len() {
        return Ok(vec![indices.to_vec()]);
    }
    Ok(indices.iter().copied().combinations(size).collect())
}

/// Binomial coefficient `C(n, k)`; zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}
