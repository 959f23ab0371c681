//! Synthetic sample generators for tests, benches and demos.

use crate::errors::{AceError, ErrorInfo};
use crate::rng::RngHandle;
use crate::samples::SampleMatrix;

/// Draws `count` samples of independent Bernoulli variables with the given
/// activation frequencies, returned in the 0/1 basis.
pub fn independent_samples(
    freqs: &[f64],
    count: usize,
    rng: &mut RngHandle,
) -> Result<SampleMatrix, AceError> {
    if let Some((idx, p)) = freqs
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        return Err(AceError::Input(
            ErrorInfo::new("invalid-frequency", "frequencies must lie in [0, 1]")
                .with_context("index", idx.to_string())
                .with_context("value", p.to_string()),
        ));
    }
    let rows: Vec<Vec<i8>> = (0..count)
        .map(|_| freqs.iter().map(|&p| i8::from(rng.bernoulli(p))).collect())
        .collect();
    SampleMatrix::from_bits(&rows)
}

/// Draws samples where variable `i + 1` copies variable `i` with probability
/// `coupling`, otherwise it is resampled with frequency `base`.
///
/// Produces a chain of positively correlated variables whose pair statistics
/// stay strictly inside the probability simplex for `coupling < 1`.
pub fn chain_samples(
    n: usize,
    base: f64,
    coupling: f64,
    count: usize,
    rng: &mut RngHandle,
) -> Result<SampleMatrix, AceError> {
    if !(0.0..=1.0).contains(&base) || !(0.0..=1.0).contains(&coupling) {
        return Err(AceError::input(
            "invalid-frequency",
            "chain base and coupling must lie in [0, 1]",
        ));
    }
    let mut rows = Vec::with_capacity(count);
    for _ in 0..count {
        let mut row: Vec<i8> = Vec::with_capacity(n);
        for idx in 0..n {
            let value = if idx > 0 && rng.bernoulli(coupling) {
                row[idx - 1]
            } else {
                i8::from(rng.bernoulli(base))
            };
            row.push(value);
        }
        rows.push(row);
    }
    SampleMatrix::from_bits(&rows)
}
