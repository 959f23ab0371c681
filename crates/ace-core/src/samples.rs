//! Binary sample matrices in the 0/1 basis.

use serde::{Deserialize, Serialize};

use crate::errors::{AceError, ErrorInfo};

/// Encoding of the raw sample values handed to [`SampleMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SampleBasis {
    /// Spin values in `{-1, +1}`; mapped to `(x + 1) / 2`.
    #[default]
    Spin,
    /// Bit values in `{0, 1}`.
    Bit,
}

/// Row-major matrix of binary observations (`rows × n`), stored as 0/1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMatrix {
    n: usize,
    bits: Vec<u8>,
}

fn sample_error(code: &str, message: impl Into<String>) -> AceError {
    AceError::Input(ErrorInfo::new(code, message.into()))
}

impl SampleMatrix {
    /// Builds a sample matrix from rows of `±1` spins.
    pub fn from_spins<R: AsRef<[i8]>>(rows: &[R]) -> Result<Self, AceError> {
        Self::from_rows(rows, SampleBasis::Spin)
    }

    /// Builds a sample matrix from rows of `0/1` bits.
    pub fn from_bits<R: AsRef<[i8]>>(rows: &[R]) -> Result<Self, AceError> {
        Self::from_rows(rows, SampleBasis::Bit)
    }

    /// Builds a sample matrix from rows encoded in `basis`.
    pub fn from_rows<R: AsRef<[i8]>>(rows: &[R], basis: SampleBasis) -> Result<Self, AceError> {
        let first = rows
            .first()
            .ok_or_else(|| sample_error("empty-samples", "at least one sample is required"))?;
        let n = first.as_ref().len();
        if n == 0 {
            return Err(sample_error(
                "empty-samples",
                "samples must contain at least one variable",
            ));
        }
        let mut bits = Vec::with_capacity(rows.len() * n);
        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(AceError::Input(
                    ErrorInfo::new("ragged-samples", "every sample must have the same length")
                        .with_context("row", row_idx.to_string())
                        .with_context("expected", n.to_string())
                        .with_context("found", row.len().to_string()),
                ));
            }
            for &value in row {
                let bit = match (basis, value) {
                    (SampleBasis::Spin, -1) | (SampleBasis::Bit, 0) => 0,
                    (SampleBasis::Spin, 1) | (SampleBasis::Bit, 1) => 1,
                    _ => {
                        return Err(AceError::Input(
                            ErrorInfo::new("invalid-sample", "sample value outside basis")
                                .with_context("row", row_idx.to_string())
                                .with_context("value", value.to_string())
                                .with_context("basis", format!("{basis:?}")),
                        ))
                    }
                };
                bits.push(bit);
            }
        }
        Ok(Self { n, bits })
    }

    /// Number of binary variables per sample.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.bits.len() / self.n
    }

    /// Returns `true` when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Iterates over samples as 0/1 slices.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.bits.chunks(self.n)
    }
}
