use ace_core::errors::AceError;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::serde::to_canonical_json_bytes;

/// Stable SHA-256 hex digest of a value's canonical JSON form.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, AceError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}
