//! Content digests for uploaded files and rendered reports

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Incremental digest over several parts, each length-prefixed so that
    /// `["ab", "c"]` and `["a", "bc"]` hash differently.
    pub fn of_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines and headers.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Checksum> for String {
    fn from(value: Checksum) -> Self {
        value.0
    }
}
