//! Hash function adapter.
//!
//! Every digest in the ledger is a 256-bit value rendered as 64 lowercase hex
//! characters. SHA-256 is the default algorithm; BLAKE3 can be selected
//! through configuration.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded digest.
pub const HEX_DIGEST_LEN: usize = 64;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Compute the raw digest of `data`.
    pub fn digest(&self, data: &[u8]) -> H256 {
        match self {
            Self::Sha256 => to_h256(&Sha256::digest(data)),
            Self::Blake3 => blake3::hash(data).into(),
        }
    }

    /// Compute the hex-encoded digest of `data`.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }

    /// Hash multiple pieces of data as if they were concatenated.
    pub fn hash_concat_hex(&self, parts: &[&[u8]]) -> String {
        let digest: H256 = match self {
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                to_h256(&hasher.finalize())
            }
            Self::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().into()
            }
        };
        hex::encode(digest)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha256"),
            Self::Blake3 => f.write_str("blake3"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

fn to_h256(bytes: &[u8]) -> H256 {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}

/// SHA-256 of `data` as lowercase hex.
pub fn hash_hex(data: &[u8]) -> String {
    HashAlgorithm::Sha256.hash_hex(data)
}
