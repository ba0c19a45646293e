//! Shared surface of every pluggable algorithm.
//!
//! Each algorithm family (encoding, serializing, encryption, signing) has its
//! own capability trait, but all of them expose a stable name and an
//! exportable configuration map so that a `Setup` can be written to a
//! configuration document and rebuilt through the `Registry`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SealError};

/// Exportable configuration of an algorithm instance.
///
/// Secret material is stored hex-encoded. Keyless algorithms export an
/// empty map.
pub type AlgorithmConfig = BTreeMap<String, String>;

/// The four algorithm families a `Setup` is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    Encoding,
    Serializing,
    Encryption,
    Signing,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding => write!(f, "encoding"),
            Self::Serializing => write!(f, "serializing"),
            Self::Encryption => write!(f, "encryption"),
            Self::Signing => write!(f, "signing"),
        }
    }
}

/// Identity and configuration export common to all algorithms.
///
/// Instances are shared between setups and threads, so every algorithm must
/// be `Send + Sync` and hold no per-call mutable state.
pub trait Algorithm: Send + Sync {
    /// Registry name of the algorithm.
    fn name(&self) -> &'static str;

    /// Configuration map that, handed to the registry factory registered
    /// under `name()`, rebuilds an equivalent instance.
    fn config(&self) -> AlgorithmConfig {
        AlgorithmConfig::new()
    }
}

/// Fetch a required entry from a configuration map.
pub(crate) fn required<'a>(
    config: &'a AlgorithmConfig,
    algorithm: &str,
    key: &str,
) -> Result<&'a str> {
    config
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| SealError::InvalidAlgorithmConfig {
            algorithm: algorithm.to_string(),
            reason: format!("missing `{key}`"),
        })
}

/// Decode a hex entry of a configuration map into raw bytes.
pub(crate) fn hex_bytes(config: &AlgorithmConfig, algorithm: &str, key: &str) -> Result<Vec<u8>> {
    let text = required(config, algorithm, key)?;
    hex::decode(text).map_err(|e| SealError::InvalidAlgorithmConfig {
        algorithm: algorithm.to_string(),
        reason: format!("`{key}` is not valid hex: {e}"),
    })
}

/// Decode a hex entry into a fixed-size array.
pub(crate) fn hex_array<const N: usize>(
    config: &AlgorithmConfig,
    algorithm: &str,
    key: &str,
) -> Result<[u8; N]> {
    let bytes = hex_bytes(config, algorithm, key)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| SealError::InvalidAlgorithmConfig {
            algorithm: algorithm.to_string(),
            reason: format!("`{key}` must be {N} bytes, got {}", bytes.len()),
        })
}

/// Build a single-entry configuration map.
pub(crate) fn single(key: &str, value: String) -> AlgorithmConfig {
    let mut config = AlgorithmConfig::new();
    config.insert(key.to_string(), value);
    config
}
