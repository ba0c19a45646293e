//! Key material and randomness.
//!
//! This module owns two responsibilities:
//! 1. Producing random bytes for keys and nonces. `ring::rand::SystemRandom`
//!    backs every algorithm except RSA, whose key generation and padding
//!    draw from the `rand_core` OS generator.
//! 2. Holding symmetric key material in a type that is opaque,
//!    non-cloneable, and zeroised on drop.
//!
//! ## Derivation structure
//!
//! ```text
//! HKDF-SHA256(
//!     ikm  = parent key,
//!     salt = None,
//!     info = "{context}"
//! )
//! ```
//!
//! Deriving one key per setup (e.g. with the activation date as context)
//! lets an application rotate keys while managing a single master secret.

use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SealError};

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Fill a fixed-size buffer from the system random number generator.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; N];
    rng.fill(&mut buf).map_err(|_| SealError::RandomnessFailure)?;
    Ok(buf)
}

/// A 256-bit symmetric key.
///
/// - Not `Clone`. Cannot be duplicated without explicit conversion.
/// - Zeroised on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_LEN],
}

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Result<Self> {
        Ok(Self {
            bytes: random_bytes()?,
        })
    }

    /// Wrap existing key bytes. In production these should come from a KMS.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Parse a hex-encoded 32-byte key.
    pub fn from_hex(text: &str) -> Result<Self> {
        let decoded = hex::decode(text).map_err(|_| SealError::InvalidKey)?;
        let bytes: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| SealError::InvalidKey)?;
        Ok(Self { bytes })
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive an independent child key bound to `context`.
    ///
    /// Different contexts produce statistically independent keys; a child
    /// key reveals nothing about its parent.
    pub fn derive(&self, context: &str) -> Result<Self> {
        let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]);
        let prk = salt.extract(&self.bytes);

        let info = [context.as_bytes()];
        let okm = prk
            .expand(&info, hkdf::HKDF_SHA256)
            .map_err(|_| SealError::KeyDerivationFailure)?;

        let mut derived = [0u8; KEY_LEN];
        okm.fill(&mut derived)
            .map_err(|_| SealError::KeyDerivationFailure)?;

        Ok(Self { bytes: derived })
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}
