//! Integrity algorithms.
//!
//! Signers follow one rule that the envelope relies on: a signature that is
//! well-formed but does not match is reported as `Ok(false)`, never as an
//! error. Only signatures that cannot be interpreted at all
//! (`MalformedSignature`) are errors.

use ring::hmac;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, UnparsedPublicKey};
use zeroize::Zeroizing;

use crate::algorithm::{self, Algorithm, AlgorithmConfig};
use crate::error::{Result, SealError};
use crate::keys::{random_bytes, KEY_LEN};

/// Produces and checks signatures over byte payloads.
pub trait Signer: Algorithm {
    /// Sign a payload.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Check a signature. Mismatch is `Ok(false)`.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

const ED25519_SIGNATURE_LEN: usize = 64;

/// Ed25519 keyed by a 32-byte seed.
pub struct Ed25519 {
    seed: Zeroizing<[u8; KEY_LEN]>,
    key_pair: Ed25519KeyPair,
}

impl Ed25519 {
    /// Construct from a 32-byte seed.
    pub fn from_seed(seed: [u8; KEY_LEN]) -> Result<Self> {
        let key_pair =
            Ed25519KeyPair::from_seed_unchecked(&seed).map_err(|_| SealError::InvalidKey)?;
        Ok(Self {
            seed: Zeroizing::new(seed),
            key_pair,
        })
    }

    /// Construct with a freshly generated seed.
    pub fn generate() -> Result<Self> {
        Self::from_seed(random_bytes()?)
    }

    /// The public half of the key pair.
    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        Self::from_seed(algorithm::hex_array::<KEY_LEN>(config, "ed25519", "key")?)
    }
}

impl Algorithm for Ed25519 {
    fn name(&self) -> &'static str {
        "ed25519"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.seed.as_slice()))
    }
}

impl Signer for Ed25519 {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key_pair.sign(message).as_ref().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != ED25519_SIGNATURE_LEN {
            return Err(SealError::MalformedSignature);
        }
        let public = UnparsedPublicKey::new(&signature::ED25519, self.public_key());
        Ok(public.verify(message, signature).is_ok())
    }
}

// ---------------------------------------------------------------------------
// ECDSA
// ---------------------------------------------------------------------------

/// Upper bound of a DER-encoded P-256 signature.
const ECDSA_P256_MAX_SIGNATURE_LEN: usize = 72;

/// ECDSA over P-256 with SHA-256, ASN.1 DER signatures.
///
/// Keys are exported as hex-encoded PKCS#8 documents.
pub struct Ecdsa {
    pkcs8: Zeroizing<Vec<u8>>,
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl Ecdsa {
    /// Construct from a PKCS#8 v1 document holding a P-256 private key.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
                .map_err(|_| SealError::InvalidKey)?;
        Ok(Self {
            pkcs8: Zeroizing::new(pkcs8.to_vec()),
            key_pair,
            rng,
        })
    }

    /// Construct with a freshly generated key pair.
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let document =
            EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
                .map_err(|_| SealError::RandomnessFailure)?;
        Self::from_pkcs8(document.as_ref())
    }

    /// The public half of the key pair (uncompressed SEC1 point).
    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        Self::from_pkcs8(&algorithm::hex_bytes(config, "ecdsa", "key")?)
    }
}

impl Algorithm for Ecdsa {
    fn name(&self) -> &'static str {
        "ecdsa"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.pkcs8.as_slice()))
    }
}

impl Signer for Ecdsa {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature = self
            .key_pair
            .sign(&self.rng, message)
            .map_err(|_| SealError::SigningFailure)?;
        Ok(signature.as_ref().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        // A DER signature is always a SEQUENCE.
        if signature.first() != Some(&0x30) || signature.len() > ECDSA_P256_MAX_SIGNATURE_LEN {
            return Err(SealError::MalformedSignature);
        }
        let public = UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_ASN1, self.public_key());
        Ok(public.verify(message, signature).is_ok())
    }
}

// ---------------------------------------------------------------------------
// HMAC-SHA256
// ---------------------------------------------------------------------------

const HMAC_SHA256_TAG_LEN: usize = 32;

/// HMAC-SHA256 with a shared secret of at least 32 bytes.
pub struct HmacSha256 {
    secret: Zeroizing<Vec<u8>>,
    key: hmac::Key,
}

impl HmacSha256 {
    /// Construct from a shared secret.
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() < KEY_LEN {
            return Err(SealError::InvalidKey);
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        })
    }

    /// Construct with a freshly generated 32-byte secret.
    pub fn generate() -> Result<Self> {
        Self::new(&random_bytes::<KEY_LEN>()?)
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        Self::new(&algorithm::hex_bytes(config, "hmacsha256", "key")?)
    }
}

impl Algorithm for HmacSha256 {
    fn name(&self) -> &'static str {
        "hmacsha256"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.secret.as_slice()))
    }
}

impl Signer for HmacSha256 {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(hmac::sign(&self.key, message).as_ref().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != HMAC_SHA256_TAG_LEN {
            return Err(SealError::MalformedSignature);
        }
        Ok(hmac::verify(&self.key, message, signature).is_ok())
    }
}
