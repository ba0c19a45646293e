//! Error types for sealfield.
//!
//! Every variant is a distinct failure mode of the envelope pipelines or of
//! configuration. Messages are intentionally minimal: they name *what*
//! failed, never the key material or plaintext involved.

use thiserror::Error;

use crate::algorithm::Family;

/// The single error type for all sealfield operations.
#[derive(Debug, Error)]
pub enum SealError {
    /// A key was invalid (wrong length, malformed, etc.).
    #[error("invalid key")]
    InvalidKey,

    /// Encryption failed inside the underlying primitive.
    #[error("encryption failed")]
    EncryptionFailure,

    /// Decryption failed. This includes: wrong key, tampered ciphertext,
    /// truncated input, or a failed authentication tag. These cases are
    /// deliberately indistinguishable.
    #[error("decryption failed")]
    DecryptionFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// Key derivation (HKDF) failed.
    #[error("key derivation failed")]
    KeyDerivationFailure,

    /// The signing primitive failed to produce a signature.
    #[error("signing failed")]
    SigningFailure,

    /// A signature could not be interpreted at all. A well-formed signature
    /// that simply does not match is not an error.
    #[error("malformed signature")]
    MalformedSignature,

    /// A signed read found an envelope without a signature.
    #[error("envelope carries no signature")]
    MissingSignature,

    /// Text could not be decoded by the configured encoding.
    #[error("{algorithm} decoding failed: {reason}")]
    Encoding {
        algorithm: &'static str,
        reason: String,
    },

    /// A value could not be serialized or unserialized.
    #[error("{algorithm} serialization failed: {reason}")]
    Serialization {
        algorithm: &'static str,
        reason: String,
    },

    /// A `Config` was built without any setups.
    #[error("configuration has no setups")]
    EmptyConfig,

    /// No factory is registered under the requested name.
    #[error("unknown {family} algorithm: {name}")]
    UnknownAlgorithm { family: Family, name: String },

    /// A factory rejected its configuration map.
    #[error("invalid configuration for {algorithm}: {reason}")]
    InvalidAlgorithmConfig { algorithm: String, reason: String },

    /// No configured setup could parse the stored envelope. Carries the
    /// error from the last attempt.
    #[error("no configured setup can read this value: {0}")]
    NoMatchingSetup(Box<SealError>),

    /// A non-nullable field was handed an absent storage value.
    #[error("unexpected null for a non-nullable field")]
    UnexpectedNull,

    /// The process-wide configuration was already set.
    #[error("configuration already initialized")]
    AlreadyInitialized,

    /// The process-wide configuration has not been set.
    #[error("configuration not initialized")]
    NotInitialized,

    /// A configuration document could not be read or written.
    #[error("configuration document: {0}")]
    Document(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = SealError> = std::result::Result<T, E>;
