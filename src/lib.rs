//! # sealfield
//!
//! Pluggable envelope encryption and signing for values stored in a database
//! column.
//!
//! A value goes through four replaceable stages on its way to storage:
//! serialize, encrypt and/or sign, encode, and finally wrap in an envelope
//! stamped with the write time. Each stage is a trait object chosen by a
//! `Setup`. A `Config` keeps several setups keyed by activation time, so data
//! written before a key or algorithm rotation keeps decrypting afterwards.
//!
//! ## Public API
//!
//! - Algorithms: the `Encoding`, `Serializer`, `Encrypter` and `Signer`
//!   traits and their built-in implementations.
//! - `Setup`, `Config`, and the process-wide `init` / `global` pair.
//! - The envelope functions: `encrypt`, `sign`, `encrypt_sign` and their
//!   readers `decrypt`, `verify`, `decrypt_verify`.
//! - Typed wrappers `Field` / `NullField` with storage hooks.
//! - `Registry` and `ConfigDocument` for persisting a configuration.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use sealfield::encoding::Base64;
//! use sealfield::encryption::Aes256Gcm;
//! use sealfield::serializing::Json;
//! use sealfield::signing::Ed25519;
//! use sealfield::{Config, Setup, SignedEncrypted};
//!
//! # fn main() -> sealfield::Result<()> {
//! let config = Config::builder()
//!     .setup(
//!         Utc::now(),
//!         Setup::new(
//!             Arc::new(Base64),
//!             Arc::new(Json),
//!             Arc::new(Aes256Gcm::generate()?),
//!             Arc::new(Ed25519::generate()?),
//!         ),
//!     )
//!     .build()?;
//!
//! let stored = SignedEncrypted::new("4111 1111 1111 1111".to_string())
//!     .to_storage_value(&config)?;
//!
//! let mut card = SignedEncrypted::<String>::default();
//! card.from_storage_value(&config, stored.as_deref())?;
//! assert!(card.valid);
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod column;
pub mod document;
pub mod encoding;
pub mod encryption;
pub mod envelope;
pub mod error;
pub mod field;
pub mod keys;
pub mod registry;
pub mod serializing;
pub mod setup;
pub mod signing;

pub use algorithm::{Algorithm, AlgorithmConfig, Family};
pub use document::ConfigDocument;
pub use envelope::{
    decrypt, decrypt_verify, encrypt, encrypt_at, encrypt_sign, encrypt_sign_at, sign, sign_at,
    verify, Envelope, Verified,
};
pub use error::{Result, SealError};
pub use field::{
    Encrypted, Field, NullEncrypted, NullField, NullSigned, NullSignedEncrypted, Signed,
    SignedEncrypted,
};
pub use keys::SymmetricKey;
pub use registry::Registry;
pub use setup::{global, init, Config, Setup};
