//! The envelope protocol.
//!
//! Write paths chain `serialize -> encrypt -> encode` (and/or `sign -> encode`)
//! under the setup active at write time, wrap the result in an `Envelope`
//! stamped with that time, and serialize the envelope itself.
//!
//! Read paths reverse this. The envelope has to be parsed before the writing
//! setup is known, so parsing is attempted with each configured setup's
//! serializer in turn; the envelope's `At` stamp then selects the setup used
//! for every remaining stage.
//!
//! Failure semantics differ on purpose:
//! - anything that prevents decryption is an error, and no value is returned;
//! - a signature that does not match is *not* an error. The value is still
//!   returned, with `Verified::valid == false`. Callers must check it.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Result, SealError};
use crate::serializing;
use crate::setup::{Config, Setup};

/// The stored record wrapping a protected value.
///
/// `raw` holds encoded ciphertext (encrypted variants) or the plaintext
/// serialization (sign-only). `signature` holds the encoded signature over
/// the plaintext serialization. `at` is the write time and selects the setup
/// on read; an envelope without it is read with the current setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Raw")]
    pub raw: Vec<u8>,
    #[serde(rename = "Signature", default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    #[serde(rename = "At", default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Serialize the envelope with the serializer of `setup`.
    pub fn to_bytes(&self, setup: &Setup) -> Result<Vec<u8>> {
        serializing::serialize(setup.serializer.as_ref(), self)
    }

    /// Parse stored bytes by trial across the configured setups, newest
    /// first. Returns the envelope and the setup that was active when it was
    /// written.
    ///
    /// When no serializer can parse the bytes, fails with `NoMatchingSetup`
    /// carrying the last parse error.
    pub fn parse<'c>(config: &'c Config, source: &[u8]) -> Result<(Self, &'c Setup)> {
        if source.is_empty() {
            return Err(SealError::Serialization {
                algorithm: "envelope",
                reason: "empty input".to_string(),
            });
        }

        let mut tried: Vec<&'static str> = Vec::new();
        let mut last_error = None;

        for (activated, setup) in config.setups() {
            let name = setup.serializer.name();
            if tried.contains(&name) {
                continue;
            }
            tried.push(name);

            match serializing::unserialize::<Envelope>(setup.serializer.as_ref(), source) {
                Ok(envelope) => {
                    let written = envelope.at.unwrap_or_else(Utc::now);
                    return Ok((envelope, config.resolve(written)));
                }
                Err(e) => {
                    debug!(%activated, serializer = name, "envelope did not parse");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => SealError::NoMatchingSetup(Box::new(e)),
            None => SealError::EmptyConfig,
        })
    }
}

/// A value read through a signed pipeline, with the verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    /// The stored value. Untrusted unless `valid`.
    pub value: T,
    /// Whether the signature matched.
    pub valid: bool,
}

impl<T> Verified<T> {
    /// The value if, and only if, its signature matched.
    pub fn into_trusted(self) -> Option<T> {
        self.valid.then_some(self.value)
    }
}

// ---------------------------------------------------------------------------
// Write paths
// ---------------------------------------------------------------------------

/// Encrypt a value under the current setup.
pub fn encrypt<T>(config: &Config, value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    encrypt_at(config, value, Utc::now())
}

/// Encrypt a value as if written at `at`, under the setup active then.
pub fn encrypt_at<T>(config: &Config, value: &T, at: DateTime<Utc>) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let setup = config.resolve(at);
    let serial = serializing::serialize(setup.serializer.as_ref(), value)?;

    let envelope = Envelope {
        raw: seal(setup, &serial)?,
        signature: None,
        at: Some(at),
    };
    trace!(setup = %setup, "encrypted value");
    envelope.to_bytes(setup)
}

/// Sign a value under the current setup. The value is stored in the clear.
pub fn sign<T>(config: &Config, value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    sign_at(config, value, Utc::now())
}

/// Sign a value as if written at `at`.
pub fn sign_at<T>(config: &Config, value: &T, at: DateTime<Utc>) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let setup = config.resolve(at);
    let serial = serializing::serialize(setup.serializer.as_ref(), value)?;
    let signature = signature_for(setup, &serial)?;

    let envelope = Envelope {
        raw: serial,
        signature: Some(signature),
        at: Some(at),
    };
    trace!(setup = %setup, "signed value");
    envelope.to_bytes(setup)
}

/// Encrypt and sign a value under the current setup.
///
/// The signature covers the plaintext serialization, not the ciphertext, so
/// it is checked against the decrypted content on read.
pub fn encrypt_sign<T>(config: &Config, value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    encrypt_sign_at(config, value, Utc::now())
}

/// Encrypt and sign a value as if written at `at`.
pub fn encrypt_sign_at<T>(config: &Config, value: &T, at: DateTime<Utc>) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let setup = config.resolve(at);
    let serial = serializing::serialize(setup.serializer.as_ref(), value)?;

    let envelope = Envelope {
        raw: seal(setup, &serial)?,
        signature: Some(signature_for(setup, &serial)?),
        at: Some(at),
    };
    trace!(setup = %setup, "encrypted and signed value");
    envelope.to_bytes(setup)
}

// ---------------------------------------------------------------------------
// Read paths
// ---------------------------------------------------------------------------

/// Decrypt a value written by `encrypt` or `encrypt_sign`.
///
/// Any failure, including a failed authentication tag, is an error.
pub fn decrypt<T>(config: &Config, source: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let (envelope, setup) = Envelope::parse(config, source)?;
    let plaintext = open(setup, &envelope.raw)?;
    serializing::unserialize(setup.serializer.as_ref(), &plaintext)
}

/// Read a value written by `sign` and check its signature.
///
/// The value is returned whether or not the signature matches.
pub fn verify<T>(config: &Config, source: &[u8]) -> Result<Verified<T>>
where
    T: DeserializeOwned,
{
    let (envelope, setup) = Envelope::parse(config, source)?;
    let valid = check_signature(setup, &envelope, &envelope.raw)?;
    let value = serializing::unserialize(setup.serializer.as_ref(), &envelope.raw)?;
    Ok(Verified { value, valid })
}

/// Decrypt a value written by `encrypt_sign` and check its signature
/// against the decrypted plaintext.
///
/// Decryption failure is an error; signature mismatch is reported through
/// `Verified::valid`.
pub fn decrypt_verify<T>(config: &Config, source: &[u8]) -> Result<Verified<T>>
where
    T: DeserializeOwned,
{
    let (envelope, setup) = Envelope::parse(config, source)?;
    let plaintext = open(setup, &envelope.raw)?;
    let valid = check_signature(setup, &envelope, &plaintext)?;
    let value = serializing::unserialize(setup.serializer.as_ref(), &plaintext)?;
    Ok(Verified { value, valid })
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn seal(setup: &Setup, serial: &[u8]) -> Result<Vec<u8>> {
    let sealed = setup.encrypter.encrypt(serial)?;
    setup.encoder.encode(&sealed)
}

fn open(setup: &Setup, raw: &[u8]) -> Result<Vec<u8>> {
    let sealed = setup.encoder.decode(raw)?;
    setup.encrypter.decrypt(&sealed)
}

fn signature_for(setup: &Setup, serial: &[u8]) -> Result<Vec<u8>> {
    let signature = setup.signer.sign(serial)?;
    setup.encoder.encode(&signature)
}

fn check_signature(setup: &Setup, envelope: &Envelope, message: &[u8]) -> Result<bool> {
    let encoded = envelope
        .signature
        .as_deref()
        .ok_or(SealError::MissingSignature)?;
    let signature = setup.encoder.decode(encoded)?;

    let valid = setup.signer.verify(message, &signature)?;
    if !valid {
        warn!(signer = setup.signer.name(), at = ?envelope.at, "signature mismatch");
    }
    Ok(valid)
}
