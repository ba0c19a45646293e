//! Typed wrappers for protected values.
//!
//! `Field<T, P>` and `NullField<T, P>` hold a plain value of any serde type
//! and convert it to and from its stored form. The protection marker `P`
//! selects the envelope pipeline:
//!
//! | marker             | write          | read             |
//! |--------------------|----------------|------------------|
//! | `Encryption`       | `encrypt`      | `decrypt`        |
//! | `Signing`          | `sign`         | `verify`         |
//! | `SignedEncryption` | `encrypt_sign` | `decrypt_verify` |
//!
//! After a read through a signed pipeline, `valid` reports whether the
//! signature matched. The value is populated either way, so `valid` must be
//! checked before the value is trusted.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::column::StorageColumn;
use crate::envelope;
use crate::error::{Result, SealError};
use crate::setup::{self, Config};

/// A protection pipeline: how a value is written and read back.
pub trait Protection {
    /// Produce the stored bytes for a value.
    fn seal<T: Serialize>(config: &Config, value: &T) -> Result<Vec<u8>>;

    /// Recover a value and whether it is authentic.
    fn open<T: DeserializeOwned>(config: &Config, source: &[u8]) -> Result<(T, bool)>;
}

/// Confidentiality only. Reads are always `valid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encryption;

/// Integrity only. The value is stored in the clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signing;

/// Confidentiality and integrity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignedEncryption;

impl Protection for Encryption {
    fn seal<T: Serialize>(config: &Config, value: &T) -> Result<Vec<u8>> {
        envelope::encrypt(config, value)
    }

    fn open<T: DeserializeOwned>(config: &Config, source: &[u8]) -> Result<(T, bool)> {
        Ok((envelope::decrypt(config, source)?, true))
    }
}

impl Protection for Signing {
    fn seal<T: Serialize>(config: &Config, value: &T) -> Result<Vec<u8>> {
        envelope::sign(config, value)
    }

    fn open<T: DeserializeOwned>(config: &Config, source: &[u8]) -> Result<(T, bool)> {
        let verified = envelope::verify(config, source)?;
        Ok((verified.value, verified.valid))
    }
}

impl Protection for SignedEncryption {
    fn seal<T: Serialize>(config: &Config, value: &T) -> Result<Vec<u8>> {
        envelope::encrypt_sign(config, value)
    }

    fn open<T: DeserializeOwned>(config: &Config, source: &[u8]) -> Result<(T, bool)> {
        let verified = envelope::decrypt_verify(config, source)?;
        Ok((verified.value, verified.valid))
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A protected value that is never null in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<T, P> {
    pub raw: T,
    pub valid: bool,
    protection: PhantomData<fn() -> P>,
}

pub type Encrypted<T> = Field<T, Encryption>;
pub type Signed<T> = Field<T, Signing>;
pub type SignedEncrypted<T> = Field<T, SignedEncryption>;

impl<T, P> Field<T, P> {
    pub fn new(raw: T) -> Self {
        Self {
            raw,
            valid: true,
            protection: PhantomData,
        }
    }

    pub fn into_inner(self) -> T {
        self.raw
    }
}

impl<T, P> From<T> for Field<T, P> {
    fn from(raw: T) -> Self {
        Self::new(raw)
    }
}

impl<T: Default, P> Default for Field<T, P> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T, P> Field<T, P>
where
    T: Serialize + DeserializeOwned,
    P: Protection,
{
    /// Stored form of the value. Always `Some`.
    pub fn to_storage_value(&self, config: &Config) -> Result<Option<Vec<u8>>> {
        P::seal(config, &self.raw).map(Some)
    }

    /// Populate from a stored form. A null column is an error.
    pub fn from_storage_value(&mut self, config: &Config, source: Option<&[u8]>) -> Result<()> {
        let source = source.ok_or(SealError::UnexpectedNull)?;
        let (raw, valid) = P::open(config, source)?;
        self.raw = raw;
        self.valid = valid;
        Ok(())
    }

    /// `to_storage_value` with the process-wide configuration.
    pub fn to_storage_value_global(&self) -> Result<Option<Vec<u8>>> {
        self.to_storage_value(setup::global()?)
    }

    /// `from_storage_value` with the process-wide configuration.
    pub fn from_storage_value_global(&mut self, source: Option<&[u8]>) -> Result<()> {
        self.from_storage_value(setup::global()?, source)
    }
}

impl<T, P> StorageColumn for Field<T, P> {}

// ---------------------------------------------------------------------------
// NullField
// ---------------------------------------------------------------------------

/// A protected value that may be null in storage.
///
/// An `empty` field is written as a null column without touching any
/// algorithm, and a null column reads back as an empty field holding
/// `T::default()`. Absence is treated as valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullField<T, P> {
    pub raw: T,
    pub empty: bool,
    pub valid: bool,
    protection: PhantomData<fn() -> P>,
}

pub type NullEncrypted<T> = NullField<T, Encryption>;
pub type NullSigned<T> = NullField<T, Signing>;
pub type NullSignedEncrypted<T> = NullField<T, SignedEncryption>;

impl<T, P> NullField<T, P> {
    pub fn new(raw: T) -> Self {
        Self {
            raw,
            empty: false,
            valid: true,
            protection: PhantomData,
        }
    }

    /// The value as an `Option`, `None` when empty.
    pub fn into_option(self) -> Option<T> {
        (!self.empty).then_some(self.raw)
    }
}

impl<T: Default, P> NullField<T, P> {
    pub fn null() -> Self {
        Self {
            raw: T::default(),
            empty: true,
            valid: true,
            protection: PhantomData,
        }
    }
}

impl<T: Default, P> Default for NullField<T, P> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Default, P> From<Option<T>> for NullField<T, P> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(raw) => Self::new(raw),
            None => Self::null(),
        }
    }
}

impl<T, P> NullField<T, P>
where
    T: Serialize + DeserializeOwned + Default,
    P: Protection,
{
    /// Stored form of the value, `None` when empty.
    pub fn to_storage_value(&self, config: &Config) -> Result<Option<Vec<u8>>> {
        if self.empty {
            return Ok(None);
        }
        P::seal(config, &self.raw).map(Some)
    }

    /// Populate from a stored form. A null column yields an empty field.
    pub fn from_storage_value(&mut self, config: &Config, source: Option<&[u8]>) -> Result<()> {
        match source {
            None => *self = Self::null(),
            Some(source) => {
                let (raw, valid) = P::open(config, source)?;
                *self = Self {
                    raw,
                    empty: false,
                    valid,
                    protection: PhantomData,
                };
            }
        }
        Ok(())
    }

    pub fn to_storage_value_global(&self) -> Result<Option<Vec<u8>>> {
        self.to_storage_value(setup::global()?)
    }

    pub fn from_storage_value_global(&mut self, source: Option<&[u8]>) -> Result<()> {
        self.from_storage_value(setup::global()?, source)
    }
}

impl<T, P> StorageColumn for NullField<T, P> {}
