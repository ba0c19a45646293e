//! Value-to-bytes serializers.
//!
//! A serializer is used twice per pipeline: once for the protected value
//! itself and once for the envelope that wraps it. To keep the trait
//! object-safe, values cross the boundary as a `serde_json::Value` document
//! tree; `serialize` and `unserialize` below perform the typed conversion.
//! Every serializer must therefore be self-describing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_cbor::Value as CborValue;
use serde_json::Value;

use crate::algorithm::Algorithm;
use crate::error::{Result, SealError};

/// Converts a document tree to a flat byte sequence and back.
pub trait Serializer: Algorithm {
    /// Flatten a document into bytes.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>>;

    /// Parse bytes back into a document. Fails on malformed input.
    fn unserialize(&self, source: &[u8]) -> Result<Value>;
}

fn failure(algorithm: &'static str, reason: impl ToString) -> SealError {
    SealError::Serialization {
        algorithm,
        reason: reason.to_string(),
    }
}

/// Serialize a typed value with the given serializer.
///
/// Fails on NaN and infinite floats anywhere in the value. The document tree
/// would otherwise store them as null.
pub fn serialize<T>(serializer: &dyn Serializer, value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    ensure_finite(serializer.name(), value)?;
    let document = serde_json::to_value(value).map_err(|e| failure(serializer.name(), e))?;
    serializer.serialize(&document)
}

fn ensure_finite<T>(algorithm: &'static str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    // CBOR's value model keeps floats as written, NaN and infinities included.
    let tree = serde_cbor::value::to_value(value).map_err(|e| failure(algorithm, e))?;
    if has_non_finite(&tree) {
        return Err(failure(algorithm, "non-finite float cannot be stored"));
    }
    Ok(())
}

fn has_non_finite(value: &CborValue) -> bool {
    match value {
        CborValue::Float(f) => !f.is_finite(),
        CborValue::Array(items) => items.iter().any(has_non_finite),
        CborValue::Map(entries) => entries
            .iter()
            .any(|(key, value)| has_non_finite(key) || has_non_finite(value)),
        CborValue::Tag(_, inner) => has_non_finite(inner),
        _ => false,
    }
}

/// Unserialize bytes into a typed value with the given serializer.
///
/// Fails when the bytes are malformed or do not match the shape of `T`.
pub fn unserialize<T>(serializer: &dyn Serializer, source: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let document = serializer.unserialize(source)?;
    serde_json::from_value(document).map_err(|e| failure(serializer.name(), e))
}

/// JSON text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Algorithm for Json {
    fn name(&self) -> &'static str {
        "json"
    }
}

impl Serializer for Json {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| failure(self.name(), e))
    }

    fn unserialize(&self, source: &[u8]) -> Result<Value> {
        serde_json::from_slice(source).map_err(|e| failure(self.name(), e))
    }
}

/// CBOR (RFC 8949), a self-describing binary format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cbor;

impl Algorithm for Cbor {
    fn name(&self) -> &'static str {
        "cbor"
    }
}

impl Serializer for Cbor {
    fn serialize(&self, value: &Value) -> Result<Vec<u8>> {
        serde_cbor::to_vec(value).map_err(|e| failure(self.name(), e))
    }

    fn unserialize(&self, source: &[u8]) -> Result<Value> {
        serde_cbor::from_slice(source).map_err(|e| failure(self.name(), e))
    }
}
