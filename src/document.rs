//! Configuration documents.
//!
//! A `ConfigDocument` is the persisted form of a `Config`: for every
//! activation time, the name and exported configuration of each of the four
//! algorithms. Documents contain key material in hex and must be stored
//! with the same care as the keys themselves.
//!
//! ```json
//! {
//!   "2024-01-01T00:00:00Z": {
//!     "encoding":    { "algorithm": "base64" },
//!     "serializing": { "algorithm": "json" },
//!     "encryption":  { "algorithm": "aes256gcm", "config": { "key": "…" } },
//!     "signing":     { "algorithm": "ed25519", "config": { "key": "…" } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::{Algorithm, AlgorithmConfig};
use crate::error::{Result, SealError};
use crate::registry::Registry;
use crate::setup::{Config, Setup};

/// One algorithm: registry name plus exported configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmDocument {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "AlgorithmConfig::is_empty")]
    pub config: AlgorithmConfig,
}

impl AlgorithmDocument {
    fn describe<A: Algorithm + ?Sized>(algorithm: &A) -> Self {
        Self {
            algorithm: algorithm.name().to_string(),
            config: algorithm.config(),
        }
    }
}

/// One setup in document form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupDocument {
    pub encoding: AlgorithmDocument,
    pub serializing: AlgorithmDocument,
    pub encryption: AlgorithmDocument,
    pub signing: AlgorithmDocument,
}

/// A whole configuration in document form, keyed by activation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    pub setups: BTreeMap<DateTime<Utc>, SetupDocument>,
}

impl ConfigDocument {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| SealError::Document(e.to_string()))
    }

    /// Parse from JSON.
    pub fn from_json(source: &[u8]) -> Result<Self> {
        serde_json::from_slice(source).map_err(|e| SealError::Document(e.to_string()))
    }
}

impl Setup {
    /// Describe this setup as a document.
    pub fn to_document(&self) -> SetupDocument {
        SetupDocument {
            encoding: AlgorithmDocument::describe(self.encoder.as_ref()),
            serializing: AlgorithmDocument::describe(self.serializer.as_ref()),
            encryption: AlgorithmDocument::describe(self.encrypter.as_ref()),
            signing: AlgorithmDocument::describe(self.signer.as_ref()),
        }
    }

    /// Rebuild a setup from its document through the registry.
    pub fn from_document(document: &SetupDocument, registry: &Registry) -> Result<Self> {
        Ok(Self {
            encoder: registry.encoding(&document.encoding.algorithm, &document.encoding.config)?,
            serializer: registry
                .serializer(&document.serializing.algorithm, &document.serializing.config)?,
            encrypter: registry
                .encrypter(&document.encryption.algorithm, &document.encryption.config)?,
            signer: registry.signer(&document.signing.algorithm, &document.signing.config)?,
        })
    }
}

impl Config {
    /// Describe every setup as a document.
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            setups: self
                .setups()
                .map(|(at, setup)| (*at, setup.to_document()))
                .collect(),
        }
    }

    /// Rebuild a configuration from a document. Any unknown algorithm name
    /// or rejected algorithm configuration fails the whole load.
    pub fn from_document(document: &ConfigDocument, registry: &Registry) -> Result<Self> {
        let setups = document
            .setups
            .iter()
            .map(|(at, setup)| -> Result<_> { Ok((*at, Setup::from_document(setup, registry)?)) })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Config::new(setups)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::encoding::Base64;
    use crate::encryption::Aes256Gcm;
    use crate::serializing::Json;
    use crate::signing::Ed25519;

    fn config() -> Config {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Config::builder()
            .setup(
                at,
                Setup::new(
                    Arc::new(Base64),
                    Arc::new(Json),
                    Arc::new(Aes256Gcm::generate().unwrap()),
                    Arc::new(Ed25519::generate().unwrap()),
                ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_document_json_roundtrip() {
        let document = config().to_document();
        let json = document.to_json().unwrap();
        assert_eq!(ConfigDocument::from_json(&json).unwrap(), document);
    }

    #[test]
    fn test_keyless_algorithms_omit_config() {
        let json = String::from_utf8(config().to_document().to_json().unwrap()).unwrap();
        assert!(json.contains("\"2024-01-01T00:00:00Z\""));
        assert!(json.contains("\"algorithm\": \"base64\"\n"));
    }

    #[test]
    fn test_rebuild_through_registry() {
        let original = config();
        let rebuilt = Config::from_document(&original.to_document(), &Registry::with_defaults())
            .unwrap();
        assert_eq!(rebuilt.to_document(), original.to_document());
    }

    #[test]
    fn test_unknown_algorithm_fails_load() {
        let mut document = config().to_document();
        for setup in document.setups.values_mut() {
            setup.signing.algorithm = "rot13".to_string();
        }
        assert!(matches!(
            Config::from_document(&document, &Registry::with_defaults()),
            Err(SealError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_empty_document_fails_load() {
        assert!(matches!(
            Config::from_document(&ConfigDocument::default(), &Registry::with_defaults()),
            Err(SealError::EmptyConfig)
        ));
    }
}
