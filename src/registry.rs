//! Name-to-constructor tables for every algorithm family.
//!
//! A `Registry` is what lets a `Config` round-trip through a configuration
//! document: each algorithm exports `name()` and `config()`, and the factory
//! registered under that name rebuilds an equivalent instance from the map.
//!
//! There is no hidden global table. `Registry::with_defaults()` is the single
//! bootstrap that lists every built-in algorithm; applications add their own
//! on top with the `register_*` methods.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::algorithm::{AlgorithmConfig, Family};
use crate::encoding::{self, Encoding};
use crate::encryption::{self, Encrypter};
use crate::error::{Result, SealError};
use crate::serializing::{self, Serializer};
use crate::signing::{self, Signer};

/// Constructor for an algorithm instance of family `A`.
pub type Factory<A> = Arc<dyn Fn(&AlgorithmConfig) -> Result<Arc<A>> + Send + Sync>;

struct Table<A: ?Sized> {
    family: Family,
    factories: HashMap<String, Factory<A>>,
}

impl<A: ?Sized> Table<A> {
    fn new(family: Family) -> Self {
        Self {
            family,
            factories: HashMap::new(),
        }
    }

    fn register(&mut self, name: String, factory: Factory<A>) {
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(family = %self.family, %name, "algorithm registration replaced");
        }
    }

    fn supported(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    fn build(&self, name: &str, config: &AlgorithmConfig) -> Result<Arc<A>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SealError::UnknownAlgorithm {
                family: self.family,
                name: name.to_string(),
            })?;
        factory(config)
    }
}

impl<A: ?Sized> Clone for Table<A> {
    fn clone(&self) -> Self {
        Self {
            family: self.family,
            factories: self.factories.clone(),
        }
    }
}

/// Per-family algorithm factories.
#[derive(Clone)]
pub struct Registry {
    encodings: Table<dyn Encoding>,
    serializers: Table<dyn Serializer>,
    encrypters: Table<dyn Encrypter>,
    signers: Table<dyn Signer>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            encodings: Table::new(Family::Encoding),
            serializers: Table::new(Family::Serializing),
            encrypters: Table::new(Family::Encryption),
            signers: Table::new(Family::Signing),
        }
    }

    /// A registry holding every built-in algorithm.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_encoding("base64", |_| Ok(Arc::new(encoding::Base64)));
        registry.register_encoding("hex", |_| Ok(Arc::new(encoding::Hex)));
        registry.register_encoding("base32", |_| Ok(Arc::new(encoding::Base32)));
        registry.register_encoding("ascii85", |_| Ok(Arc::new(encoding::Ascii85)));
        registry.register_encoding("pem", |_| Ok(Arc::new(encoding::Pem)));

        registry.register_serializer("json", |_| Ok(Arc::new(serializing::Json)));
        registry.register_serializer("cbor", |_| Ok(Arc::new(serializing::Cbor)));

        registry.register_encrypter("aes256gcm", |c| {
            Ok(Arc::new(encryption::Aes256Gcm::from_config(c)?))
        });
        registry.register_encrypter("chacha20", |c| {
            Ok(Arc::new(encryption::ChaCha20Poly1305::from_config(c)?))
        });
        registry.register_encrypter("xchacha20", |c| {
            Ok(Arc::new(encryption::XChaCha20Poly1305::from_config(c)?))
        });
        registry.register_encrypter("naclbox", |c| {
            Ok(Arc::new(encryption::NaClBox::from_config(c)?))
        });
        registry.register_encrypter("rsa", |c| Ok(Arc::new(encryption::RsaOaep::from_config(c)?)));

        registry.register_signer("ed25519", |c| Ok(Arc::new(signing::Ed25519::from_config(c)?)));
        registry.register_signer("ecdsa", |c| Ok(Arc::new(signing::Ecdsa::from_config(c)?)));
        registry.register_signer("hmacsha256", |c| {
            Ok(Arc::new(signing::HmacSha256::from_config(c)?))
        });

        registry
    }

    /// Register an encoding factory. A later registration under the same
    /// name replaces the earlier one.
    pub fn register_encoding<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AlgorithmConfig) -> Result<Arc<dyn Encoding>> + Send + Sync + 'static,
    {
        self.encodings.register(name.into(), Arc::new(factory));
    }

    /// Register a serializer factory. Last registration wins.
    pub fn register_serializer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AlgorithmConfig) -> Result<Arc<dyn Serializer>> + Send + Sync + 'static,
    {
        self.serializers.register(name.into(), Arc::new(factory));
    }

    /// Register an encrypter factory. Last registration wins.
    pub fn register_encrypter<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AlgorithmConfig) -> Result<Arc<dyn Encrypter>> + Send + Sync + 'static,
    {
        self.encrypters.register(name.into(), Arc::new(factory));
    }

    /// Register a signer factory. Last registration wins.
    pub fn register_signer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&AlgorithmConfig) -> Result<Arc<dyn Signer>> + Send + Sync + 'static,
    {
        self.signers.register(name.into(), Arc::new(factory));
    }

    /// Names registered for a family, sorted.
    pub fn supported(&self, family: Family) -> Vec<String> {
        match family {
            Family::Encoding => self.encodings.supported(),
            Family::Serializing => self.serializers.supported(),
            Family::Encryption => self.encrypters.supported(),
            Family::Signing => self.signers.supported(),
        }
    }

    /// Build an encoding from its name and configuration.
    pub fn encoding(&self, name: &str, config: &AlgorithmConfig) -> Result<Arc<dyn Encoding>> {
        self.encodings.build(name, config)
    }

    /// Build a serializer from its name and configuration.
    pub fn serializer(&self, name: &str, config: &AlgorithmConfig) -> Result<Arc<dyn Serializer>> {
        self.serializers.build(name, config)
    }

    /// Build an encrypter from its name and configuration.
    pub fn encrypter(&self, name: &str, config: &AlgorithmConfig) -> Result<Arc<dyn Encrypter>> {
        self.encrypters.build(name, config)
    }

    /// Build a signer from its name and configuration.
    pub fn signer(&self, name: &str, config: &AlgorithmConfig) -> Result<Arc<dyn Signer>> {
        self.signers.build(name, config)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("encodings", &self.encodings.supported())
            .field("serializers", &self.serializers.supported())
            .field("encrypters", &self.encrypters.supported())
            .field("signers", &self.signers.supported())
            .finish()
    }
}
