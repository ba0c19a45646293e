//! Setups and time-based setup resolution.
//!
//! A `Setup` is one choice of encoding, serializer, encrypter and signer. A
//! `Config` holds several setups keyed by the moment each became active, so
//! data written under an older key or algorithm stays readable after
//! rotation: every envelope records when it was written, and the read path
//! resolves the setup that was active at that moment.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::encoding::Encoding;
use crate::encryption::Encrypter;
use crate::error::{Result, SealError};
use crate::serializing::Serializer;
use crate::signing::Signer;

/// One bundle of algorithms describing how a value is protected.
///
/// Algorithm instances are shared (`Arc`) so several setups may reuse the
/// same key, e.g. when only the encoding changes between two setups.
#[derive(Clone)]
pub struct Setup {
    pub encoder: Arc<dyn Encoding>,
    pub serializer: Arc<dyn Serializer>,
    pub encrypter: Arc<dyn Encrypter>,
    pub signer: Arc<dyn Signer>,
}

impl Setup {
    pub fn new(
        encoder: Arc<dyn Encoding>,
        serializer: Arc<dyn Serializer>,
        encrypter: Arc<dyn Encrypter>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            encoder,
            serializer,
            encrypter,
            signer,
        }
    }
}

impl fmt::Display for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{} {} {} {}}}",
            self.encoder.name(),
            self.serializer.name(),
            self.encrypter.name(),
            self.signer.name()
        )
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setup{self}")
    }
}

/// The time-indexed collection of setups an application supports.
///
/// Never empty. Immutable once built; rotation produces a new `Config`
/// through `with_setup`.
#[derive(Clone, Debug)]
pub struct Config {
    setups: BTreeMap<DateTime<Utc>, Setup>,
}

impl Config {
    /// Build a configuration. Fails with `EmptyConfig` when `setups` is empty.
    pub fn new(setups: BTreeMap<DateTime<Utc>, Setup>) -> Result<Self> {
        if setups.is_empty() {
            return Err(SealError::EmptyConfig);
        }
        Ok(Self { setups })
    }

    /// Start building a configuration one setup at a time.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// A copy of this configuration with one more setup, replacing any
    /// setup already active at exactly `at`.
    pub fn with_setup(&self, at: DateTime<Utc>, setup: Setup) -> Self {
        let mut setups = self.setups.clone();
        setups.insert(at, setup);
        Self { setups }
    }

    /// Activation time of the setup that applies at `at`.
    ///
    /// That is the latest activation time not after `at`. When `at` precedes
    /// every activation time, the latest activation time overall is used.
    pub fn activation_for(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let chosen = self
            .setups
            .range(..=at)
            .next_back()
            .or_else(|| self.setups.iter().next_back())
            .map(|(activated, _)| *activated);

        match chosen {
            Some(activated) => activated,
            // `new` guarantees at least one setup.
            None => unreachable!("Config is never empty"),
        }
    }

    /// The setup that applies to data written at `at`.
    pub fn resolve(&self, at: DateTime<Utc>) -> &Setup {
        let activated = self.activation_for(at);
        debug!(%at, %activated, "resolved setup");
        &self.setups[&activated]
    }

    /// The setup that applies right now.
    pub fn current_setup(&self) -> &Setup {
        self.resolve(Utc::now())
    }

    /// All setups with their activation times, newest first.
    pub fn setups(&self) -> impl Iterator<Item = (&DateTime<Utc>, &Setup)> {
        self.setups.iter().rev()
    }

    /// Number of configured setups.
    pub fn len(&self) -> usize {
        self.setups.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.setups.is_empty()
    }
}

/// Incremental construction of a `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    setups: BTreeMap<DateTime<Utc>, Setup>,
}

impl ConfigBuilder {
    /// Add a setup active from `at`.
    pub fn setup(mut self, at: DateTime<Utc>, setup: Setup) -> Self {
        self.setups.insert(at, setup);
        self
    }

    /// Finish. Fails with `EmptyConfig` when no setup was added.
    pub fn build(self) -> Result<Config> {
        Config::new(self.setups)
    }
}

// ---------------------------------------------------------------------------
// Process-wide configuration
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// Install the process-wide configuration.
///
/// May be called once. Later calls fail with `AlreadyInitialized` and leave
/// the installed configuration untouched, so concurrent readers never
/// observe a change.
pub fn init(config: Config) -> Result<()> {
    GLOBAL
        .set(config)
        .map_err(|_| SealError::AlreadyInitialized)
}

/// The process-wide configuration installed by `init`.
pub fn global() -> Result<&'static Config> {
    GLOBAL.get().ok_or(SealError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::encoding::{Base64, Hex};
    use crate::encryption::Aes256Gcm;
    use crate::serializing::Json;
    use crate::signing::Ed25519;

    fn setup_with(encoder: Arc<dyn Encoding>) -> Setup {
        Setup::new(
            encoder,
            Arc::new(Json),
            Arc::new(Aes256Gcm::generate().unwrap()),
            Arc::new(Ed25519::generate().unwrap()),
        )
    }

    #[test]
    fn test_empty_config_rejected() {
        assert!(matches!(Config::new(BTreeMap::new()), Err(SealError::EmptyConfig)));
        assert!(matches!(Config::builder().build(), Err(SealError::EmptyConfig)));
    }

    #[test]
    fn test_exact_activation_time_selects_that_setup() {
        let t = Utc::now();
        let config = Config::builder()
            .setup(t - Duration::hours(1), setup_with(Arc::new(Hex)))
            .setup(t, setup_with(Arc::new(Base64)))
            .build()
            .unwrap();

        assert_eq!(config.activation_for(t), t);
        assert_eq!(config.resolve(t).encoder.name(), "base64");
        assert_eq!(
            config.resolve(t - Duration::nanoseconds(1)).encoder.name(),
            "hex"
        );
    }

    #[test]
    fn test_display() {
        let setup = setup_with(Arc::new(Base64));
        assert_eq!(setup.to_string(), "{base64 json aes256gcm ed25519}");
    }

    #[test]
    fn test_with_setup_leaves_original_untouched() {
        let t = Utc::now();
        let config = Config::builder()
            .setup(t - Duration::hours(2), setup_with(Arc::new(Hex)))
            .build()
            .unwrap();
        let rotated = config.with_setup(t - Duration::hours(1), setup_with(Arc::new(Base64)));

        assert_eq!(config.len(), 1);
        assert_eq!(rotated.len(), 2);
        assert_eq!(rotated.current_setup().encoder.name(), "base64");
        assert_eq!(config.current_setup().encoder.name(), "hex");
    }

    #[test]
    fn test_setups_iterate_newest_first() {
        let t = Utc::now();
        let config = Config::builder()
            .setup(t - Duration::hours(2), setup_with(Arc::new(Hex)))
            .setup(t, setup_with(Arc::new(Base64)))
            .build()
            .unwrap();
        let order: Vec<_> = config.setups().map(|(at, _)| *at).collect();
        assert_eq!(order, vec![t, t - Duration::hours(2)]);
    }
}
