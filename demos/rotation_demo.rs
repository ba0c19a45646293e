//! Minimal example: rotating keys and algorithms without re-encrypting data.
//!
//! Run with: `cargo run --example rotation_demo`
//!
//! - A record is written under the original setup.
//! - A new setup (new key, new serializer) is activated.
//! - The old record still reads back; new records use the new setup.
//! - The configuration is exported as a document and reloaded.
//! - A tampered signed value is detected.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sealfield::encoding::{Base64, Pem};
use sealfield::encryption::{Aes256Gcm, XChaCha20Poly1305};
use sealfield::serializing::{self, Cbor, Json};
use sealfield::signing::{Ecdsa, Ed25519};
use sealfield::{
    Config, ConfigDocument, Envelope, NullSignedEncrypted, Registry, Setup, Signed,
    SignedEncrypted,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Original setup, active since yesterday.
    let config = Config::builder()
        .setup(
            Utc::now() - Duration::days(1),
            Setup::new(
                Arc::new(Base64),
                Arc::new(Json),
                Arc::new(Aes256Gcm::generate()?),
                Arc::new(Ed25519::generate()?),
            ),
        )
        .build()?;

    let ssn = SignedEncrypted::new("078-05-1120".to_string());
    let stored_before = ssn.to_storage_value(&config)?;
    println!("Stored under {}", config.current_setup());

    // 2. Rotate: a new setup takes over from now on.
    let config = config.with_setup(
        Utc::now(),
        Setup::new(
            Arc::new(Pem),
            Arc::new(Cbor),
            Arc::new(XChaCha20Poly1305::generate()?),
            Arc::new(Ecdsa::generate()?),
        ),
    );
    println!("Rotated to {}", config.current_setup());

    // 3. The old record still reads back.
    let mut read = SignedEncrypted::<String>::default();
    read.from_storage_value(&config, stored_before.as_deref())?;
    assert!(read.valid);
    println!("Old record: {} (valid: {})", read.raw, read.valid);

    // 4. Nullable columns store nothing for absent values.
    let phone = NullSignedEncrypted::<String>::from(None);
    assert_eq!(phone.to_storage_value(&config)?, None);

    // 5. Persist and reload the configuration.
    let document = config.to_document().to_json()?;
    let reloaded =
        Config::from_document(&ConfigDocument::from_json(&document)?, &Registry::with_defaults())?;
    let mut again = SignedEncrypted::<String>::default();
    again.from_storage_value(&reloaded, stored_before.as_deref())?;
    println!("Reloaded config has {} setups", reloaded.len());

    // 6. Tampering with a signed value is reported, not hidden.
    let stored = Signed::new("role=user".to_string())
        .to_storage_value(&config)?
        .ok_or("signed value stored as null")?;
    let (mut envelope, setup) = Envelope::parse(&config, &stored)?;
    envelope.raw = serializing::serialize(setup.serializer.as_ref(), "role=admin")?;
    let forged = envelope.to_bytes(setup)?;

    let mut role = Signed::<String>::default();
    role.from_storage_value(&config, Some(&forged))?;
    println!("Forged role: {} (valid: {})", role.raw, role.valid);
    assert!(!role.valid);

    Ok(())
}
