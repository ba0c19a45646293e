use std::sync::Arc;

use chrono::{Duration, Utc};
use sealfield::encoding::{Base64, Encoding, Hex};
use sealfield::encryption::{Aes256Gcm, ChaCha20Poly1305};
use sealfield::serializing::Json;
use sealfield::signing::{Ed25519, HmacSha256};
use sealfield::{
    decrypt, decrypt_verify, encrypt_at, encrypt_sign_at, sign, verify, Config, Envelope,
    SealError, Setup,
};

fn config() -> Config {
    let now = Utc::now();
    Config::builder()
        .setup(
            now - Duration::hours(2),
            Setup::new(
                Arc::new(Base64),
                Arc::new(Json),
                Arc::new(Aes256Gcm::generate().unwrap()),
                Arc::new(Ed25519::generate().unwrap()),
            ),
        )
        .setup(
            now - Duration::hours(1),
            Setup::new(
                Arc::new(Base64),
                Arc::new(Json),
                Arc::new(ChaCha20Poly1305::generate().unwrap()),
                Arc::new(HmacSha256::generate().unwrap()),
            ),
        )
        .build()
        .unwrap()
}

/// Parse, modify, and re-serialize an envelope the way an attacker with
/// write access to the column could.
fn rewrite(config: &Config, stored: &[u8], edit: impl FnOnce(&mut Envelope)) -> Vec<u8> {
    let (mut envelope, setup) = Envelope::parse(config, stored).unwrap();
    edit(&mut envelope);
    envelope.to_bytes(setup).unwrap()
}

#[test]
fn test_replaced_raw_fails_verification_but_returns_value() {
    let config = config();
    let stored = sign(&config, "alice").unwrap();
    let forged = rewrite(&config, &stored, |envelope| {
        envelope.raw = b"\"mallory\"".to_vec();
    });

    let read = verify::<String>(&config, &forged).unwrap();
    assert!(!read.valid);
    assert_eq!(read.value, "mallory");
    assert_eq!(read.into_trusted(), None);
}

#[test]
fn test_signature_from_other_value_is_invalid() {
    let config = config();
    let alice = sign(&config, "alice").unwrap();
    let bob = sign(&config, "bob").unwrap();
    let (bob_envelope, _) = Envelope::parse(&config, &bob).unwrap();

    let forged = rewrite(&config, &alice, |envelope| {
        envelope.signature = bob_envelope.signature.clone();
    });
    assert!(!verify::<String>(&config, &forged).unwrap().valid);
}

#[test]
fn test_stripped_signature_is_error() {
    let config = config();
    let stored = sign(&config, "alice").unwrap();
    let stripped = rewrite(&config, &stored, |envelope| envelope.signature = None);

    assert!(matches!(
        verify::<String>(&config, &stripped),
        Err(SealError::MissingSignature)
    ));
}

#[test]
fn test_flipped_ciphertext_byte_fails_decryption() {
    let config = config();
    let stored = encrypt_at(&config, "secret", Utc::now()).unwrap();
    let forged = rewrite(&config, &stored, |envelope| {
        let mut binary = Base64.decode(&envelope.raw).unwrap();
        let last = binary.len() - 1;
        binary[last] ^= 0x01;
        envelope.raw = Base64.encode(&binary).unwrap();
    });

    assert!(matches!(
        decrypt::<String>(&config, &forged),
        Err(SealError::DecryptionFailure)
    ));
}

#[test]
fn test_cross_setup_substitution_fails() {
    let config = config();
    let now = Utc::now();

    // A is written under the older setup, B under the newer one.
    let a = encrypt_sign_at(&config, "transfer 10", now - Duration::minutes(90)).unwrap();
    let b = encrypt_sign_at(&config, "transfer 10000", now).unwrap();
    let (b_envelope, _) = Envelope::parse(&config, &b).unwrap();

    let forged = rewrite(&config, &a, |envelope| envelope.raw = b_envelope.raw.clone());

    assert!(decrypt::<String>(&config, &forged).is_err());
    assert!(decrypt_verify::<String>(&config, &forged).is_err());
}

#[test]
fn test_moved_timestamp_fails_decryption() {
    let config = config();
    let now = Utc::now();
    let stored = encrypt_at(&config, "secret", now).unwrap();

    // Point the envelope at the older setup's window.
    let forged = rewrite(&config, &stored, |envelope| {
        envelope.at = Some(now - Duration::minutes(90));
    });
    assert!(decrypt::<String>(&config, &forged).is_err());
}

#[test]
fn test_foreign_encoding_in_raw_is_error() {
    let config = config();
    let stored = encrypt_at(&config, "secret", Utc::now()).unwrap();
    let forged = rewrite(&config, &stored, |envelope| {
        envelope.raw = Hex.encode(b"not base64 ciphertext!").unwrap();
    });
    assert!(decrypt::<String>(&config, &forged).is_err());
}
