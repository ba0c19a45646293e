//! Confidentiality algorithms.
//!
//! Every encrypter produces self-contained output: a fresh random nonce is
//! generated for each call and prepended to the ciphertext, so identical
//! plaintexts never encrypt to identical bytes.
//!
//! # Layout of encrypted bytes
//! ```text
//! [ nonce ][ ciphertext + authentication tag ]
//! ```
//!
//! Primitive choices:
//! - **AES-256-GCM** and **ChaCha20-Poly1305** (`ring`): 96-bit nonce
//! - **XChaCha20-Poly1305** (`chacha20poly1305`): 192-bit nonce
//! - **NaCl box** (`crypto_box`): X25519 + XSalsa20-Poly1305, 192-bit nonce
//!
//! **RSA-OAEP** (`rsa`) is the exception to the layout above. OAEP padding is
//! randomized on its own, so the output is the bare RSA ciphertext, one
//! modulus long. Plaintext is capped by the key size: 126 bytes for a
//! 2048-bit key with SHA-512.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305 as XChaChaCipher, XNonce};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand_core::OsRng;
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::algorithm::{self, Algorithm, AlgorithmConfig};
use crate::error::{Result, SealError};
use crate::keys::{random_bytes, SymmetricKey, KEY_LEN};

/// Converts plaintext to authenticated ciphertext and back.
pub trait Encrypter: Algorithm {
    /// Encrypt a plaintext payload. Output includes its own nonce.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a payload produced by `encrypt`.
    ///
    /// Wrong key, tampering and truncation all fail the authentication check
    /// and return `DecryptionFailure`. No partial plaintext is returned.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// ring AEADs
// ---------------------------------------------------------------------------

/// Size of the nonce used by the `ring` AEADs (96 bits).
pub const NONCE_LEN: usize = aead::NONCE_LEN;

fn ring_key(algorithm: &'static aead::Algorithm, key: &SymmetricKey) -> Result<LessSafeKey> {
    let unbound = UnboundKey::new(algorithm, key.as_bytes()).map_err(|_| SealError::InvalidKey)?;
    Ok(LessSafeKey::new(unbound))
}

fn ring_seal(key: &LessSafeKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce_bytes = random_bytes::<NONCE_LEN>()?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut output =
        Vec::with_capacity(NONCE_LEN + plaintext.len() + key.algorithm().tag_len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(plaintext);

    // Encrypts `output[NONCE_LEN..]` in place; the tag is appended after.
    let tag = key
        .seal_in_place_separate_tag(nonce, Aad::empty(), &mut output[NONCE_LEN..])
        .map_err(|_| SealError::EncryptionFailure)?;
    output.extend_from_slice(tag.as_ref());

    Ok(output)
}

fn ring_open(key: &LessSafeKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < NONCE_LEN + key.algorithm().tag_len() {
        return Err(SealError::DecryptionFailure);
    }

    let nonce = Nonce::try_assume_unique_for_key(&ciphertext[..NONCE_LEN])
        .map_err(|_| SealError::DecryptionFailure)?;
    let mut payload = ciphertext[NONCE_LEN..].to_vec();

    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut payload)
        .map_err(|_| SealError::DecryptionFailure)?;

    Ok(plaintext.to_vec())
}

/// AES-256-GCM.
pub struct Aes256Gcm {
    secret: SymmetricKey,
    key: LessSafeKey,
}

impl Aes256Gcm {
    /// Construct from a 256-bit key.
    pub fn new(secret: SymmetricKey) -> Result<Self> {
        let key = ring_key(&aead::AES_256_GCM, &secret)?;
        Ok(Self { secret, key })
    }

    /// Construct with a freshly generated key.
    pub fn generate() -> Result<Self> {
        Self::new(SymmetricKey::generate()?)
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        let bytes = algorithm::hex_array::<KEY_LEN>(config, "aes256gcm", "key")?;
        Self::new(SymmetricKey::from_bytes(bytes))
    }
}

impl Algorithm for Aes256Gcm {
    fn name(&self) -> &'static str {
        "aes256gcm"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.secret.as_bytes()))
    }
}

impl Encrypter for Aes256Gcm {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        ring_seal(&self.key, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        ring_open(&self.key, ciphertext)
    }
}

/// ChaCha20-Poly1305 (RFC 8439).
pub struct ChaCha20Poly1305 {
    secret: SymmetricKey,
    key: LessSafeKey,
}

impl ChaCha20Poly1305 {
    /// Construct from a 256-bit key.
    pub fn new(secret: SymmetricKey) -> Result<Self> {
        let key = ring_key(&aead::CHACHA20_POLY1305, &secret)?;
        Ok(Self { secret, key })
    }

    /// Construct with a freshly generated key.
    pub fn generate() -> Result<Self> {
        Self::new(SymmetricKey::generate()?)
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        let bytes = algorithm::hex_array::<KEY_LEN>(config, "chacha20", "key")?;
        Self::new(SymmetricKey::from_bytes(bytes))
    }
}

impl Algorithm for ChaCha20Poly1305 {
    fn name(&self) -> &'static str {
        "chacha20"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.secret.as_bytes()))
    }
}

impl Encrypter for ChaCha20Poly1305 {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        ring_seal(&self.key, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        ring_open(&self.key, ciphertext)
    }
}

// ---------------------------------------------------------------------------
// XChaCha20-Poly1305
// ---------------------------------------------------------------------------

/// Size of the extended nonce used by XChaCha20-Poly1305 and NaCl box.
pub const XNONCE_LEN: usize = 24;

/// XChaCha20-Poly1305 with a 192-bit random nonce.
pub struct XChaCha20Poly1305 {
    secret: SymmetricKey,
    cipher: XChaChaCipher,
}

impl XChaCha20Poly1305 {
    /// Construct from a 256-bit key.
    pub fn new(secret: SymmetricKey) -> Result<Self> {
        let cipher =
            XChaChaCipher::new_from_slice(secret.as_bytes()).map_err(|_| SealError::InvalidKey)?;
        Ok(Self { secret, cipher })
    }

    /// Construct with a freshly generated key.
    pub fn generate() -> Result<Self> {
        Self::new(SymmetricKey::generate()?)
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        let bytes = algorithm::hex_array::<KEY_LEN>(config, "xchacha20", "key")?;
        Self::new(SymmetricKey::from_bytes(bytes))
    }
}

impl Algorithm for XChaCha20Poly1305 {
    fn name(&self) -> &'static str {
        "xchacha20"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.secret.as_bytes()))
    }
}

impl Encrypter for XChaCha20Poly1305 {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_bytes::<XNONCE_LEN>()?;
        let sealed = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| SealError::EncryptionFailure)?;

        let mut output = Vec::with_capacity(XNONCE_LEN + sealed.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < XNONCE_LEN {
            return Err(SealError::DecryptionFailure);
        }
        let (nonce, sealed) = ciphertext.split_at(XNONCE_LEN);
        self.cipher
            .decrypt(XNonce::from_slice(nonce), sealed)
            .map_err(|_| SealError::DecryptionFailure)
    }
}

// ---------------------------------------------------------------------------
// NaCl box
// ---------------------------------------------------------------------------

/// NaCl `crypto_box` between our X25519 secret key and a peer public key.
///
/// The shared key is precomputed at construction. Anything sealed with
/// `(our secret, peer public)` opens with `(peer secret, our public)` and
/// vice versa.
pub struct NaClBox {
    secret: SecretKey,
    peer: PublicKey,
    shared: SalsaBox,
}

impl NaClBox {
    /// Construct from our secret key and the peer's public key.
    pub fn new(secret: [u8; KEY_LEN], peer_public: [u8; KEY_LEN]) -> Self {
        let secret = SecretKey::from(secret);
        let peer = PublicKey::from(peer_public);
        let shared = SalsaBox::new(&peer, &secret);
        Self {
            secret,
            peer,
            shared,
        }
    }

    /// Construct with a fresh secret key, boxed to a fresh peer key pair
    /// whose secret half is discarded.
    pub fn generate() -> Result<Self> {
        let secret = random_bytes::<KEY_LEN>()?;
        let peer = SecretKey::from(random_bytes::<KEY_LEN>()?).public_key();
        Ok(Self::new(secret, *peer.as_bytes()))
    }

    /// Our X25519 public key.
    pub fn public_key(&self) -> [u8; KEY_LEN] {
        *self.secret.public_key().as_bytes()
    }

    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        let secret = algorithm::hex_array::<KEY_LEN>(config, "naclbox", "private_key")?;
        let peer = algorithm::hex_array::<KEY_LEN>(config, "naclbox", "public_key")?;
        Ok(Self::new(secret, peer))
    }
}

impl Algorithm for NaClBox {
    fn name(&self) -> &'static str {
        "naclbox"
    }

    fn config(&self) -> AlgorithmConfig {
        let mut config = AlgorithmConfig::new();
        config.insert("private_key".to_string(), hex::encode(self.secret.to_bytes()));
        config.insert("public_key".to_string(), hex::encode(self.peer.as_bytes()));
        config
    }
}

impl Encrypter for NaClBox {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_bytes::<XNONCE_LEN>()?;
        let sealed = self
            .shared
            .encrypt(crypto_box::Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| SealError::EncryptionFailure)?;

        let mut output = Vec::with_capacity(XNONCE_LEN + sealed.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&sealed);
        Ok(output)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < XNONCE_LEN {
            return Err(SealError::DecryptionFailure);
        }
        let (nonce, sealed) = ciphertext.split_at(XNONCE_LEN);
        self.shared
            .decrypt(crypto_box::Nonce::from_slice(nonce), sealed)
            .map_err(|_| SealError::DecryptionFailure)
    }
}

// ---------------------------------------------------------------------------
// RSA-OAEP
// ---------------------------------------------------------------------------

/// Modulus size used by `RsaOaep::generate`.
pub const RSA_KEY_BITS: usize = 2048;

/// RSA-OAEP with SHA-512, encrypting to the public half of its own key.
pub struct RsaOaep {
    key: RsaPrivateKey,
    der: Zeroizing<Vec<u8>>,
}

impl RsaOaep {
    /// Wrap an existing private key.
    pub fn new(key: RsaPrivateKey) -> Result<Self> {
        let der = key.to_pkcs8_der().map_err(|_| SealError::InvalidKey)?;
        Ok(Self {
            der: Zeroizing::new(der.as_bytes().to_vec()),
            key,
        })
    }

    /// Construct with a fresh `RSA_KEY_BITS` key.
    pub fn generate() -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|_| SealError::RandomnessFailure)?;
        Self::new(key)
    }

    /// Largest plaintext one call can encrypt.
    pub fn max_plaintext_len(&self) -> usize {
        // OAEP spends two digests and two bytes of the modulus.
        self.key.size().saturating_sub(2 * 64 + 2)
    }

    /// Parse a hex DER private key. PKCS#8 is written, PKCS#1 is also read.
    pub(crate) fn from_config(config: &AlgorithmConfig) -> Result<Self> {
        let der = Zeroizing::new(algorithm::hex_bytes(config, "rsa", "key")?);
        let key = RsaPrivateKey::from_pkcs8_der(&der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(&der))
            .map_err(|e| SealError::InvalidAlgorithmConfig {
                algorithm: "rsa".to_string(),
                reason: format!("`key` is not an RSA private key: {e}"),
            })?;
        Self::new(key)
    }
}

impl Algorithm for RsaOaep {
    fn name(&self) -> &'static str {
        "rsa"
    }

    fn config(&self) -> AlgorithmConfig {
        algorithm::single("key", hex::encode(self.der.as_slice()))
    }
}

impl Encrypter for RsaOaep {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.key
            .to_public_key()
            .encrypt(&mut OsRng, Oaep::new::<Sha512>(), plaintext)
            .map_err(|_| SealError::EncryptionFailure)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() != self.key.size() {
            return Err(SealError::DecryptionFailure);
        }
        self.key
            .decrypt(Oaep::new::<Sha512>(), ciphertext)
            .map_err(|_| SealError::DecryptionFailure)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use ::rsa::pkcs1::EncodeRsaPrivateKey;

    use super::*;

    fn all() -> Vec<Box<dyn Encrypter>> {
        vec![
            Box::new(Aes256Gcm::generate().unwrap()),
            Box::new(ChaCha20Poly1305::generate().unwrap()),
            Box::new(XChaCha20Poly1305::generate().unwrap()),
            Box::new(NaClBox::generate().unwrap()),
        ]
    }

    #[test]
    fn test_roundtrip() {
        for encrypter in all() {
            for plaintext in [&b""[..], &b"secret message"[..], &[0xa5u8; 4096][..]] {
                let sealed = encrypter.encrypt(plaintext).unwrap();
                assert_eq!(encrypter.decrypt(&sealed).unwrap(), plaintext, "{}", encrypter.name());
            }
        }
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        for encrypter in all() {
            let a = encrypter.encrypt(b"same input").unwrap();
            let b = encrypter.encrypt(b"same input").unwrap();
            assert_ne!(a, b, "{} reused a nonce", encrypter.name());
        }
    }

    #[test]
    fn test_tamper_detected() {
        for encrypter in all() {
            let mut sealed = encrypter.encrypt(b"integrity matters").unwrap();
            let last = sealed.len() - 1;
            sealed[last] ^= 0x01;
            assert!(matches!(
                encrypter.decrypt(&sealed),
                Err(SealError::DecryptionFailure)
            ));
        }
    }

    #[test]
    fn test_truncated_input_rejected() {
        for encrypter in all() {
            assert!(encrypter.decrypt(&[]).is_err());
            assert!(encrypter.decrypt(&[0u8; 5]).is_err());
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let a = Aes256Gcm::generate().unwrap();
        let b = Aes256Gcm::generate().unwrap();
        let sealed = a.encrypt(b"for a only").unwrap();
        assert!(b.decrypt(&sealed).is_err());
    }

    #[test]
    fn test_naclbox_opens_from_peer_side() {
        let ours = random_bytes::<KEY_LEN>().unwrap();
        let theirs = random_bytes::<KEY_LEN>().unwrap();
        let our_public = *SecretKey::from(ours).public_key().as_bytes();
        let their_public = *SecretKey::from(theirs).public_key().as_bytes();

        let sender = NaClBox::new(ours, their_public);
        let recipient = NaClBox::new(theirs, our_public);

        let sealed = sender.encrypt(b"hello peer").unwrap();
        assert_eq!(recipient.decrypt(&sealed).unwrap(), b"hello peer");
    }

    fn rsa() -> &'static RsaOaep {
        static KEY: OnceLock<RsaOaep> = OnceLock::new();
        KEY.get_or_init(|| RsaOaep::generate().unwrap())
    }

    #[test]
    fn test_rsa_roundtrip_and_randomized() {
        let rsa = rsa();
        for plaintext in [&b""[..], &b"secret message"[..], &[0x5au8; 126][..]] {
            let sealed = rsa.encrypt(plaintext).unwrap();
            assert_eq!(sealed.len(), 256);
            assert_eq!(rsa.decrypt(&sealed).unwrap(), plaintext);
        }
        assert_ne!(rsa.encrypt(b"same input").unwrap(), rsa.encrypt(b"same input").unwrap());
    }

    #[test]
    fn test_rsa_rejects_oversized_plaintext() {
        let rsa = rsa();
        assert_eq!(rsa.max_plaintext_len(), 126);
        assert!(matches!(
            rsa.encrypt(&[0u8; 127]),
            Err(SealError::EncryptionFailure)
        ));
    }

    #[test]
    fn test_rsa_tamper_and_truncation_rejected() {
        let rsa = rsa();
        let mut sealed = rsa.encrypt(b"integrity matters").unwrap();
        sealed[100] ^= 0x01;
        assert!(matches!(rsa.decrypt(&sealed), Err(SealError::DecryptionFailure)));
        assert!(rsa.decrypt(&[]).is_err());
        assert!(rsa.decrypt(&sealed[..255]).is_err());
    }

    #[test]
    fn test_rsa_config_restores_key() {
        let rsa = rsa();
        let sealed = rsa.encrypt(b"persisted").unwrap();

        let restored = RsaOaep::from_config(&rsa.config()).unwrap();
        assert_eq!(restored.decrypt(&sealed).unwrap(), b"persisted");

        let pkcs1 = rsa.key.to_pkcs1_der().unwrap();
        let legacy = algorithm::single("key", hex::encode(pkcs1.as_bytes()));
        assert_eq!(RsaOaep::from_config(&legacy).unwrap().decrypt(&sealed).unwrap(), b"persisted");

        let garbage = algorithm::single("key", "deadbeef".to_string());
        assert!(matches!(
            RsaOaep::from_config(&garbage),
            Err(SealError::InvalidAlgorithmConfig { .. })
        ));
    }

    #[test]
    fn test_config_rejects_short_key() {
        let config = algorithm::single("key", "abcd".to_string());
        assert!(Aes256Gcm::from_config(&config).is_err());
        assert!(XChaCha20Poly1305::from_config(&config).is_err());
    }
}
