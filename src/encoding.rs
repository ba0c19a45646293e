//! Binary-to-text encodings.
//!
//! An encoding turns ciphertext and signature bytes into something that can
//! be embedded safely in the serialized envelope. Encodings are stateless and
//! keyless; their exported configuration is always empty.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use data_encoding::BASE32;
use pem::{EncodeConfig, LineEnding};

use crate::algorithm::Algorithm;
use crate::error::{Result, SealError};

/// Converts raw bytes to a text-safe representation and back.
pub trait Encoding: Algorithm {
    /// Encode raw binary into text bytes.
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decode text bytes back into raw binary. Fails on malformed input.
    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>>;
}

fn malformed(algorithm: &'static str, reason: impl ToString) -> SealError {
    SealError::Encoding {
        algorithm,
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Base64
// ---------------------------------------------------------------------------

/// Standard-alphabet base64 without padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base64;

impl Algorithm for Base64 {
    fn name(&self) -> &'static str {
        "base64"
    }
}

impl Encoding for Base64 {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(STANDARD_NO_PAD.encode(raw).into_bytes())
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        STANDARD_NO_PAD
            .decode(encoded)
            .map_err(|e| malformed(self.name(), e))
    }
}

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

/// Lowercase hexadecimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hex;

impl Algorithm for Hex {
    fn name(&self) -> &'static str {
        "hex"
    }
}

impl Encoding for Hex {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(hex::encode(raw).into_bytes())
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        hex::decode(encoded).map_err(|e| malformed(self.name(), e))
    }
}

// ---------------------------------------------------------------------------
// Base32
// ---------------------------------------------------------------------------

/// RFC 4648 base32 with `=` padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base32;

impl Algorithm for Base32 {
    fn name(&self) -> &'static str {
        "base32"
    }
}

impl Encoding for Base32 {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(BASE32.encode(raw).into_bytes())
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        BASE32.decode(encoded).map_err(|e| malformed(self.name(), e))
    }
}

// ---------------------------------------------------------------------------
// ASCII85
// ---------------------------------------------------------------------------

/// btoa-style ASCII85: `z` abbreviates an all-zero group, no `<~ ~>` framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ascii85;

impl Algorithm for Ascii85 {
    fn name(&self) -> &'static str {
        "ascii85"
    }
}

impl Encoding for Ascii85 {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(raw.len().div_ceil(4) * 5);

        for chunk in raw.chunks(4) {
            if chunk == [0, 0, 0, 0] {
                out.push(b'z');
                continue;
            }

            let mut block = [0u8; 4];
            block[..chunk.len()].copy_from_slice(chunk);
            let mut value = u32::from_be_bytes(block);

            let mut digits = [0u8; 5];
            for digit in digits.iter_mut().rev() {
                *digit = (value % 85) as u8 + b'!';
                value /= 85;
            }
            out.extend_from_slice(&digits[..chunk.len() + 1]);
        }

        Ok(out)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(encoded.len() / 5 * 4 + 4);
        let mut group = [0u8; 5];
        let mut filled = 0;

        for &c in encoded.iter().filter(|c| !c.is_ascii_whitespace()) {
            match c {
                b'z' if filled == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
                b'!'..=b'u' => {
                    group[filled] = c - b'!';
                    filled += 1;
                    if filled == 5 {
                        out.extend_from_slice(&Self::decode_group(&group)?);
                        filled = 0;
                    }
                }
                _ => return Err(malformed(self.name(), format!("invalid symbol {c:#04x}"))),
            }
        }

        match filled {
            0 => {}
            1 => return Err(malformed(self.name(), "truncated final group")),
            n => {
                for digit in group.iter_mut().skip(n) {
                    *digit = 84;
                }
                out.extend_from_slice(&Self::decode_group(&group)?[..n - 1]);
            }
        }

        Ok(out)
    }
}

impl Ascii85 {
    fn decode_group(group: &[u8; 5]) -> Result<[u8; 4]> {
        let value = group
            .iter()
            .fold(0u64, |acc, digit| acc * 85 + *digit as u64);
        let value = u32::try_from(value).map_err(|_| malformed("ascii85", "group overflow"))?;
        Ok(value.to_be_bytes())
    }
}

// ---------------------------------------------------------------------------
// PEM
// ---------------------------------------------------------------------------

const PEM_LABEL: &str = "SEALFIELD VALUE";
const PEM_LINE_LEN: usize = 64;

/// A single PEM block labelled `SEALFIELD VALUE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pem;

impl Algorithm for Pem {
    fn name(&self) -> &'static str {
        "pem"
    }
}

impl Encoding for Pem {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let block = pem::Pem::new(PEM_LABEL, raw);
        let config = EncodeConfig::new()
            .set_line_ending(LineEnding::LF)
            .set_line_wrap(PEM_LINE_LEN);
        Ok(pem::encode_config(&block, config).into_bytes())
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let block = pem::parse(encoded).map_err(|e| malformed(self.name(), e))?;
        if block.tag() != PEM_LABEL {
            return Err(malformed(
                self.name(),
                format!("unexpected label {:?}", block.tag()),
            ));
        }
        Ok(block.into_contents())
    }
}
