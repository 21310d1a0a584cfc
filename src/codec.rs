//! Opaque token and short-code generation.
//!
//! Everything here is pure and store-free. Output is restricted to characters
//! that survive unescaped in a URL path segment and in a cookie value.

use base64::Engine;
use rand::{RngCore, rngs::OsRng};

use crate::error::PassError;

pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Session tokens carry 256 bits of entropy.
pub const SESSION_TOKEN_BYTES: usize = 32;

const MIN_TOKEN_BYTES: usize = 16;

/// A validated set of characters to draw short codes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet(Vec<u8>);

impl Alphabet {
    pub fn new(chars: &str) -> Result<Self, PassError> {
        let bytes = chars.as_bytes().to_vec();
        if bytes.len() < 2 {
            return Err(PassError::InvalidAlphabet(
                "needs at least two characters".into(),
            ));
        }
        if bytes.len() > 256 {
            return Err(PassError::InvalidAlphabet("too many characters".into()));
        }
        if let Some(bad) = bytes.iter().find(|b| !is_safe_byte(**b)) {
            return Err(PassError::InvalidAlphabet(format!(
                "character {:?} is not URL/cookie safe",
                *bad as char
            )));
        }
        let mut seen = [false; 256];
        for b in &bytes {
            if std::mem::replace(&mut seen[*b as usize], true) {
                return Err(PassError::InvalidAlphabet(format!(
                    "duplicate character {:?}",
                    *b as char
                )));
            }
        }
        Ok(Self(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        c.is_ascii() && self.0.contains(&(c as u8))
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self(DEFAULT_ALPHABET.as_bytes().to_vec())
    }
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Create a new opaque token from `byte_len` OS-random bytes.
///
/// Encoded as URL-safe base64 without padding, so the result only contains
/// `[A-Za-z0-9_-]`.
pub fn generate_token(byte_len: usize) -> Result<String, PassError> {
    if byte_len < MIN_TOKEN_BYTES {
        return Err(PassError::InvalidTokenLength(byte_len));
    }
    let mut bytes = vec![0u8; byte_len];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Draw `length` characters uniformly from `alphabet`.
pub fn generate_short_code(length: usize, alphabet: &Alphabet) -> Result<String, PassError> {
    let n = alphabet.len();
    // Largest multiple of n that fits in a byte; bytes at or above it are
    // rejected so every character is equally likely.
    let zone = 256 - (256 % n);
    let mut code = String::with_capacity(length);
    let mut buf = [0u8; 64];
    while code.len() < length {
        OsRng.try_fill_bytes(&mut buf)?;
        for b in buf.iter().map(|b| *b as usize).filter(|b| *b < zone) {
            code.push(alphabet.0[b % n] as char);
            if code.len() == length {
                break;
            }
        }
    }
    Ok(code)
}
