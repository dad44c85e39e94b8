use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// Content digest of raw wasm bytecode, used as the artifact cache key.
///
/// A SHA-256 over the bytes: identical bytecode always produces the same
/// fingerprint, and distinct bytecode collides only with cryptographically
/// negligible probability.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
  /// Compute the fingerprint of the given bytecode.
  pub fn of(bytecode: &[u8]) -> Self {
    Self(Sha256::digest(bytecode).into())
  }

  /// Wrap a precomputed digest.
  pub fn from_bytes(bytes: [u8; 32]) -> Self {
    Self(bytes)
  }

  /// The raw digest bytes.
  pub fn as_bytes(&self) -> &[u8; 32] {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for byte in &self.0 {
      write!(f, "{:02x}", byte)?;
    }
    Ok(())
  }
}

impl fmt::Debug for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Fingerprint({})", self)
  }
}

/// Error parsing a fingerprint from its hex form.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseFingerprintError {
  /// The string is not 64 hex characters.
  #[error("expected 64 hex characters, got {len}")]
  InvalidLength { len: usize },

  /// The string contains a non-hex character.
  #[error("invalid hex digit")]
  InvalidHex,
}

impl FromStr for Fingerprint {
  type Err = ParseFingerprintError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() != 64 {
      return Err(ParseFingerprintError::InvalidLength { len: s.len() });
    }

    let mut bytes = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
      let pair = std::str::from_utf8(chunk).map_err(|_| ParseFingerprintError::InvalidHex)?;
      bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| ParseFingerprintError::InvalidHex)?;
    }

    Ok(Self(bytes))
  }
}
