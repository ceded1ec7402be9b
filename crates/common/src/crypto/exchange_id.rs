//! Opaque exchange identifiers.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::envelope::base64url_encode;

/// Entropy drawn per identifier, in bytes.
pub const EXCHANGE_ID_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeIdError {
    #[error("failed to draw random bytes: {0}")]
    Rng(#[from] getrandom::Error),
}

/// An unguessable, URL-safe exchange identifier.
///
/// 32 random bytes encoded as unpadded base64url, yielding 43 characters.
/// No collision detection is performed anywhere; with 256 bits of entropy
/// the collision probability is treated as cryptographically negligible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Generate a fresh identifier from the system CSPRNG.
    pub fn generate() -> Result<Self, ExchangeIdError> {
        let mut bytes = [0u8; EXCHANGE_ID_BYTES];
        getrandom::getrandom(&mut bytes)?;
        Ok(Self(base64url_encode(&bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExchangeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Deref for ExchangeId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_43_url_safe_chars() {
        let id = ExchangeId::generate().unwrap();
        assert_eq!(id.len(), 43);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = ExchangeId::generate().unwrap();
        let b = ExchangeId::generate().unwrap();
        assert_ne!(a, b);
    }
}
