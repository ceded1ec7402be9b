//! The credential guard: passcode hashing, verification, and generation.
//!
//! Stored hashes have the form `salt:key` with both halves hex-encoded.
//! Derivation is PBKDF2-HMAC-SHA256 at a round count high enough to resist
//! offline brute force of short numeric passcodes.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;
/// Derived key length in bytes.
pub const KEY_SIZE: usize = 32;
/// PBKDF2 iteration count.
pub const PBKDF2_ROUNDS: u32 = 310_000;
/// Digit count of generated passcodes.
pub const GENERATED_DIGITS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PasscodeError {
    #[error("failed to draw random bytes: {0}")]
    Rng(#[from] getrandom::Error),
    #[error("malformed stored passcode hash")]
    MalformedHash,
}

/// Derive a fresh `salt:key` hash for `passcode`.
pub fn hash(passcode: &str) -> Result<String, PasscodeError> {
    let mut salt = [0u8; SALT_SIZE];
    getrandom::getrandom(&mut salt)?;

    let key = derive(passcode, &salt);
    Ok(format!("{}:{}", hex::encode(salt), hex::encode(key)))
}

/// Verify `passcode` against a stored `salt:key` hash.
///
/// The comparison over the derived key is constant-time. A length mismatch
/// short-circuits, which is acceptable because the key length is fixed by
/// the derivation function, not attacker-controlled. A stored string that
/// does not parse as `salt:key` is an error rather than a silent mismatch.
pub fn verify(passcode: &str, stored: &str) -> Result<bool, PasscodeError> {
    let (salt_hex, key_hex) = stored.split_once(':').ok_or(PasscodeError::MalformedHash)?;
    let salt = hex::decode(salt_hex).map_err(|_| PasscodeError::MalformedHash)?;
    let stored_key = hex::decode(key_hex).map_err(|_| PasscodeError::MalformedHash)?;
    if stored_key.len() != KEY_SIZE {
        return Err(PasscodeError::MalformedHash);
    }

    let derived = derive(passcode, &salt);
    Ok(derived.ct_eq(&stored_key[..]).into())
}

/// Generate a numeric passcode of [`GENERATED_DIGITS`] digits.
///
/// Each random byte is reduced mod 10. Since 256 is not a multiple of 10
/// this is very slightly biased toward the digits 0-5; negligible for this
/// use, and deliberately left as-is.
pub fn generate() -> Result<String, PasscodeError> {
    let mut bytes = [0u8; GENERATED_DIGITS];
    getrandom::getrandom(&mut bytes)?;

    Ok(bytes
        .iter()
        .map(|b| char::from(b'0' + (b % 10)))
        .collect())
}

fn derive(passcode: &str, salt: &[u8]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passcode.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let stored = hash("4812").unwrap();
        assert!(verify("4812", &stored).unwrap());
        assert!(!verify("4813", &stored).unwrap());
    }

    #[test]
    fn hash_is_salted() {
        let a = hash("4812").unwrap();
        let b = hash("4812").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stored_hash_has_expected_shape() {
        let stored = hash("secret").unwrap();
        let (salt_hex, key_hex) = stored.split_once(':').unwrap();
        assert_eq!(salt_hex.len(), SALT_SIZE * 2);
        assert_eq!(key_hex.len(), KEY_SIZE * 2);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(matches!(
            verify("x", "no-separator"),
            Err(PasscodeError::MalformedHash)
        ));
        assert!(matches!(
            verify("x", "zz:zz"),
            Err(PasscodeError::MalformedHash)
        ));
        // Truncated key: wrong length, not a comparison miss.
        assert!(matches!(
            verify("x", "00112233445566778899aabbccddeeff:abcd"),
            Err(PasscodeError::MalformedHash)
        ));
    }

    #[test]
    fn generated_passcodes_are_fixed_length_digits() {
        for _ in 0..32 {
            let code = generate().unwrap();
            assert_eq!(code.len(), GENERATED_DIGITS);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
