//! Cryptographic primitives for the Courier relay.
//!
//! - **Credential guard**: slow passcode derivation (PBKDF2-HMAC-SHA256)
//!   with constant-time verification, plus numeric passcode generation.
//! - **Identifier generation**: unguessable opaque exchange identifiers
//!   backed by 256 bits of CSPRNG entropy.
//!
//! Neither primitive touches envelope contents: the relay never holds a
//! decryption key, only the means to gate and address ciphertext.

pub mod exchange_id;
pub mod passcode;

pub use exchange_id::{ExchangeId, ExchangeIdError};
pub use passcode::PasscodeError;
