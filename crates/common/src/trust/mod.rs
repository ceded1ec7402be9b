//! Remote-proof trust verification.
//!
//! A sender may attach a compact JWS to an exchange, asserting that a
//! published identity signed the exact envelope being uploaded. The
//! verifier checks the signature against the issuer's public key set,
//! fetched from a key directory derived from a configured trust-gateway
//! base address, and binds the proof to the envelope via a content digest.
//!
//! Verification is fail-closed by construction: every early exit returns
//! the same untrusted outcome as a fully-checked rejection, so a caller can
//! never accidentally treat a malformed or unverifiable proof as trusted.

mod jwks;
mod proof;
mod verifier;

pub use jwks::{Jwk, KeySet};
pub use proof::{Proof, ProofError, PROOF_ALG};
pub use verifier::{TrustFailure, TrustOutcome, TrustVerifier, TrustVerifierError};
