//! Helpers for wiring up a relay in tests.

use std::sync::Arc;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use url::Url;

use crate::envelope::{base64url_encode, content_digest};
use crate::exchange::ExchangeController;
use crate::store::{MemoryBlobStore, MemoryMetadataStore};
use crate::trust::TrustVerifier;

/// A trust-gateway address nothing listens on. Connections are refused
/// immediately, so verification degrades to untrusted without stalling.
pub const UNREACHABLE_GATEWAY: &str = "http://127.0.0.1:1";

/// An exchange controller wired to in-memory stores, with handles kept on
/// the stores for direct inspection.
pub struct TestRelay {
    pub controller: ExchangeController,
    pub metadata: MemoryMetadataStore,
    pub blobs: MemoryBlobStore,
}

impl TestRelay {
    pub fn new() -> Self {
        Self::with_gateway(UNREACHABLE_GATEWAY)
    }

    pub fn with_gateway(gateway: &str) -> Self {
        let metadata = MemoryMetadataStore::new();
        let blobs = MemoryBlobStore::new();
        let verifier = TrustVerifier::new(Url::parse(gateway).expect("valid gateway url"))
            .expect("verifier construction");
        let controller = ExchangeController::new(
            Arc::new(metadata.clone()),
            Arc::new(blobs.clone()),
            Arc::new(verifier),
        );
        Self {
            controller,
            metadata,
            blobs,
        }
    }
}

impl Default for TestRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// A syntactically valid envelope with the fixed `dir` / `A256GCM` header
/// and a body section padded to roughly `body_len` bytes.
pub fn envelope_of_len(body_len: usize) -> String {
    let header = base64url_encode(br#"{"alg":"dir","enc":"A256GCM"}"#);
    let body = "A".repeat(body_len);
    format!("{}.{}.{}.{}.{}", header, "", "aXY", body, "dGFn")
}

/// A valid envelope whose total string length is exactly `total_len`.
pub fn envelope_exact_len(total_len: usize) -> String {
    let overhead = envelope_of_len(0).len();
    assert!(total_len >= overhead, "target length below envelope overhead");
    envelope_of_len(total_len - overhead)
}

/// A small, valid envelope.
pub fn envelope() -> String {
    envelope_of_len(64)
}

/// An identity with a fresh P-256 key: publishes the JWKS document a key
/// directory would serve and signs trust proofs over envelope digests.
pub struct TestIssuer {
    signing: SigningKey,
    kid: String,
}

impl TestIssuer {
    pub fn new() -> Self {
        let mut scalar = [0u8; 32];
        getrandom::getrandom(&mut scalar).expect("rng");
        let signing = SigningKey::from_slice(&scalar).expect("valid scalar");
        Self {
            signing,
            kid: "test-key".to_string(),
        }
    }

    /// The `{"keys": [...]}` document for this issuer.
    pub fn key_set_document(&self) -> serde_json::Value {
        use p256::elliptic_curve::sec1::ToEncodedPoint;

        let point = self.signing.verifying_key().to_encoded_point(false);
        serde_json::json!({
            "keys": [{
                "kty": "EC",
                "crv": "P-256",
                "x": base64url_encode(point.x().expect("x coordinate").as_slice()),
                "y": base64url_encode(point.y().expect("y coordinate").as_slice()),
                "kid": self.kid,
                "alg": "ES256",
            }]
        })
    }

    /// A compact JWS asserting that `issuer` signed exactly `ciphertext`.
    pub fn sign_proof(&self, issuer: &str, ciphertext: &str) -> String {
        let header = serde_json::json!({ "alg": "ES256", "kid": self.kid });
        let payload = serde_json::json!({
            "iss": issuer,
            "sub": content_digest(ciphertext),
            "iat": 1_700_000_000,
        });

        let signing_input = format!(
            "{}.{}",
            base64url_encode(header.to_string().as_bytes()),
            base64url_encode(payload.to_string().as_bytes())
        );
        let signature: Signature = self.signing.sign(signing_input.as_bytes());
        format!(
            "{}.{}",
            signing_input,
            base64url_encode(&signature.to_bytes())
        )
    }
}

impl Default for TestIssuer {
    fn default() -> Self {
        Self::new()
    }
}
