//! Validation of the opaque encrypted envelope relayed between parties.
//!
//! An envelope is a compact JWE (RFC 7516): five base64url sections joined
//! by dots. The relay only ever inspects the protected header, which must
//! declare direct key agreement (`"alg": "dir"`) with AES-256-GCM content
//! encryption (`"enc": "A256GCM"`). Everything past the header is opaque;
//! the relay stores and returns it byte-for-byte.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Content-type marker attached to envelopes on retrieval.
pub const ENVELOPE_CONTENT_TYPE: &str = "application/jose";

/// Required key-agreement mode in the protected header.
const REQUIRED_ALG: &str = "dir";
/// Required content-encryption algorithm in the protected header.
const REQUIRED_ENC: &str = "A256GCM";
/// Number of dot-separated sections in a compact JWE.
const COMPACT_JWE_SECTIONS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Format(String),
    #[error("unsupported envelope algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Encode bytes as URL-safe, unpadded base64.
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode URL-safe, unpadded base64.
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

#[derive(Debug, Deserialize)]
struct ProtectedHeader {
    alg: Option<String>,
    enc: Option<String>,
}

/// Check that `ciphertext` carries the fixed envelope header.
///
/// Only the protected header is parsed; the payload sections are not
/// decoded and no decryption is attempted.
pub fn validate(ciphertext: &str) -> Result<(), EnvelopeError> {
    let sections: Vec<&str> = ciphertext.split('.').collect();
    if sections.len() != COMPACT_JWE_SECTIONS {
        return Err(EnvelopeError::Format(format!(
            "expected {} sections, got {}",
            COMPACT_JWE_SECTIONS,
            sections.len()
        )));
    }

    let header_bytes =
        base64url_decode(sections[0]).map_err(|e| EnvelopeError::Format(e.to_string()))?;
    let header: ProtectedHeader =
        serde_json::from_slice(&header_bytes).map_err(|e| EnvelopeError::Format(e.to_string()))?;

    let alg = header
        .alg
        .ok_or_else(|| EnvelopeError::Format("missing alg in header".to_string()))?;
    let enc = header
        .enc
        .ok_or_else(|| EnvelopeError::Format("missing enc in header".to_string()))?;

    if alg != REQUIRED_ALG {
        return Err(EnvelopeError::UnsupportedAlgorithm(format!(
            "alg: expected {}, got {}",
            REQUIRED_ALG, alg
        )));
    }
    if enc != REQUIRED_ENC {
        return Err(EnvelopeError::UnsupportedAlgorithm(format!(
            "enc: expected {}, got {}",
            REQUIRED_ENC, enc
        )));
    }

    Ok(())
}

/// SHA-256 digest of the exact envelope string, base64url-encoded.
///
/// Trust proofs bind to this value: a proof issued for one envelope cannot
/// be replayed to authorize a different payload.
pub fn content_digest(ciphertext: &str) -> String {
    let digest = Sha256::digest(ciphertext.as_bytes());
    base64url_encode(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a syntactically valid envelope with the given header fields.
    fn envelope_with_header(alg: &str, enc: &str) -> String {
        let header = serde_json::json!({ "alg": alg, "enc": enc });
        let header_b64 = base64url_encode(header.to_string().as_bytes());
        format!(
            "{}.{}.{}.{}.{}",
            header_b64,
            "",
            base64url_encode(b"iv"),
            base64url_encode(b"ciphertext"),
            base64url_encode(b"tag")
        )
    }

    #[test]
    fn accepts_direct_a256gcm_envelope() {
        let envelope = envelope_with_header("dir", "A256GCM");
        assert!(validate(&envelope).is_ok());
    }

    #[test]
    fn rejects_wrong_section_count() {
        assert!(validate("not-an-envelope").is_err());
        assert!(validate("a.b.c").is_err());
        assert!(validate("a.b.c.d.e.f").is_err());
    }

    #[test]
    fn rejects_wrong_algorithms() {
        let wrong_alg = envelope_with_header("ECDH-ES+A256KW", "A256GCM");
        assert!(matches!(
            validate(&wrong_alg),
            Err(EnvelopeError::UnsupportedAlgorithm(_))
        ));

        let wrong_enc = envelope_with_header("dir", "A128GCM");
        assert!(matches!(
            validate(&wrong_enc),
            Err(EnvelopeError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn rejects_undecodable_header() {
        let envelope = "!!!.a.b.c.d";
        assert!(matches!(
            validate(envelope),
            Err(EnvelopeError::Format(_))
        ));
    }

    #[test]
    fn rejects_missing_header_fields() {
        let header_b64 = base64url_encode(br#"{"alg":"dir"}"#);
        let envelope = format!("{}.a.b.c.d", header_b64);
        assert!(matches!(validate(&envelope), Err(EnvelopeError::Format(_))));
    }

    #[test]
    fn content_digest_is_deterministic_and_input_sensitive() {
        let a = envelope_with_header("dir", "A256GCM");
        assert_eq!(content_digest(&a), content_digest(&a));

        let b = format!("{}x", a);
        assert_ne!(content_digest(&a), content_digest(&b));
    }
}
