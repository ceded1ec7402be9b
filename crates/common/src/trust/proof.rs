//! Parsing of compact JWS trust proofs.
//!
//! Parsing never verifies anything: the header and payload are decoded
//! without checking the signature, and all policy decisions (algorithm,
//! issuer presence, content binding) belong to the verifier.

use serde::Deserialize;

use crate::envelope::base64url_decode;

/// The only signature algorithm accepted for trust proofs.
pub const PROOF_ALG: &str = "ES256";

#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProofHeader {
    pub alg: Option<String>,
    pub kid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProofPayload {
    /// Issuer identifier; selects the key directory.
    pub iss: Option<String>,
    /// Content digest of the envelope the proof was issued for.
    pub sub: Option<String>,
    /// Issuance time, seconds since epoch. Carried but not enforced.
    #[allow(unused)]
    pub iat: Option<i64>,
}

/// A parsed, unverified trust proof.
#[derive(Debug, Clone)]
pub struct Proof {
    pub header: ProofHeader,
    pub payload: ProofPayload,
    /// `header.payload` exactly as received; the bytes the signature covers.
    pub signing_input: String,
    /// Raw signature bytes (r || s for ES256).
    pub signature: Vec<u8>,
}

impl Proof {
    /// Parse a compact JWS without verifying the signature.
    pub fn parse(compact: &str) -> Result<Self, ProofError> {
        let sections: Vec<&str> = compact.split('.').collect();
        if sections.len() != 3 {
            return Err(ProofError::Format(format!(
                "expected 3 sections, got {}",
                sections.len()
            )));
        }

        let header_bytes =
            base64url_decode(sections[0]).map_err(|e| ProofError::Format(e.to_string()))?;
        let header: ProofHeader =
            serde_json::from_slice(&header_bytes).map_err(|e| ProofError::Format(e.to_string()))?;

        let payload_bytes =
            base64url_decode(sections[1]).map_err(|e| ProofError::Format(e.to_string()))?;
        let payload: ProofPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| ProofError::Format(e.to_string()))?;

        let signature =
            base64url_decode(sections[2]).map_err(|e| ProofError::Format(e.to_string()))?;

        Ok(Self {
            header,
            payload,
            signing_input: format!("{}.{}", sections[0], sections[1]),
            signature,
        })
    }
}
