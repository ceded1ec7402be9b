//! Public key set documents fetched from the trust directory.

use p256::ecdsa::VerifyingKey;
use p256::elliptic_curve::sec1::FromEncodedPoint;
use p256::{EncodedPoint, PublicKey};
use serde::Deserialize;

use crate::envelope::base64url_decode;

#[derive(Debug, thiserror::Error)]
pub enum JwkError {
    #[error("invalid JWK: {0}")]
    Invalid(String),
}

/// A standard JWKS document: `{"keys": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kty: Option<String>,
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
}

impl KeySet {
    /// Keys eligible to verify a proof, restricted to P-256 and, when the
    /// proof names a `kid`, to keys carrying that identifier.
    pub fn candidates<'a>(&'a self, kid: Option<&'a str>) -> impl Iterator<Item = &'a Jwk> {
        self.keys.iter().filter(move |key| {
            let curve_ok = key.kty.as_deref() == Some("EC") && key.crv.as_deref() == Some("P-256");
            let kid_ok = match kid {
                Some(kid) => key.kid.as_deref() == Some(kid),
                None => true,
            };
            curve_ok && kid_ok
        })
    }
}

impl Jwk {
    /// Import this JWK as a P-256 verifying key.
    ///
    /// Coordinates are left-padded to 32 bytes; JWKs may omit leading
    /// zeros.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, JwkError> {
        let x_b64 = self
            .x
            .as_deref()
            .ok_or_else(|| JwkError::Invalid("missing x coordinate".to_string()))?;
        let y_b64 = self
            .y
            .as_deref()
            .ok_or_else(|| JwkError::Invalid("missing y coordinate".to_string()))?;

        let x_bytes = base64url_decode(x_b64).map_err(|e| JwkError::Invalid(e.to_string()))?;
        let y_bytes = base64url_decode(y_b64).map_err(|e| JwkError::Invalid(e.to_string()))?;
        if x_bytes.len() > 32 || y_bytes.len() > 32 {
            return Err(JwkError::Invalid("oversized coordinate".to_string()));
        }

        // Uncompressed SEC1 point: 0x04 || x(32) || y(32)
        let mut uncompressed = Vec::with_capacity(65);
        uncompressed.push(0x04);
        uncompressed.extend(std::iter::repeat(0u8).take(32 - x_bytes.len()));
        uncompressed.extend_from_slice(&x_bytes);
        uncompressed.extend(std::iter::repeat(0u8).take(32 - y_bytes.len()));
        uncompressed.extend_from_slice(&y_bytes);

        let point = EncodedPoint::from_bytes(&uncompressed)
            .map_err(|e| JwkError::Invalid(format!("invalid EC point: {}", e)))?;

        let public = Option::<PublicKey>::from(PublicKey::from_encoded_point(&point))
            .ok_or_else(|| JwkError::Invalid("EC point not on P-256 curve".to_string()))?;

        Ok(VerifyingKey::from(&public))
    }
}

/// JWK for a freshly generated P-256 key. Test helper shared across the
/// trust module.
#[cfg(test)]
pub(crate) fn test_jwk(kid: Option<&str>) -> (p256::ecdsa::SigningKey, Jwk) {
    use crate::envelope::base64url_encode;
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    let mut scalar = [0u8; 32];
    getrandom::getrandom(&mut scalar).expect("rng");
    let signing = p256::ecdsa::SigningKey::from_slice(&scalar).expect("valid scalar");
    let point = signing.verifying_key().to_encoded_point(false);

    let jwk = Jwk {
        kty: Some("EC".to_string()),
        crv: Some("P-256".to_string()),
        x: Some(base64url_encode(point.x().unwrap().as_slice())),
        y: Some(base64url_encode(point.y().unwrap().as_slice())),
        kid: kid.map(str::to_string),
        alg: Some("ES256".to_string()),
    };
    (signing, jwk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_generated_key() {
        let (signing, jwk) = test_jwk(None);
        let imported = jwk.to_verifying_key().unwrap();
        assert_eq!(&imported, signing.verifying_key());
    }

    #[test]
    fn rejects_missing_coordinates() {
        let (_, mut jwk) = test_jwk(None);
        jwk.y = None;
        assert!(jwk.to_verifying_key().is_err());
    }

    #[test]
    fn candidates_filter_by_curve_and_kid() {
        let (_, ec) = test_jwk(Some("a"));
        let rsa = Jwk {
            kty: Some("RSA".to_string()),
            crv: None,
            x: None,
            y: None,
            kid: Some("a".to_string()),
            alg: None,
        };
        let set = KeySet {
            keys: vec![ec, rsa],
        };

        assert_eq!(set.candidates(None).count(), 1);
        assert_eq!(set.candidates(Some("a")).count(), 1);
        assert_eq!(set.candidates(Some("b")).count(), 0);
    }

    #[test]
    fn parses_jwks_document() {
        let doc = r#"{"keys":[{"kty":"EC","crv":"P-256","x":"AA","y":"AA","kid":"k1"}]}"#;
        let set: KeySet = serde_json::from_str(doc).unwrap();
        assert_eq!(set.keys.len(), 1);
        assert_eq!(set.keys[0].kid.as_deref(), Some("k1"));
    }
}
