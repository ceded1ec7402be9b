//! The trust verifier: binds a sender-supplied proof to an envelope via a
//! remote public-key directory.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::Signature;
use tokio::sync::RwLock;
use url::Url;

use super::jwks::KeySet;
use super::proof::{Proof, PROOF_ALG};
use crate::envelope;

/// Upper bound on a key-directory fetch. An unreachable directory must
/// degrade to untrusted rather than stall the enclosing creation request.
const DIRECTORY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a fetched key set is served from cache before refreshing.
const KEY_SET_CACHE_TTL: Duration = Duration::from_secs(300);

/// Why a proof was not accepted. Internal observability only: externally
/// every variant collapses to an untrusted tier.
#[derive(Debug, thiserror::Error)]
pub enum TrustFailure {
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    #[error("unsupported proof algorithm: {0:?}")]
    UnsupportedAlgorithm(Option<String>),
    #[error("proof carries no issuer")]
    MissingIssuer,
    #[error("key directory unavailable: {0}")]
    DirectoryUnavailable(String),
    #[error("signature did not verify against the issuer key set")]
    SignatureMismatch,
    #[error("proof subject does not match the envelope digest")]
    ContentMismatch,
}

/// Result of verifying a proof against an envelope.
#[derive(Debug)]
pub enum TrustOutcome {
    /// The full verification chain completed.
    Verified { issuer: String },
    /// Anything less. Carries the reason for logging; callers must treat
    /// every rejection identically.
    Rejected(TrustFailure),
}

impl TrustOutcome {
    pub fn trusted(&self) -> bool {
        matches!(self, TrustOutcome::Verified { .. })
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            TrustOutcome::Verified { issuer } => Some(issuer),
            TrustOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrustVerifierError {
    #[error("failed to build directory client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Verifies trust proofs against a configured trust-gateway address.
///
/// The gateway base is injected configuration so self-hosted deployments
/// and tests can point at alternate directories. Key sets are cached per
/// issuer for [`KEY_SET_CACHE_TTL`].
#[derive(Debug)]
pub struct TrustVerifier {
    gateway: Url,
    client: reqwest::Client,
    cache: RwLock<HashMap<String, CachedKeySet>>,
}

#[derive(Debug)]
struct CachedKeySet {
    keys: KeySet,
    fetched_at: Instant,
}

impl TrustVerifier {
    pub fn new(gateway: Url) -> Result<Self, TrustVerifierError> {
        let client = reqwest::Client::builder()
            .timeout(DIRECTORY_FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            gateway,
            client,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Verify `proof` against `ciphertext`. Never fails: every internal
    /// error path returns the same untrusted outcome as a fully-checked
    /// rejection.
    pub async fn verify(&self, ciphertext: &str, proof: &str) -> TrustOutcome {
        match self.verify_inner(ciphertext, proof).await {
            Ok(issuer) => {
                tracing::debug!(issuer = %issuer, "trust proof verified");
                TrustOutcome::Verified { issuer }
            }
            Err(failure) => {
                tracing::debug!(reason = %failure, "trust proof rejected");
                TrustOutcome::Rejected(failure)
            }
        }
    }

    async fn verify_inner(&self, ciphertext: &str, proof: &str) -> Result<String, TrustFailure> {
        let proof = Proof::parse(proof).map_err(|e| TrustFailure::MalformedProof(e.to_string()))?;
        require_es256(&proof)?;
        let issuer = require_issuer(&proof)?;

        let keys = self.key_set(&issuer).await?;
        check_signature(&proof, &keys)?;
        check_binding(&proof, ciphertext)?;

        Ok(issuer)
    }

    /// Directory location for an issuer's key set, derived deterministically
    /// under the gateway base.
    fn jwks_url(&self, issuer: &str) -> Result<Url, TrustFailure> {
        let mut url = self.gateway.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TrustFailure::DirectoryUnavailable("gateway URL cannot be a base".to_string())
            })?
            .pop_if_empty()
            .push(issuer)
            .push("jwks.json");
        Ok(url)
    }

    async fn key_set(&self, issuer: &str) -> Result<KeySet, TrustFailure> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(issuer) {
                if cached.fetched_at.elapsed() < KEY_SET_CACHE_TTL {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let url = self.jwks_url(issuer)?;
        let keys: KeySet = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| TrustFailure::DirectoryUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| TrustFailure::DirectoryUnavailable(e.to_string()))?;

        let mut cache = self.cache.write().await;
        cache.insert(
            issuer.to_string(),
            CachedKeySet {
                keys: keys.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(keys)
    }
}

fn require_es256(proof: &Proof) -> Result<(), TrustFailure> {
    match proof.header.alg.as_deref() {
        Some(PROOF_ALG) => Ok(()),
        other => Err(TrustFailure::UnsupportedAlgorithm(
            other.map(str::to_string),
        )),
    }
}

fn require_issuer(proof: &Proof) -> Result<String, TrustFailure> {
    proof
        .payload
        .iss
        .clone()
        .filter(|iss| !iss.is_empty())
        .ok_or(TrustFailure::MissingIssuer)
}

fn check_signature(proof: &Proof, keys: &KeySet) -> Result<(), TrustFailure> {
    let signature =
        Signature::from_slice(&proof.signature).map_err(|_| TrustFailure::SignatureMismatch)?;

    for key in keys.candidates(proof.header.kid.as_deref()) {
        let Ok(verifying_key) = key.to_verifying_key() else {
            continue;
        };
        if verifying_key
            .verify(proof.signing_input.as_bytes(), &signature)
            .is_ok()
        {
            return Ok(());
        }
    }

    Err(TrustFailure::SignatureMismatch)
}

fn check_binding(proof: &Proof, ciphertext: &str) -> Result<(), TrustFailure> {
    let expected = envelope::content_digest(ciphertext);
    match proof.payload.sub.as_deref() {
        Some(sub) if sub == expected => Ok(()),
        _ => Err(TrustFailure::ContentMismatch),
    }
}
