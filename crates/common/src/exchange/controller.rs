//! The exchange lifecycle controller.
//!
//! Sole writer and reader of the storage collaborators. Creation and
//! retrieval are each a single logical task; the only shared mutable state
//! lives in the stores.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::crypto::exchange_id::{ExchangeId, ExchangeIdError};
use crate::crypto::passcode::{self, PasscodeError};
use crate::envelope::{self, ENVELOPE_CONTENT_TYPE};
use crate::store::{BlobStore, MetadataStore, StoreError};
use crate::trust::TrustVerifier;

use super::record::{ExchangeRecord, TrustTier, MAX_ATTEMPTS};

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The ciphertext is not a well-formed envelope.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// The ciphertext exceeds the tier's size bound.
    #[error("payload exceeds the {tier} tier limit of {limit} bytes")]
    PayloadTooLarge { tier: TrustTier, limit: usize },
    /// The exchange is passcode-protected and none was supplied. Not
    /// counted as an attempt.
    #[error("a passcode is required to retrieve this exchange")]
    AuthRequired,
    /// A supplied passcode failed verification. Counted.
    #[error("invalid passcode, {remaining} attempts remaining")]
    InvalidPasscode { remaining: u32 },
    /// The attempt budget is exhausted. Terminal.
    #[error("exchange locked after {MAX_ATTEMPTS} failed attempts")]
    Locked,
    /// No such exchange. Expired exchanges report this same condition to
    /// callers; see [`ExchangeError::Expired`].
    #[error("exchange not found")]
    NotFound,
    /// Detected-at-read expiry. Distinguished internally for logging only;
    /// the HTTP surface maps this to the same response as `NotFound` so an
    /// observer cannot tell whether an id ever existed.
    #[error("exchange expired")]
    Expired,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("credential guard error: {0}")]
    Passcode(#[from] PasscodeError),
    #[error("identifier generation failed: {0}")]
    Identifier(#[from] ExchangeIdError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Parameters for creating an exchange.
#[derive(Debug, Clone)]
pub struct CreateExchange {
    pub ciphertext: String,
    /// Sender-chosen passcode. Never echoed back.
    pub passcode: Option<String>,
    /// Ask the relay to generate a passcode instead. Ignored when
    /// `passcode` is set; the generated code is returned once.
    pub generate_passcode: bool,
    pub label: Option<String>,
    pub expires_in_secs: Option<u64>,
    /// Compact JWS trust proof. Absence always yields the untrusted tier.
    pub proof: Option<String>,
}

/// Outcome of a successful creation.
#[derive(Debug)]
pub struct CreatedExchange {
    pub id: ExchangeId,
    pub expires_at_ms: i64,
    pub passcode_protected: bool,
    /// Present only when the relay generated the passcode.
    pub generated_passcode: Option<String>,
    pub trusted: bool,
    pub issuer: Option<String>,
}

/// Outcome of a successful retrieval.
#[derive(Debug)]
pub struct RetrievedExchange {
    pub ciphertext: String,
    pub content_type: &'static str,
}

/// Orchestrates creation and retrieval, applies tier limits, and manages
/// attempt counting and expiry.
#[derive(Debug)]
pub struct ExchangeController {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    verifier: Arc<TrustVerifier>,
}

impl ExchangeController {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<TrustVerifier>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            verifier,
        }
    }

    pub async fn create(&self, req: CreateExchange) -> Result<CreatedExchange, ExchangeError> {
        envelope::validate(&req.ciphertext)
            .map_err(|e| ExchangeError::InvalidPayload(e.to_string()))?;

        // Trust verification never raises: any failure degrades silently
        // to the untrusted tier.
        let (tier, issuer) = match &req.proof {
            Some(proof) => {
                let outcome = self.verifier.verify(&req.ciphertext, proof).await;
                if outcome.trusted() {
                    (TrustTier::Trusted, outcome.issuer().map(str::to_string))
                } else {
                    (TrustTier::Untrusted, None)
                }
            }
            None => (TrustTier::Untrusted, None),
        };

        let limit = tier.max_payload_bytes();
        if req.ciphertext.len() > limit {
            return Err(ExchangeError::PayloadTooLarge { tier, limit });
        }

        let effective_secs = tier.effective_expiry_secs(req.expires_in_secs);
        let now_ms = Utc::now().timestamp_millis();
        let expires_at_ms = now_ms + effective_secs as i64 * 1000;

        let (passcode_hash, generated_passcode) = match req.passcode {
            Some(passcode) => (Some(hash_passcode(passcode).await?), None),
            None if req.generate_passcode => {
                let passcode = passcode::generate()?;
                (Some(hash_passcode(passcode.clone()).await?), Some(passcode))
            }
            // No hash stored: openly retrievable by anyone holding the id.
            None => (None, None),
        };

        let id = ExchangeId::generate()?;
        let record = ExchangeRecord::new(
            passcode_hash,
            now_ms,
            expires_at_ms,
            req.label,
            tier,
            issuer.clone(),
        );

        // Two independent writes with no cross-store transaction: if the
        // metadata write fails after the blob write, the blob orphans.
        // Accepted gap; see DESIGN.md.
        self.blobs.put(&id, &req.ciphertext).await?;
        self.metadata
            .put(&id, &record, Duration::from_secs(effective_secs))
            .await?;

        tracing::info!(id = %id, %tier, expires_at_ms, "exchange created");

        Ok(CreatedExchange {
            id,
            expires_at_ms,
            passcode_protected: record.passcode_protected(),
            generated_passcode,
            trusted: record.trusted,
            issuer,
        })
    }

    pub async fn retrieve(
        &self,
        id: &ExchangeId,
        passcode: Option<&str>,
    ) -> Result<RetrievedExchange, ExchangeError> {
        let Some(record) = self.metadata.get(id).await? else {
            return Err(ExchangeError::NotFound);
        };

        let now_ms = Utc::now().timestamp_millis();
        if record.expired_at(now_ms) {
            self.purge(id).await?;
            tracing::debug!(id = %id, "exchange expired at read time");
            return Err(ExchangeError::Expired);
        }

        if record.locked() {
            self.purge(id).await?;
            return Err(ExchangeError::Locked);
        }

        if let Some(stored_hash) = record.passcode_hash.clone() {
            // Distinguish "didn't try" from "tried and failed": only the
            // latter consumes attempt budget.
            let Some(passcode) = passcode else {
                return Err(ExchangeError::AuthRequired);
            };

            if !verify_passcode(passcode.to_string(), stored_hash).await? {
                let mut updated = record;
                updated.attempts += 1;
                let exhausted = updated.attempts >= MAX_ATTEMPTS;
                if exhausted {
                    // The exhausting attempt deletes the blob; the record
                    // stays behind until its own TTL reaps it.
                    self.blobs.delete(id).await?;
                    tracing::info!(id = %id, "exchange locked");
                }
                // The counter increment is the final persisted effect, so
                // an aborted retrieval cannot double-count.
                self.metadata
                    .put(id, &updated, updated.remaining_ttl(now_ms))
                    .await?;

                return Err(if exhausted {
                    ExchangeError::Locked
                } else {
                    ExchangeError::InvalidPasscode {
                        remaining: updated.remaining_attempts(),
                    }
                });
            }
            // Success neither resets nor increments the counter.
        }

        let Some(ciphertext) = self.blobs.get(id).await? else {
            // Record present but blob gone: dual-store consistency fault.
            tracing::warn!(id = %id, "metadata present but blob missing");
            return Err(ExchangeError::NotFound);
        };

        Ok(RetrievedExchange {
            ciphertext,
            content_type: ENVELOPE_CONTENT_TYPE,
        })
    }

    async fn purge(&self, id: &ExchangeId) -> Result<(), StoreError> {
        self.blobs.delete(id).await?;
        self.metadata.delete(id).await?;
        Ok(())
    }
}

/// Passcode derivation is CPU-bound; run it off the async executor so
/// unrelated requests keep making progress.
async fn hash_passcode(passcode: String) -> Result<String, ExchangeError> {
    tokio::task::spawn_blocking(move || passcode::hash(&passcode))
        .await
        .map_err(|e| anyhow::anyhow!("passcode hashing task failed: {}", e))?
        .map_err(ExchangeError::from)
}

async fn verify_passcode(passcode: String, stored: String) -> Result<bool, ExchangeError> {
    tokio::task::spawn_blocking(move || passcode::verify(&passcode, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("passcode verification task failed: {}", e))?
        .map_err(ExchangeError::from)
}
