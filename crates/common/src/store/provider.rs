use std::time::Duration;

use async_trait::async_trait;

use crate::exchange::ExchangeRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store itself failed. Fatal to the enclosing request.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A stored record did not decode as an [`ExchangeRecord`].
    #[error("stored record has unexpected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Key-value store for exchange metadata with per-write TTL.
///
/// A record written with `ttl` must stop being returned by `get` once the
/// TTL elapses; eager deletion is an implementation detail. `get` on a
/// missing or expired key yields `Ok(None)`, never an error.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    async fn put(&self, id: &str, record: &ExchangeRecord, ttl: Duration)
        -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<ExchangeRecord>, StoreError>;

    /// Delete is idempotent: deleting a missing key succeeds.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Blob store for envelopes, keyed by exchange identifier.
///
/// Blobs carry no TTL of their own; their lifetime is managed entirely by
/// the lifecycle controller.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    async fn put(&self, id: &str, ciphertext: &str) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<String>, StoreError>;

    /// Delete is idempotent: deleting a missing key succeeds.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
