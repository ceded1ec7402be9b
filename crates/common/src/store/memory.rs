use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::provider::{BlobStore, MetadataStore, StoreError};
use crate::exchange::ExchangeRecord;

/// In-memory metadata store with lazy TTL expiry.
///
/// Records are held as serialized JSON and decoded on read, so a record
/// whose shape no longer matches [`ExchangeRecord`] fails loudly instead of
/// round-tripping as untyped data. Expired entries are dropped on access.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    inner: Arc<RwLock<HashMap<String, StoredRecord>>>,
}

#[derive(Debug)]
struct StoredRecord {
    json: String,
    expires_at: Instant,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn put(
        &self,
        id: &str,
        record: &ExchangeRecord,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {}", e)))?;
        inner.insert(
            id.to_string(),
            StoredRecord {
                json,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ExchangeRecord>, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {}", e)))?;
        match inner.get(id) {
            Some(stored) if stored.expires_at <= Instant::now() => {
                inner.remove(id);
                Ok(None)
            }
            Some(stored) => Ok(Some(serde_json::from_str(&stored.json)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {}", e)))?;
        inner.remove(id);
        Ok(())
    }
}

/// In-memory blob store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, id: &str, ciphertext: &str) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {}", e)))?;
        inner.insert(id.to_string(), ciphertext.to_string());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<String>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Backend(format!("failed to acquire read lock: {}", e)))?;
        Ok(inner.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {}", e)))?;
        inner.remove(id);
        Ok(())
    }
}
