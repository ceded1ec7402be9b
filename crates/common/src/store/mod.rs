//! Storage collaborator contracts.
//!
//! The relay needs two external stores: a key-value store for metadata
//! records with a per-write expiring TTL, and a blob store for the
//! envelopes themselves, keyed by exchange identifier. No transactional
//! cross-store guarantee is assumed or required; last-write-wins on the
//! metadata key is the accepted consistency model.

mod memory;
mod provider;

pub use memory::{MemoryBlobStore, MemoryMetadataStore};
pub use provider::{BlobStore, MetadataStore, StoreError};
