/**
 * Cryptographic primitives.
 *  - Passcode derivation and verification (the credential guard)
 *  - Unguessable exchange identifier generation
 */
pub mod crypto;
/**
 * Validation of the opaque encrypted envelope format
 *  relayed between senders and recipients, plus the
 *  content digest used to bind trust proofs to it.
 */
pub mod envelope;
/**
 * The exchange lifecycle: metadata records, trust tiers,
 *  and the controller that orchestrates creation and
 *  passcode-gated retrieval.
 */
pub mod exchange;
/**
 * Storage provider contracts (metadata with TTL, blobs)
 *  and their in-memory implementations.
 */
pub mod store;
/**
 * Helpers for wiring up a relay in tests.
 */
pub mod testkit;
/**
 * Verification of sender-supplied trust proofs against
 *  a remote public-key directory.
 */
pub mod trust;

pub mod prelude {
    pub use crate::crypto::exchange_id::ExchangeId;
    pub use crate::envelope::ENVELOPE_CONTENT_TYPE;
    pub use crate::exchange::{
        CreateExchange, CreatedExchange, ExchangeController, ExchangeError, ExchangeRecord,
        RetrievedExchange, TrustTier, MAX_ATTEMPTS,
    };
    pub use crate::store::{BlobStore, MemoryBlobStore, MemoryMetadataStore, MetadataStore};
    pub use crate::trust::{TrustOutcome, TrustVerifier};
}
