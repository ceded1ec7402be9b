//! Exchange metadata records and trust tiers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failed attempts allowed before an exchange locks permanently.
pub const MAX_ATTEMPTS: u32 = 10;

/// Access-limit classification, fixed at creation and never re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Trusted,
    Untrusted,
}

impl TrustTier {
    /// Maximum ciphertext length in bytes.
    pub fn max_payload_bytes(&self) -> usize {
        match self {
            TrustTier::Trusted => 1024 * 1024,
            TrustTier::Untrusted => 64 * 1024,
        }
    }

    /// Expiry applied when the sender requests none.
    pub fn default_expiry_secs(&self) -> u64 {
        3600
    }

    /// Upper bound on any requested expiry.
    pub fn max_expiry_secs(&self) -> u64 {
        match self {
            TrustTier::Trusted => 7 * 24 * 3600,
            TrustTier::Untrusted => 24 * 3600,
        }
    }

    /// `min(requested ?? default, max)` in seconds.
    pub fn effective_expiry_secs(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or_else(|| self.default_expiry_secs())
            .min(self.max_expiry_secs())
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustTier::Trusted => f.write_str("trusted"),
            TrustTier::Untrusted => f.write_str("untrusted"),
        }
    }
}

/// Metadata for a stored exchange.
///
/// Decoded strictly: a stored record whose shape does not match fails the
/// read instead of round-tripping as untyped data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeRecord {
    /// `salt:key` hex pair. Present iff the exchange is passcode-protected.
    pub passcode_hash: Option<String>,
    /// Absolute expiry, epoch milliseconds.
    pub expires_at_ms: i64,
    /// Failed passcode attempts so far, `0..=MAX_ATTEMPTS`.
    pub attempts: u32,
    /// Optional human label supplied by the sender.
    pub label: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at_ms: i64,
    /// True only after a full successful trust-verification chain.
    pub trusted: bool,
    /// Verified issuer identifier; set iff `trusted`.
    pub issuer: Option<String>,
}

impl ExchangeRecord {
    pub fn new(
        passcode_hash: Option<String>,
        created_at_ms: i64,
        expires_at_ms: i64,
        label: Option<String>,
        tier: TrustTier,
        issuer: Option<String>,
    ) -> Self {
        Self {
            passcode_hash,
            expires_at_ms,
            attempts: 0,
            label,
            created_at_ms,
            trusted: tier == TrustTier::Trusted,
            issuer,
        }
    }

    pub fn passcode_protected(&self) -> bool {
        self.passcode_hash.is_some()
    }

    pub fn locked(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }

    pub fn expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }

    pub fn remaining_attempts(&self) -> u32 {
        MAX_ATTEMPTS.saturating_sub(self.attempts)
    }

    /// Time left until expiry, used to refresh the TTL when the record is
    /// rewritten after a failed attempt.
    pub fn remaining_ttl(&self, now_ms: i64) -> Duration {
        Duration::from_millis(self.expires_at_ms.saturating_sub(now_ms).max(0) as u64)
    }
}
