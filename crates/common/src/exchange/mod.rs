//! The exchange lifecycle.
//!
//! State machine for a single exchange:
//! `Active -> {Active (failed attempt), Locked, Expired} -> Deleted`, with
//! successful reads leaving the state untouched until expiry. Locked and
//! Expired are terminal; there is no way back to Active.

mod controller;
mod record;

pub use controller::{
    CreateExchange, CreatedExchange, ExchangeController, ExchangeError, RetrievedExchange,
};
pub use record::{ExchangeRecord, TrustTier, MAX_ATTEMPTS};
