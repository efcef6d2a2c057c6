//! Resilience helpers.
//!
//! # Design Decisions
//! - Every external call has a deadline (see `blockchain::client`)
//! - Receipt polling backs off exponentially up to a configured ceiling
//! - Transaction broadcasts are never retried automatically

pub mod backoff;

pub use backoff::PollBackoff;
