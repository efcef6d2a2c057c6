//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per operation)
//!     → metrics.rs (counters)
//! ```
//!
//! # Design Decisions
//! - Each lending operation runs in a span carrying a UUID operation id
//! - Private keys never appear in any event or span field

pub mod logging;
pub mod metrics;
