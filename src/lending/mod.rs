//! Lending pool operations.
//!
//! # Modules
//! - `amount`: human amounts to token base units and back
//! - `contracts`: ERC-20 and pool ABI bindings
//! - `error`: failure taxonomy
//! - `submitter`: supply, borrow and balance flows
//! - `types`: rate modes and account risk snapshots

pub mod amount;
pub mod contracts;
pub mod error;
pub mod submitter;
pub mod types;

pub use amount::{decimal_from_f64, from_base_units, to_base_units};
pub use error::{FailureKind, LendingError};
pub use submitter::TransactionSubmitter;
pub use types::{AccountRiskSnapshot, AccountSummary, RateMode};
