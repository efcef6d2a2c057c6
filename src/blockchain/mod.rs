//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, RPC URL)
//!     → wallet.rs (key loading, signing, nonce tracking)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (price, build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod backend;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use backend::ChainBackend;
pub use client::BlockchainClient;
pub use transaction::{FeeQuote, TxBuilder};
pub use types::{BlockchainError, BlockchainResult, ChainId, NetworkConfig, Receipt};
pub use wallet::{SignedTransaction, Wallet};
