//! Lending agent library: supply, borrow and balance queries against an
//! Aave V3 style pool.

pub mod blockchain;
pub mod config;
pub mod lending;
pub mod observability;
pub mod resilience;
pub mod tools;

pub use blockchain::{BlockchainClient, ChainBackend, Wallet};
pub use config::schema::AgentConfig;
pub use lending::{FailureKind, LendingError, RateMode, TransactionSubmitter};
pub use tools::{ToolCall, ToolReply};
