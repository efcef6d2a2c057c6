//! Chain-specific types and error definitions.

use alloy::primitives::{Bytes, TxHash};
use thiserror::Error;

// Re-export NetworkConfig from config module to avoid duplication
pub use crate::config::schema::NetworkConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction request could not be completed or signed.
    #[error("Transaction build error: {0}")]
    Build(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Node rejected the signed transaction.
    #[error("Transaction submission rejected: {reason}")]
    Submit {
        reason: String,
        /// EIP-2718 encoded signed transaction, kept for diagnosis.
        raw: Bytes,
    },

    /// Broadcast timed out; the node may or may not hold the transaction.
    #[error("Broadcast of {tx_hash} unanswered: {reason}")]
    BroadcastUnknown { tx_hash: TxHash, reason: String },

    /// No terminal receipt within the allowed wait.
    #[error("Transaction {tx_hash} not confirmed after {waited_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Terminal on-chain record of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in, if reported.
    pub block_number: Option<u64>,
    /// `true` for status 1, `false` for a revert.
    pub success: bool,
}

impl Receipt {
    /// Human status label used in logs.
    pub fn status_label(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "reverted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(11_155_111u64);
        assert_eq!(chain_id.0, 11_155_111);
        assert_eq!(u64::from(chain_id), 11_155_111);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));

        let err = BlockchainError::ConfirmationTimeout {
            tx_hash: TxHash::ZERO,
            waited_secs: 30,
        };
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn test_receipt_label() {
        let mut receipt = Receipt {
            tx_hash: TxHash::ZERO,
            block_number: Some(7),
            success: true,
        };
        assert_eq!(receipt.status_label(), "success");
        receipt.success = false;
        assert_eq!(receipt.status_label(), "reverted");
    }
}
