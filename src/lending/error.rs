//! Failure taxonomy for lending operations.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;

/// Closed set of failure kinds a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    NotConnected,
    SigningIdentityUnset,
    InvalidAmount,
    DecimalsUnreadable,
    ReadFailed,
    InsufficientCollateral,
    InsufficientBorrowingCapacity,
    TransactionBuildError,
    TransactionSubmitError,
    TransactionReverted,
    ConfirmationTimeout,
}

impl FailureKind {
    /// Stable kebab-case label, also used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NotConnected => "not-connected",
            FailureKind::SigningIdentityUnset => "signing-identity-unset",
            FailureKind::InvalidAmount => "invalid-amount",
            FailureKind::DecimalsUnreadable => "decimals-unreadable",
            FailureKind::ReadFailed => "read-failed",
            FailureKind::InsufficientCollateral => "insufficient-collateral",
            FailureKind::InsufficientBorrowingCapacity => "insufficient-borrowing-capacity",
            FailureKind::TransactionBuildError => "transaction-build-error",
            FailureKind::TransactionSubmitError => "transaction-submit-error",
            FailureKind::TransactionReverted => "transaction-reverted",
            FailureKind::ConfirmationTimeout => "confirmation-timeout",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the transaction submitter.
#[derive(Debug, Error)]
pub enum LendingError {
    /// RPC endpoint did not answer the connectivity check.
    #[error("RPC endpoint is not reachable")]
    NotConnected,

    /// Write or default-holder read attempted without a wallet.
    #[error("No signing identity configured; set the private key before transacting")]
    SigningIdentityUnset,

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: &'static str },

    #[error("Could not read decimals of token {asset}: {reason}")]
    DecimalsUnreadable { asset: Address, reason: String },

    /// A read-only query other than `decimals()` failed.
    #[error("Could not read {what}: {reason}")]
    ReadFailed { what: &'static str, reason: String },

    #[error("No collateral supplied by {user}; supply collateral before borrowing")]
    InsufficientCollateral { user: Address },

    #[error("No borrowing power available for {user} (collateral {collateral_base}); supply more collateral")]
    InsufficientBorrowingCapacity { user: Address, collateral_base: U256 },

    /// Pricing, request assembly, or signing failed before broadcast.
    #[error("Transaction build error: {0}")]
    Build(String),

    /// Node rejected the raw transaction. Not retried: the nonce may be stale.
    #[error("Transaction submission rejected: {reason} (raw {raw})")]
    Submit { reason: String, raw: Bytes },

    /// Mined with status 0.
    #[error("Transaction {tx_hash} reverted in block {block_number:?}")]
    Reverted { tx_hash: TxHash, block_number: Option<u64> },

    /// Outcome unknown; check `tx_hash` again rather than resubmitting.
    #[error("Transaction {tx_hash} not confirmed after {waited_secs}s; outcome unknown")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Broadcast went unanswered; the node may still have accepted it.
    #[error("Broadcast of transaction {tx_hash} unanswered ({reason}); outcome unknown")]
    BroadcastUnknown { tx_hash: TxHash, reason: String },

    /// A step after a mined approval failed. The allowance stays on-chain.
    #[error("{source}; approval {approval} was already mined")]
    AfterApproval {
        approval: TxHash,
        source: Box<LendingError>,
    },
}

impl LendingError {
    /// The failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            LendingError::NotConnected => FailureKind::NotConnected,
            LendingError::SigningIdentityUnset => FailureKind::SigningIdentityUnset,
            LendingError::InvalidAmount { .. } => FailureKind::InvalidAmount,
            LendingError::DecimalsUnreadable { .. } => FailureKind::DecimalsUnreadable,
            LendingError::ReadFailed { .. } => FailureKind::ReadFailed,
            LendingError::InsufficientCollateral { .. } => FailureKind::InsufficientCollateral,
            LendingError::InsufficientBorrowingCapacity { .. } => {
                FailureKind::InsufficientBorrowingCapacity
            }
            LendingError::Build(_) => FailureKind::TransactionBuildError,
            LendingError::Submit { .. } => FailureKind::TransactionSubmitError,
            LendingError::Reverted { .. } => FailureKind::TransactionReverted,
            LendingError::ConfirmationTimeout { .. } | LendingError::BroadcastUnknown { .. } => {
                FailureKind::ConfirmationTimeout
            }
            LendingError::AfterApproval { source, .. } => source.kind(),
        }
    }

    /// Record that the approval `approval` was mined before this failure.
    pub fn after_approval(self, approval: TxHash) -> Self {
        match self {
            LendingError::AfterApproval { .. } => self,
            source => LendingError::AfterApproval {
                approval,
                source: Box::new(source),
            },
        }
    }

    /// Hash of an approval already mined by the failed flow.
    pub fn approval_hash(&self) -> Option<TxHash> {
        match self {
            LendingError::AfterApproval { approval, .. } => Some(*approval),
            _ => None,
        }
    }

    /// True when the transaction may still land on-chain.
    pub fn outcome_unknown(&self) -> bool {
        match self {
            LendingError::ConfirmationTimeout { .. } | LendingError::BroadcastUnknown { .. } => true,
            LendingError::AfterApproval { source, .. } => source.outcome_unknown(),
            _ => false,
        }
    }

    /// True when nothing was broadcast, so retrying from scratch is safe.
    pub fn nothing_broadcast(&self) -> bool {
        !matches!(
            self,
            LendingError::Reverted { .. }
                | LendingError::ConfirmationTimeout { .. }
                | LendingError::BroadcastUnknown { .. }
                | LendingError::AfterApproval { .. }
        )
    }

    /// Transaction hash involved in the failure, if any.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            LendingError::Reverted { tx_hash, .. }
            | LendingError::ConfirmationTimeout { tx_hash, .. }
            | LendingError::BroadcastUnknown { tx_hash, .. } => Some(*tx_hash),
            LendingError::AfterApproval { source, .. } => source.tx_hash(),
            _ => None,
        }
    }
}

impl From<BlockchainError> for LendingError {
    fn from(err: BlockchainError) -> Self {
        match err {
            BlockchainError::Submit { reason, raw } => LendingError::Submit { reason, raw },
            BlockchainError::ConfirmationTimeout { tx_hash, waited_secs } => {
                LendingError::ConfirmationTimeout { tx_hash, waited_secs }
            }
            BlockchainError::BroadcastUnknown { tx_hash, reason } => {
                LendingError::BroadcastUnknown { tx_hash, reason }
            }
            BlockchainError::Rpc(_) | BlockchainError::Timeout(_) | BlockchainError::ChainMismatch { .. } => {
                LendingError::ReadFailed {
                    what: "chain state",
                    reason: err.to_string(),
                }
            }
            BlockchainError::Wallet(_) | BlockchainError::Build(_) | BlockchainError::GasPriceTooHigh { .. } => {
                LendingError::Build(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(LendingError::NotConnected.kind().as_str(), "not-connected");
        assert_eq!(
            serde_json::to_string(&FailureKind::InsufficientBorrowingCapacity).unwrap(),
            "\"insufficient-borrowing-capacity\""
        );
    }

    #[test]
    fn test_blockchain_error_mapping() {
        let err: LendingError = BlockchainError::GasPriceTooHigh {
            current_gwei: 900,
            max_gwei: 500,
        }
        .into();
        assert_eq!(err.kind(), FailureKind::TransactionBuildError);
        assert!(err.nothing_broadcast());

        let err: LendingError = BlockchainError::Submit {
            reason: "nonce too low".into(),
            raw: Bytes::from_static(&[0x02, 0xf8]),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::TransactionSubmitError);
        assert!(err.to_string().contains("0x02f8"));

        let err: LendingError = BlockchainError::ConfirmationTimeout {
            tx_hash: TxHash::repeat_byte(1),
            waited_secs: 5,
        }
        .into();
        assert!(err.outcome_unknown());
        assert!(!err.nothing_broadcast());
        assert_eq!(err.tx_hash(), Some(TxHash::repeat_byte(1)));

        let err: LendingError = BlockchainError::BroadcastUnknown {
            tx_hash: TxHash::repeat_byte(2),
            reason: "RPC timeout after 10 seconds".into(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::ConfirmationTimeout);
        assert!(err.outcome_unknown());
        assert!(!err.nothing_broadcast());
        assert_eq!(err.tx_hash(), Some(TxHash::repeat_byte(2)));
    }

    #[test]
    fn test_failure_after_approval_is_not_retry_safe() {
        let approval = TxHash::repeat_byte(7);
        let err = LendingError::ReadFailed {
            what: "chain state",
            reason: "gas price unavailable".into(),
        }
        .after_approval(approval);

        assert_eq!(err.kind(), FailureKind::ReadFailed);
        assert!(!err.nothing_broadcast());
        assert!(!err.outcome_unknown());
        assert_eq!(err.approval_hash(), Some(approval));
        assert_eq!(err.tx_hash(), None);
        assert!(err.to_string().contains("already mined"));

        let err = err.after_approval(TxHash::repeat_byte(8));
        assert_eq!(err.approval_hash(), Some(approval));
    }
}
