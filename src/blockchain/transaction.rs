//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Price EIP-1559 transactions from the observed gas price
//! - Build requests with an explicit nonce and gas limit
//! - Sign and broadcast (never retried)
//! - Poll for a terminal receipt within a bounded wait

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::blockchain::backend::ChainBackend;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Receipt};
use crate::blockchain::wallet::Wallet;
use crate::config::schema::{ConfirmationConfig, FeePolicy};
use crate::resilience::PollBackoff;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// EIP-1559 fee fields derived from one gas price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Observed network gas price in wei.
    pub gas_price: u128,
    /// Ceiling fee per gas.
    pub max_fee_per_gas: u128,
    /// Priority incentive per gas.
    pub max_priority_fee_per_gas: u128,
}

impl FeePolicy {
    /// Apply the multipliers to an observed gas price.
    ///
    /// Fails with `GasPriceTooHigh` when a non-zero cap is exceeded.
    pub fn quote(&self, gas_price: u128) -> BlockchainResult<FeeQuote> {
        let gas_price_gwei = gas_price / WEI_PER_GWEI;
        if self.max_gas_price_gwei > 0 && gas_price_gwei > u128::from(self.max_gas_price_gwei) {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: u64::try_from(gas_price_gwei).unwrap_or(u64::MAX),
                max_gwei: self.max_gas_price_gwei,
            });
        }

        Ok(FeeQuote {
            gas_price,
            max_fee_per_gas: gas_price.saturating_mul(u128::from(self.ceiling_multiplier)),
            max_priority_fee_per_gas: gas_price.saturating_mul(u128::from(self.priority_multiplier)),
        })
    }
}

/// Transaction builder for contract writes.
pub struct TxBuilder<C> {
    chain: C,
    chain_id: u64,
    fees: FeePolicy,
    confirmation: ConfirmationConfig,
}

impl<C: ChainBackend> TxBuilder<C> {
    /// Create a new transaction builder.
    pub fn new(chain: C, chain_id: u64, fees: FeePolicy, confirmation: ConfirmationConfig) -> Self {
        Self {
            chain,
            chain_id,
            fees,
            confirmation,
        }
    }

    /// The underlying chain backend.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Read the current gas price and price a transaction with it.
    pub async fn fee_quote(&self) -> BlockchainResult<FeeQuote> {
        let gas_price = self.chain.gas_price().await?;
        let quote = self.fees.quote(gas_price)?;
        tracing::debug!(
            gas_price,
            max_fee_per_gas = quote.max_fee_per_gas,
            max_priority_fee_per_gas = quote.max_priority_fee_per_gas,
            "Fee quote"
        );
        Ok(quote)
    }

    /// Build a complete EIP-1559 contract call request.
    pub fn build(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
        nonce: u64,
        gas_limit: u64,
        fees: &FeeQuote,
    ) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(U256::ZERO)
            .with_input(input)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
    }

    /// Sign `tx` with `wallet` and broadcast it.
    ///
    /// A rejected broadcast returns `Submit` carrying the raw payload; an
    /// unanswered one returns `BroadcastUnknown` carrying the local hash.
    pub async fn sign_and_submit(&self, wallet: &Wallet, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        let signed = wallet.sign_transaction(tx).await?;
        tracing::debug!(tx_hash = %signed.hash, "Transaction signed");

        match self.chain.send_raw_transaction(signed.raw.clone()).await {
            Ok(tx_hash) => {
                if tx_hash != signed.hash {
                    tracing::warn!(
                        local = %signed.hash,
                        remote = %tx_hash,
                        "Node reported a different transaction hash"
                    );
                }
                Ok(tx_hash)
            }
            Err(e @ BlockchainError::Timeout(_)) => {
                tracing::warn!(
                    tx_hash = %signed.hash,
                    error = %e,
                    "Broadcast unanswered; transaction may be pending"
                );
                Err(BlockchainError::BroadcastUnknown {
                    tx_hash: signed.hash,
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, raw = %signed.raw, "Failed to send raw transaction");
                Err(BlockchainError::Submit {
                    reason: e.to_string(),
                    raw: signed.raw,
                })
            }
        }
    }

    /// Wait for a transaction to reach a terminal state.
    ///
    /// Returns the receipt whether it succeeded or reverted. RPC errors while
    /// polling are logged and polling continues until `max_wait_secs`.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Receipt> {
        let required = self.confirmation.confirmation_blocks.max(1);
        let max_wait = Duration::from_secs(self.confirmation.max_wait_secs);
        let mut backoff = PollBackoff::new(
            self.confirmation.poll_interval_ms,
            self.confirmation.max_poll_interval_ms,
        );

        let result = timeout(max_wait, async {
            loop {
                match self.chain.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        if !receipt.success || required == 1 {
                            return receipt;
                        }
                        match self.chain.block_number().await {
                            Ok(current_block) => {
                                let tx_block = receipt.block_number.unwrap_or(current_block);
                                let confirmations = current_block.saturating_sub(tx_block) + 1;
                                if confirmations >= u64::from(required) {
                                    return receipt;
                                }
                                tracing::debug!(
                                    tx_hash = %tx_hash,
                                    confirmations,
                                    required,
                                    "Waiting for confirmations"
                                );
                            }
                            Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed"),
                        }
                    }
                    Ok(None) => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                    Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed"),
                }

                sleep(backoff.next_delay()).await;
            }
        })
        .await;

        result.map_err(|_| BlockchainError::ConfirmationTimeout {
            tx_hash,
            waited_secs: self.confirmation.max_wait_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_two_and_one() {
        let quote = FeePolicy::default().quote(7 * WEI_PER_GWEI).unwrap();
        assert_eq!(quote.max_fee_per_gas, 14 * WEI_PER_GWEI);
        assert_eq!(quote.max_priority_fee_per_gas, 7 * WEI_PER_GWEI);
    }

    #[test]
    fn test_gas_price_cap() {
        let policy = FeePolicy {
            max_gas_price_gwei: 100,
            ..FeePolicy::default()
        };
        let err = policy.quote(101 * WEI_PER_GWEI).unwrap_err();
        assert!(matches!(
            err,
            BlockchainError::GasPriceTooHigh { current_gwei: 101, max_gwei: 100 }
        ));
    }

    #[test]
    fn test_zero_cap_disables_check() {
        let policy = FeePolicy {
            max_gas_price_gwei: 0,
            ..FeePolicy::default()
        };
        assert!(policy.quote(u128::MAX).is_ok());
    }

    #[test]
    fn test_zero_gas_price() {
        let quote = FeePolicy::default().quote(0).unwrap();
        assert_eq!(quote.max_fee_per_gas, 0);
        assert_eq!(quote.max_priority_fee_per_gas, 0);
    }
}
