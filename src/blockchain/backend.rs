//! The narrow chain surface the lending flows depend on.
//!
//! `BlockchainClient` implements it over JSON-RPC; tests implement it in memory.

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, Receipt};

/// Read and broadcast operations against a single chain.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Whether the endpoint currently answers requests.
    async fn is_connected(&self) -> bool;

    /// Current gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Latest block number.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Next nonce for `address` as seen by the node.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Read-only `eth_call` against `to` with ABI-encoded `input`.
    async fn call(&self, to: Address, input: Bytes) -> BlockchainResult<Bytes>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash>;

    /// Receipt for `tx_hash`, or `None` while still pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>>;
}
