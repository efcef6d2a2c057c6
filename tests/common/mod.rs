//! Shared utilities for integration tests: an in-memory chain.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolValue;
use async_trait::async_trait;

use lending_agent::blockchain::{BlockchainError, BlockchainResult, ChainBackend, Receipt, Wallet};
use lending_agent::config::AgentConfig;
use lending_agent::TransactionSubmitter;

/// Anvil's first development key.
pub const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const GWEI: u128 = 1_000_000_000;

pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const SUPPLY_SELECTOR: [u8; 4] = [0x61, 0x7b, 0xa0, 0x37];
pub const BORROW_SELECTOR: [u8; 4] = [0xa4, 0x15, 0xbc, 0xad];
pub const ACCOUNT_DATA_SELECTOR: [u8; 4] = [0xbf, 0x92, 0x85, 0x7c];

pub fn usdc() -> Address {
    "0x94a9D9AC8a22534E3FaCa9F4e7F2E2cf85d5E4C8".parse().unwrap()
}

pub fn dai() -> Address {
    "0xFF34B3d4Aee8ddCd6F9AFFFB6Fe49bD371b8a357".parse().unwrap()
}

pub fn test_address() -> Address {
    TEST_ADDRESS.parse().unwrap()
}

/// What a mined transaction should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Revert,
    /// Never mined.
    Pending,
}

/// A broadcast transaction, decoded from its raw envelope.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub to: Address,
    pub nonce: u64,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub input: Bytes,
}

impl SentTx {
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&self.input[..4]);
        selector
    }

    /// 32-byte argument word `index` as an integer.
    pub fn word(&self, index: usize) -> U256 {
        let start = 4 + index * 32;
        U256::from_be_slice(&self.input[start..start + 32])
    }

    /// 32-byte argument word `index` as an address.
    pub fn address_arg(&self, index: usize) -> Address {
        let start = 4 + index * 32;
        Address::from_slice(&self.input[start + 12..start + 32])
    }
}

#[derive(Debug, Default)]
struct MockState {
    disconnected: bool,
    gas_price: u128,
    network_nonce: u64,
    block_number: u64,
    decimals: HashMap<Address, u8>,
    balances: HashMap<(Address, Address), U256>,
    account_data: [U256; 6],
    outcomes: Vec<Outcome>,
    submit_error: Option<String>,
    send_times_out: bool,
    gas_price_fails_after: Option<usize>,
    sent: Vec<SentTx>,
    decimals_calls: usize,
    nonce_calls: usize,
    gas_price_calls: usize,
    account_data_calls: usize,
}

/// In-memory `ChainBackend` with scripted state.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    pub fn new() -> Self {
        let chain = Self::default();
        {
            let mut state = chain.state.lock().unwrap();
            state.gas_price = 3 * GWEI;
            state.block_number = 1_000;
            state.account_data[5] = U256::MAX;
        }
        chain
    }

    pub fn with_token(self, token: Address, decimals: u8) -> Self {
        self.state.lock().unwrap().decimals.insert(token, decimals);
        self
    }

    pub fn with_gas_price(self, gas_price: u128) -> Self {
        self.state.lock().unwrap().gas_price = gas_price;
        self
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.state.lock().unwrap().network_nonce = nonce;
        self
    }

    pub fn with_balance(self, token: Address, holder: Address, raw: U256) -> Self {
        self.state.lock().unwrap().balances.insert((token, holder), raw);
        self
    }

    /// `getUserAccountData` result: collateral, debt, available, threshold, ltv, health factor.
    pub fn with_account_data(self, collateral: u64, debt: u64, available: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.account_data = [
                U256::from(collateral),
                U256::from(debt),
                U256::from(available),
                U256::from(8_250u64),
                U256::from(8_000u64),
                U256::MAX,
            ];
        }
        self
    }

    /// Outcomes of the next transactions, in send order. Unlisted ones succeed.
    pub fn with_outcomes(self, outcomes: &[Outcome]) -> Self {
        self.state.lock().unwrap().outcomes = outcomes.to_vec();
        self
    }

    pub fn with_submit_error(self, reason: &str) -> Self {
        self.state.lock().unwrap().submit_error = Some(reason.to_string());
        self
    }

    /// Broadcasts reach the mempool but the call times out.
    pub fn with_send_timeout(self) -> Self {
        self.state.lock().unwrap().send_times_out = true;
        self
    }

    /// Gas price reads fail once `calls` reads have succeeded.
    pub fn with_gas_price_failing_after(self, calls: usize) -> Self {
        self.state.lock().unwrap().gas_price_fails_after = Some(calls);
        self
    }

    pub fn disconnected(self) -> Self {
        self.state.lock().unwrap().disconnected = true;
        self
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn decimals_calls(&self) -> usize {
        self.state.lock().unwrap().decimals_calls
    }

    pub fn nonce_calls(&self) -> usize {
        self.state.lock().unwrap().nonce_calls
    }

    pub fn gas_price_calls(&self) -> usize {
        self.state.lock().unwrap().gas_price_calls
    }

    pub fn account_data_calls(&self) -> usize {
        self.state.lock().unwrap().account_data_calls
    }

    fn outcome_of(&self, tx_hash: TxHash) -> Option<(usize, Outcome)> {
        let state = self.state.lock().unwrap();
        state.sent.iter().position(|tx| tx.hash == tx_hash).map(|index| {
            let outcome = state.outcomes.get(index).copied().unwrap_or(Outcome::Success);
            (index, outcome)
        })
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    async fn is_connected(&self) -> bool {
        !self.state.lock().unwrap().disconnected
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        let mut state = self.state.lock().unwrap();
        if state.gas_price_fails_after.is_some_and(|limit| state.gas_price_calls >= limit) {
            return Err(BlockchainError::Rpc("eth_gasPrice unavailable".into()));
        }
        state.gas_price_calls += 1;
        Ok(state.gas_price)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.nonce_calls += 1;
        Ok(state.network_nonce)
    }

    async fn call(&self, to: Address, input: Bytes) -> BlockchainResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| BlockchainError::Rpc("empty calldata".into()))?;

        match selector {
            DECIMALS_SELECTOR => {
                state.decimals_calls += 1;
                let decimals = state
                    .decimals
                    .get(&to)
                    .copied()
                    .ok_or_else(|| BlockchainError::Rpc("execution reverted".into()))?;
                Ok(Bytes::from(U256::from(decimals).abi_encode()))
            }
            BALANCE_OF_SELECTOR => {
                let holder = Address::from_slice(&input[16..36]);
                let raw = state.balances.get(&(to, holder)).copied().unwrap_or_default();
                Ok(Bytes::from(raw.abi_encode()))
            }
            ACCOUNT_DATA_SELECTOR => {
                state.account_data_calls += 1;
                let d = state.account_data;
                Ok(Bytes::from((d[0], d[1], d[2], d[3], d[4], d[5]).abi_encode_params()))
            }
            other => Err(BlockchainError::Rpc(format!("unexpected call selector {other:?}"))),
        }
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.submit_error.clone() {
            return Err(BlockchainError::Rpc(reason));
        }

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| BlockchainError::Rpc(format!("undecodable transaction: {e}")))?;
        let signed = envelope
            .as_eip1559()
            .ok_or_else(|| BlockchainError::Rpc("expected an EIP-1559 transaction".into()))?;
        let tx = signed.tx();

        let sent = SentTx {
            hash: *envelope.tx_hash(),
            to: tx.to.to().copied().unwrap_or_default(),
            nonce: tx.nonce,
            chain_id: tx.chain_id,
            gas_limit: tx.gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
            input: tx.input.clone(),
        };
        let hash = sent.hash;
        state.network_nonce = state.network_nonce.max(sent.nonce + 1);
        state.sent.push(sent);
        state.block_number += 1;
        if state.send_times_out {
            return Err(BlockchainError::Timeout(10));
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        match self.outcome_of(tx_hash) {
            None => Err(BlockchainError::Rpc(format!("unknown transaction {tx_hash}"))),
            Some((_, Outcome::Pending)) => Ok(None),
            Some((index, outcome)) => Ok(Some(Receipt {
                tx_hash,
                block_number: Some(1_001 + index as u64),
                success: outcome == Outcome::Success,
            })),
        }
    }
}

/// Sepolia config with fast polling.
pub fn test_config() -> AgentConfig {
    let mut config = AgentConfig::sepolia();
    config.confirmation.poll_interval_ms = 5;
    config.confirmation.max_poll_interval_ms = 20;
    config.confirmation.max_wait_secs = 5;
    config
}

pub fn test_wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY, test_config().network.chain_id).unwrap()
}

pub fn submitter(chain: &MockChain) -> TransactionSubmitter<MockChain> {
    TransactionSubmitter::new(chain.clone(), Some(test_wallet()), &test_config()).unwrap()
}

pub fn read_only_submitter(chain: &MockChain) -> TransactionSubmitter<MockChain> {
    TransactionSubmitter::new(chain.clone(), None, &test_config()).unwrap()
}

pub fn pool() -> Address {
    test_config().lending.pool_address.parse().unwrap()
}
