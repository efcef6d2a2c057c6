//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default Aave V3 pool on Sepolia.
pub const DEFAULT_POOL_ADDRESS: &str = "0x6Ae43d3271ff6888e7Fc43Fd7321a503ff738951";

/// Sepolia chain ID.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Root configuration for the lending agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// RPC endpoint and chain settings.
    pub network: NetworkConfig,

    /// Lending pool and transaction pricing settings.
    pub lending: LendingConfig,

    /// Receipt polling settings.
    pub confirmation: ConfirmationConfig,

    /// Known tokens, addressable by symbol.
    pub tokens: Vec<TokenConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs (reads only).
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID embedded in every transaction.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: SEPOLIA_CHAIN_ID,
            rpc_timeout_secs: 10,
        }
    }
}

/// Lending pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LendingConfig {
    /// Address of the lending pool contract.
    pub pool_address: String,

    /// Referral code passed to supply and borrow.
    pub referral_code: u16,

    /// Gas limit for ERC-20 approvals.
    pub approve_gas_limit: u64,

    /// Gas limit for pool supply.
    pub supply_gas_limit: u64,

    /// Gas limit for pool borrow.
    pub borrow_gas_limit: u64,

    /// Fee pricing policy.
    pub fees: FeePolicy,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            pool_address: DEFAULT_POOL_ADDRESS.to_string(),
            referral_code: 0,
            approve_gas_limit: 100_000,
            supply_gas_limit: 700_000,
            borrow_gas_limit: 500_000,
            fees: FeePolicy::default(),
        }
    }
}

/// EIP-1559 fee policy, expressed as multiples of the observed gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeePolicy {
    /// `max_fee_per_gas = ceiling_multiplier * gas_price`.
    pub ceiling_multiplier: u64,

    /// `max_priority_fee_per_gas = priority_multiplier * gas_price`.
    pub priority_multiplier: u64,

    /// Refuse to price transactions above this gas price (gwei); 0 disables the cap.
    pub max_gas_price_gwei: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            ceiling_multiplier: 2,
            priority_multiplier: 1,
            max_gas_price_gwei: 500,
        }
    }
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// First delay between receipt polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound for the backoff between polls in milliseconds.
    pub max_poll_interval_ms: u64,

    /// Give up waiting after this many seconds.
    pub max_wait_secs: u64,

    /// Blocks (including the inclusion block) before a receipt counts as final.
    pub confirmation_blocks: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_poll_interval_ms: 8000,
            max_wait_secs: 180,
            confirmation_blocks: 1,
        }
    }
}

/// A token known by symbol.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenConfig {
    /// Ticker symbol (case-insensitive on lookup).
    pub symbol: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// ERC-20 contract address.
    pub address: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Aave V3 Sepolia test tokens.
pub fn sepolia_tokens() -> Vec<TokenConfig> {
    [
        ("USDC", "USD Coin", "0x94a9D9AC8a22534E3FaCa9F4e7F2E2cf85d5E4C8"),
        ("DAI", "Dai Stablecoin", "0xFF34B3d4Aee8ddCd6F9AFFFB6Fe49bD371b8a357"),
        ("WBTC", "Wrapped Bitcoin", "0x29f2D40B0605204364af54EC677bD022dA425d03"),
        ("USDT", "Tether USD", "0xaA8E23Fb1079EA71e0a56F48a2aA51851D8433D0"),
    ]
    .into_iter()
    .map(|(symbol, name, address)| TokenConfig {
        symbol: symbol.to_string(),
        name: name.to_string(),
        address: address.to_string(),
    })
    .collect()
}

impl AgentConfig {
    /// Resolve a token symbol or a literal address to an address string.
    ///
    /// Symbols are matched case-insensitively against `tokens`; anything
    /// else is returned unchanged for the caller to parse.
    pub fn resolve_token<'a>(&'a self, symbol_or_address: &'a str) -> &'a str {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol_or_address))
            .map(|t| t.address.as_str())
            .unwrap_or(symbol_or_address)
    }

    /// Config with the Sepolia token list filled in.
    pub fn sepolia() -> Self {
        Self {
            tokens: sepolia_tokens(),
            ..Self::default()
        }
    }
}
