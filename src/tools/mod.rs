//! Tool-call dispatch onto the transaction submitter.
//!
//! An LLM tool call arrives as `{"name": ..., "arguments": {...}}`. It is
//! parsed into a [`ToolCall`], executed against a [`TransactionSubmitter`],
//! and answered with a serializable [`ToolReply`].

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::blockchain::backend::ChainBackend;
use crate::config::schema::AgentConfig;
use crate::lending::amount::decimal_from_f64;
use crate::lending::error::LendingError;
use crate::lending::submitter::TransactionSubmitter;
use crate::lending::types::RateMode;

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    /// Token balance of a holder, default the signing identity.
    GetTokenBalance {
        token_address: String,
        #[serde(default)]
        user_address: Option<String>,
    },
    /// Supply tokens to the pool.
    LendCrypto { amount: f64, asset_address: String },
    /// Borrow tokens from the pool.
    BorrowCrypto {
        amount: f64,
        asset_address: String,
        #[serde(default)]
        interest_rate_mode: RateMode,
    },
    /// Account risk snapshot, default the signing identity.
    GetUserAccountData {
        #[serde(default)]
        account_address: Option<String>,
    },
}

impl ToolCall {
    /// Build a call from a tool name and its JSON arguments.
    pub fn from_parts(name: &str, arguments: Value) -> Result<Self, ToolError> {
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| ToolError::InvalidArgument(format!("{name}: {e}")))
    }

    /// Registered tool name.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetTokenBalance { .. } => "get_token_balance",
            ToolCall::LendCrypto { .. } => "lend_crypto",
            ToolCall::BorrowCrypto { .. } => "borrow_crypto",
            ToolCall::GetUserAccountData { .. } => "get_user_account_data",
        }
    }
}

/// Errors from a tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not parse or named an unknown token.
    #[error("invalid tool arguments: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Lending(#[from] LendingError),
}

impl ToolError {
    /// Failure label for replies.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidArgument(_) => "invalid-argument",
            ToolError::Lending(e) => e.kind().as_str(),
        }
    }
}

/// Failure half of a [`ToolReply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    pub kind: &'static str,
    pub message: String,
}

/// Result of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolReply {
    pub name: &'static str,
    pub ok: bool,
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

impl ToolReply {
    fn success(name: &'static str, content: Value) -> Self {
        Self {
            name,
            ok: true,
            content,
            error: None,
        }
    }

    fn failure(name: &'static str, err: &ToolError) -> Self {
        let mut failure = ToolFailure {
            kind: err.kind(),
            message: err.to_string(),
        };
        let mut content = Value::Null;
        if let ToolError::Lending(e) = err {
            content = failure_hashes(e);
            if e.outcome_unknown() {
                failure.message.push_str("; check the transaction hash before retrying");
            }
        }
        Self {
            name,
            ok: false,
            content,
            error: Some(failure),
        }
    }
}

/// Hashes a failed operation left on-chain, `null` when there are none.
pub fn failure_hashes(err: &LendingError) -> Value {
    let mut hashes = serde_json::Map::new();
    if let Some(tx_hash) = err.tx_hash() {
        hashes.insert("tx_hash".into(), json!(tx_hash.to_string()));
    }
    if let Some(approval) = err.approval_hash() {
        hashes.insert("approval_tx_hash".into(), json!(approval.to_string()));
    }
    if hashes.is_empty() {
        Value::Null
    } else {
        Value::Object(hashes)
    }
}

/// Execute `call` and wrap the outcome in a reply.
pub async fn execute<C: ChainBackend>(
    submitter: &TransactionSubmitter<C>,
    config: &AgentConfig,
    call: ToolCall,
) -> ToolReply {
    let name = call.name();
    tracing::info!(tool = name, "Executing tool call");
    match dispatch(submitter, config, call).await {
        Ok(content) => ToolReply::success(name, content),
        Err(e) => {
            tracing::warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
            ToolReply::failure(name, &e)
        }
    }
}

async fn dispatch<C: ChainBackend>(
    submitter: &TransactionSubmitter<C>,
    config: &AgentConfig,
    call: ToolCall,
) -> Result<Value, ToolError> {
    match call {
        ToolCall::GetTokenBalance {
            token_address,
            user_address,
        } => {
            let token = resolve_address(config, &token_address)?;
            let holder = user_address.as_deref().map(|a| resolve_address(config, a)).transpose()?;
            let balance = submitter.get_balance(token, holder).await?;
            Ok(json!({
                "token_address": token.to_string(),
                "balance": balance.to_string(),
            }))
        }
        ToolCall::LendCrypto {
            amount,
            asset_address,
        } => {
            let asset = resolve_address(config, &asset_address)?;
            let amount = decimal_from_f64(amount)?;
            let tx_hash = submitter.supply(amount, asset).await?;
            Ok(json!({ "tx_hash": tx_hash.to_string() }))
        }
        ToolCall::BorrowCrypto {
            amount,
            asset_address,
            interest_rate_mode,
        } => {
            let asset = resolve_address(config, &asset_address)?;
            let amount = decimal_from_f64(amount)?;
            let tx_hash = submitter.borrow(amount, asset, interest_rate_mode).await?;
            Ok(json!({ "tx_hash": tx_hash.to_string() }))
        }
        ToolCall::GetUserAccountData { account_address } => {
            let user = account_address.as_deref().map(|a| resolve_address(config, a)).transpose()?;
            let snapshot = submitter.account_data(user).await?;
            Ok(json!({
                "raw": snapshot,
                "summary": snapshot.summary(),
            }))
        }
    }
}

/// Parse a token symbol from the registry or a literal address.
pub fn resolve_address(config: &AgentConfig, symbol_or_address: &str) -> Result<Address, ToolError> {
    let resolved = config.resolve_token(symbol_or_address.trim());
    resolved
        .parse()
        .map_err(|_| ToolError::InvalidArgument(format!("'{symbol_or_address}' is not a known token or an address")))
}

/// Name, description and JSON schema of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Descriptions of every tool, for advertising to a model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "get_token_balance",
            description: "Get the balance of an ERC-20 token for an address (default: the agent's own).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "token_address": { "type": "string", "description": "Token contract address or symbol" },
                    "user_address": { "type": "string", "description": "Holder address" }
                },
                "required": ["token_address"]
            }),
        },
        ToolSpec {
            name: "lend_crypto",
            description: "Supply tokens to the lending pool. Approves the pool, then supplies.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "amount": { "type": "number", "description": "Amount in token units, e.g. 100.5" },
                    "asset_address": { "type": "string", "description": "Token contract address or symbol" }
                },
                "required": ["amount", "asset_address"]
            }),
        },
        ToolSpec {
            name: "borrow_crypto",
            description: "Borrow tokens from the lending pool against supplied collateral.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "amount": { "type": "number", "description": "Amount in token units" },
                    "asset_address": { "type": "string", "description": "Token contract address or symbol" },
                    "interest_rate_mode": {
                        "type": "integer",
                        "enum": [1, 2],
                        "default": 2,
                        "description": "1 = stable, 2 = variable"
                    }
                },
                "required": ["amount", "asset_address"]
            }),
        },
        ToolSpec {
            name: "get_user_account_data",
            description: "Get collateral, debt, borrowing power and health factor for an account.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "account_address": { "type": "string", "description": "Account address" }
                }
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_borrow_defaults_to_variable() {
        let call: ToolCall = serde_json::from_str(
            r#"{"name": "borrow_crypto", "arguments": {"amount": 10.5, "asset_address": "DAI"}}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::BorrowCrypto {
                amount: 10.5,
                asset_address: "DAI".into(),
                interest_rate_mode: RateMode::Variable,
            }
        );
    }

    #[test]
    fn test_from_parts() {
        let call = ToolCall::from_parts("get_user_account_data", json!({})).unwrap();
        assert_eq!(call, ToolCall::GetUserAccountData { account_address: None });
        assert_eq!(call.name(), "get_user_account_data");

        let err = ToolCall::from_parts("withdraw_crypto", json!({})).unwrap_err();
        assert_eq!(err.kind(), "invalid-argument");

        let err = ToolCall::from_parts("borrow_crypto", json!({"amount": 1, "asset_address": "DAI", "interest_rate_mode": 3}))
            .unwrap_err();
        assert!(err.to_string().contains("interest rate mode"));
    }

    #[test]
    fn test_resolve_address() {
        let config = AgentConfig::sepolia();
        let usdc = resolve_address(&config, "usdc").unwrap();
        assert_eq!(
            usdc,
            "0x94a9D9AC8a22534E3FaCa9F4e7F2E2cf85d5E4C8".parse::<Address>().unwrap()
        );
        assert!(resolve_address(&config, "DOGE").is_err());
    }

    #[test]
    fn test_definitions_cover_every_tool() {
        let names: Vec<_> = tool_definitions().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            ["get_token_balance", "lend_crypto", "borrow_crypto", "get_user_account_data"]
        );
    }

    #[test]
    fn test_failure_reply_carries_hash() {
        let err = ToolError::Lending(LendingError::ConfirmationTimeout {
            tx_hash: alloy::primitives::TxHash::repeat_byte(0xab),
            waited_secs: 180,
        });
        let reply = ToolReply::failure("lend_crypto", &err);
        assert!(!reply.ok);
        assert_eq!(reply.error.as_ref().unwrap().kind, "confirmation-timeout");
        assert!(reply.content["tx_hash"].as_str().unwrap().starts_with("0xabab"));
    }

    #[test]
    fn test_failure_reply_carries_approval_hash() {
        let err = ToolError::Lending(
            LendingError::Build("gas price 900 gwei exceeds maximum".into())
                .after_approval(alloy::primitives::TxHash::repeat_byte(0xcd)),
        );
        let reply = ToolReply::failure("lend_crypto", &err);
        assert_eq!(reply.error.as_ref().unwrap().kind, "transaction-build-error");
        assert!(reply.content["approval_tx_hash"].as_str().unwrap().starts_with("0xcdcd"));
        assert!(reply.content.get("tx_hash").is_none());

        let bare = ToolReply::failure("lend_crypto", &ToolError::Lending(LendingError::NotConnected));
        assert!(bare.content.is_null());
    }
}
