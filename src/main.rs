//! Lending agent command line.
//!
//! # Flow
//!
//! ```text
//!   .env / environment ──┐
//!   --config (TOML) ─────┼─▶ AgentConfig ─▶ BlockchainClient ─┐
//!                        │                                    ├─▶ TransactionSubmitter ─▶ JSON on stdout
//!   LENDING_AGENT_PRIVATE_KEY ─────────────▶ Wallet ──────────┘
//! ```
//!
//! Logs go to stderr; results (or failures with their kind) go to stdout as
//! JSON. The exit status is non-zero on failure.

use std::error::Error;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use lending_agent::blockchain::{BlockchainClient, Wallet};
use lending_agent::config::{self, AgentConfig};
use lending_agent::lending::{LendingError, RateMode, TransactionSubmitter};
use lending_agent::observability::logging;
use lending_agent::tools::{self, resolve_address, ToolCall};

#[derive(Parser)]
#[command(name = "lending-agent")]
#[command(about = "Supply, borrow and query balances on an Aave V3 lending pool", long_about = None)]
struct Cli {
    /// TOML configuration file; Sepolia defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Approve and supply tokens to the pool
    Supply {
        /// Amount in token units, e.g. 100.5
        amount: Decimal,
        /// Token symbol or address
        asset: String,
    },
    /// Borrow tokens against supplied collateral
    Borrow {
        amount: Decimal,
        asset: String,
        #[arg(long, default_value_t = RateMode::Variable)]
        rate_mode: RateMode,
    },
    /// Token balance of the agent or another holder
    Balance {
        token: String,
        #[arg(long)]
        holder: Option<String>,
    },
    /// Collateral, debt and health factor of an account
    Account {
        #[arg(long)]
        user: Option<String>,
    },
    /// List known tokens
    Tokens,
    /// Execute a JSON tool call (argument or stdin)
    Tool {
        /// `{"name": ..., "arguments": {...}}`; read from stdin when omitted
        call: Option<String>,
        /// Print the tool definitions instead
        #[arg(long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };
    logging::init(&config.observability.log_level);

    tracing::info!(
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        pool = %config.lending.pool_address,
        "lending-agent v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Commands::Tokens => {
            print_json(&serde_json::to_value(&config.tokens)?)?;
            return Ok(());
        }
        Commands::Tool { list: true, .. } => {
            print_json(&serde_json::to_value(tools::tool_definitions())?)?;
            return Ok(());
        }
        command => run(command, &config).await,
    }
}

async fn run(command: Commands, config: &AgentConfig) -> Result<(), Box<dyn Error>> {
    let client = BlockchainClient::new(config.network.clone()).await?;
    let wallet = Wallet::from_env_optional(config.network.chain_id)?;
    match &wallet {
        Some(wallet) => tracing::info!(address = %wallet.address(), "Signing identity loaded"),
        None => tracing::warn!("No private key set; only read-only queries for explicit addresses will work"),
    }
    let submitter = TransactionSubmitter::new(client, wallet, config)?;

    if let Commands::Tool { call, .. } = command {
        let call = parse_tool_call(call)?;
        let reply = tools::execute(&submitter, config, call).await;
        print_json(&serde_json::to_value(&reply)?)?;
        if !reply.ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let result: Result<Value, LendingError> = match command {
        Commands::Supply { amount, asset } => {
            let asset = resolve_address(config, &asset)?;
            submitter
                .supply(amount, asset)
                .await
                .map(|tx_hash| json!({ "tx_hash": tx_hash.to_string() }))
        }
        Commands::Borrow {
            amount,
            asset,
            rate_mode,
        } => {
            let asset = resolve_address(config, &asset)?;
            submitter
                .borrow(amount, asset, rate_mode)
                .await
                .map(|tx_hash| json!({ "tx_hash": tx_hash.to_string() }))
        }
        Commands::Balance { token, holder } => {
            let token = resolve_address(config, &token)?;
            let holder = holder.as_deref().map(|h| resolve_address(config, h)).transpose()?;
            submitter
                .get_balance(token, holder)
                .await
                .map(|balance| json!({ "token": token.to_string(), "balance": balance.to_string() }))
        }
        Commands::Account { user } => {
            let user = user.as_deref().map(|u| resolve_address(config, u)).transpose()?;
            submitter
                .account_data(user)
                .await
                .map(|snapshot| json!({ "raw": snapshot, "summary": snapshot.summary() }))
        }
        Commands::Tokens | Commands::Tool { .. } => return Ok(()),
    };

    match result {
        Ok(value) => print_json(&value),
        Err(e) => {
            let mut failure = json!({ "ok": false, "kind": e.kind(), "message": e.to_string() });
            if let Value::Object(hashes) = tools::failure_hashes(&e) {
                for (key, hash) in hashes {
                    failure[key.as_str()] = hash;
                }
            }
            print_json(&failure)?;
            std::process::exit(1);
        }
    }
}

fn parse_tool_call(arg: Option<String>) -> Result<ToolCall, Box<dyn Error>> {
    let text = match arg {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut value: Value = serde_json::from_str(&text)?;
    let name = value["name"]
        .as_str()
        .ok_or("tool call needs a string \"name\"")?
        .to_string();
    let arguments = value
        .get_mut("arguments")
        .map(Value::take)
        .unwrap_or_else(|| json!({}));
    Ok(ToolCall::from_parts(&name, arguments)?)
}

fn print_json(value: &Value) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
