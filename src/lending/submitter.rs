//! Transaction submitter for lending pool operations.
//!
//! # Flows
//! ```text
//! supply:  decimals → base units → nonce n: approve → wait → nonce n+1: supply → wait
//! borrow:  account snapshot → capacity check → decimals → base units → borrow → wait
//! balance: decimals → balanceOf → human amount
//! ```
//!
//! The network nonce is read once per flow; later transactions in the same
//! flow take the next local nonce. Only one flow per identity should be in
//! flight at a time.

use alloy::primitives::{Address, Bytes, TxHash};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::backend::ChainBackend;
use crate::blockchain::transaction::TxBuilder;
use crate::blockchain::types::Receipt;
use crate::blockchain::wallet::Wallet;
use crate::config::schema::{AgentConfig, LendingConfig};
use crate::lending::amount::{from_base_units, to_base_units};
use crate::lending::contracts;
use crate::lending::error::LendingError;
use crate::lending::types::{AccountRiskSnapshot, RateMode};
use crate::observability::metrics;

/// One write step of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Approve,
    Supply,
    Borrow,
}

impl Step {
    fn as_str(self) -> &'static str {
        match self {
            Step::Approve => "approve",
            Step::Supply => "supply",
            Step::Borrow => "borrow",
        }
    }
}

/// Executes lending operations for one signing identity.
pub struct TransactionSubmitter<C> {
    tx: TxBuilder<C>,
    wallet: Option<Wallet>,
    pool: Address,
    lending: LendingConfig,
    decimals: DashMap<Address, u8>,
}

impl<C: ChainBackend> TransactionSubmitter<C> {
    /// Create a submitter for `chain`.
    ///
    /// `wallet` may be `None` for a read-only session; writes then fail with
    /// `SigningIdentityUnset`.
    pub fn new(chain: C, wallet: Option<Wallet>, config: &AgentConfig) -> Result<Self, LendingError> {
        let pool: Address = config.lending.pool_address.parse().map_err(|e| {
            LendingError::Build(format!("Invalid pool address '{}': {}", config.lending.pool_address, e))
        })?;

        Ok(Self {
            tx: TxBuilder::new(
                chain,
                config.network.chain_id,
                config.lending.fees,
                config.confirmation.clone(),
            ),
            wallet,
            pool,
            lending: config.lending.clone(),
            decimals: DashMap::new(),
        })
    }

    /// Supply `amount` of `asset` to the pool: approve, then supply.
    ///
    /// Returns the supply transaction hash once it is confirmed successful.
    /// A reverted approval stops the flow before the supply is built. Any
    /// failure after the approval is mined carries the approval hash.
    pub async fn supply(&self, amount: Decimal, asset: Address) -> Result<TxHash, LendingError> {
        let span = tracing::info_span!("supply", operation_id = %Uuid::new_v4(), %asset, %amount);
        let result = self.supply_inner(amount, asset).instrument(span.clone()).await;
        span.in_scope(|| finish("supply", &result));
        result
    }

    async fn supply_inner(&self, amount: Decimal, asset: Address) -> Result<TxHash, LendingError> {
        tracing::info!("Attempting to supply");
        let wallet = self.wallet()?;
        ensure_positive(amount)?;
        self.ensure_connected().await?;

        let decimals = self.token_decimals(asset).await?;
        let amount_base = to_base_units(amount, decimals)?;
        tracing::info!(decimals, %amount_base, "Amount in token base units");

        self.sync_nonce(wallet).await?;

        let approval = self
            .execute(
                wallet,
                Step::Approve,
                asset,
                contracts::approve_calldata(self.pool, amount_base),
                self.lending.approve_gas_limit,
            )
            .await?;
        tracing::info!(tx_hash = %approval.tx_hash, "Pool approved to spend tokens");

        let supply = self
            .execute(
                wallet,
                Step::Supply,
                self.pool,
                contracts::supply_calldata(asset, amount_base, wallet.address(), self.lending.referral_code),
                self.lending.supply_gas_limit,
            )
            .await
            .map_err(|e| e.after_approval(approval.tx_hash))?;

        Ok(supply.tx_hash)
    }

    /// Borrow `amount` of `asset` against supplied collateral.
    ///
    /// A fresh account snapshot must show collateral and available borrows;
    /// otherwise nothing is built or sent.
    pub async fn borrow(
        &self,
        amount: Decimal,
        asset: Address,
        rate_mode: RateMode,
    ) -> Result<TxHash, LendingError> {
        let span = tracing::info_span!(
            "borrow",
            operation_id = %Uuid::new_v4(),
            %asset,
            %amount,
            %rate_mode
        );
        let result = self.borrow_inner(amount, asset, rate_mode).instrument(span.clone()).await;
        span.in_scope(|| finish("borrow", &result));
        result
    }

    async fn borrow_inner(
        &self,
        amount: Decimal,
        asset: Address,
        rate_mode: RateMode,
    ) -> Result<TxHash, LendingError> {
        tracing::info!("Attempting to borrow");
        let wallet = self.wallet()?;
        ensure_positive(amount)?;
        self.ensure_connected().await?;

        let user = wallet.address();
        let snapshot = self.read_account_data(user).await?;
        tracing::info!(
            total_collateral_base = %snapshot.total_collateral_base,
            total_debt_base = %snapshot.total_debt_base,
            available_borrows_base = %snapshot.available_borrows_base,
            ltv = %snapshot.ltv,
            health_factor = %snapshot.health_factor,
            "Account data"
        );
        if !snapshot.has_collateral() {
            return Err(LendingError::InsufficientCollateral { user });
        }
        if !snapshot.can_borrow() {
            return Err(LendingError::InsufficientBorrowingCapacity {
                user,
                collateral_base: snapshot.total_collateral_base,
            });
        }

        let decimals = self.token_decimals(asset).await?;
        let amount_base = to_base_units(amount, decimals)?;
        tracing::info!(decimals, %amount_base, "Amount in token base units");

        self.sync_nonce(wallet).await?;
        let borrow = self
            .execute(
                wallet,
                Step::Borrow,
                self.pool,
                contracts::borrow_calldata(asset, amount_base, rate_mode, self.lending.referral_code, user),
                self.lending.borrow_gas_limit,
            )
            .await?;

        Ok(borrow.tx_hash)
    }

    /// Token balance of `holder` (default: the signing identity) in human units.
    pub async fn get_balance(&self, token: Address, holder: Option<Address>) -> Result<Decimal, LendingError> {
        let span = tracing::info_span!("get_balance", operation_id = %Uuid::new_v4(), %token);
        let result = self.get_balance_inner(token, holder).instrument(span.clone()).await;
        span.in_scope(|| finish("get_balance", &result));
        result
    }

    async fn get_balance_inner(&self, token: Address, holder: Option<Address>) -> Result<Decimal, LendingError> {
        let holder = match holder {
            Some(holder) => holder,
            None => self.wallet()?.address(),
        };
        self.ensure_connected().await?;

        let decimals = self.token_decimals(token).await?;
        let data = self
            .tx
            .chain()
            .call(token, contracts::balance_of_calldata(holder))
            .await
            .map_err(|e| read_failed("token balance", e))?;
        let raw = contracts::decode_balance(&data).map_err(|e| read_failed("token balance", e))?;
        tracing::debug!(%holder, %raw, "Raw balance");

        let balance = from_base_units(raw, decimals).map_err(|e| read_failed("token balance", e))?;
        tracing::info!(%holder, %balance, "Balance read");
        Ok(balance)
    }

    /// Account risk snapshot of `user` (default: the signing identity).
    pub async fn account_data(&self, user: Option<Address>) -> Result<AccountRiskSnapshot, LendingError> {
        let span = tracing::info_span!("account_data", operation_id = %Uuid::new_v4());
        let result = async {
            let user = match user {
                Some(user) => user,
                None => self.wallet()?.address(),
            };
            self.ensure_connected().await?;
            self.read_account_data(user).await
        }
        .instrument(span.clone())
        .await;
        span.in_scope(|| finish("account_data", &result));
        result
    }

    fn wallet(&self) -> Result<&Wallet, LendingError> {
        self.wallet.as_ref().ok_or(LendingError::SigningIdentityUnset)
    }

    async fn ensure_connected(&self) -> Result<(), LendingError> {
        if self.tx.chain().is_connected().await {
            Ok(())
        } else {
            Err(LendingError::NotConnected)
        }
    }

    /// Decimals of `asset`, read once and cached.
    async fn token_decimals(&self, asset: Address) -> Result<u8, LendingError> {
        if let Some(decimals) = self.decimals.get(&asset) {
            return Ok(*decimals);
        }

        let unreadable = |reason: String| LendingError::DecimalsUnreadable { asset, reason };
        let data = self
            .tx
            .chain()
            .call(asset, contracts::decimals_calldata())
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        let decimals = contracts::decode_decimals(&data).map_err(|e| unreadable(e.to_string()))?;

        tracing::debug!(%asset, decimals, "Token decimals");
        self.decimals.insert(asset, decimals);
        Ok(decimals)
    }

    async fn read_account_data(&self, user: Address) -> Result<AccountRiskSnapshot, LendingError> {
        let data = self
            .tx
            .chain()
            .call(self.pool, contracts::account_data_calldata(user))
            .await
            .map_err(|e| read_failed("account data", e))?;
        contracts::decode_account_data(&data).map_err(|e| read_failed("account data", e))
    }

    /// Load the network nonce into the wallet's local counter.
    async fn sync_nonce(&self, wallet: &Wallet) -> Result<(), LendingError> {
        let nonce = self
            .tx
            .chain()
            .transaction_count(wallet.address())
            .await
            .map_err(|e| read_failed("account nonce", e))?;
        wallet.set_nonce(nonce);
        tracing::info!(address = %wallet.address(), nonce, "Current nonce");
        Ok(())
    }

    /// Price, build, sign, submit and wait for one transaction.
    ///
    /// A reverted receipt becomes `LendingError::Reverted`.
    async fn execute(
        &self,
        wallet: &Wallet,
        step: Step,
        to: Address,
        input: Bytes,
        gas_limit: u64,
    ) -> Result<Receipt, LendingError> {
        let fees = self.tx.fee_quote().await?;
        let nonce = wallet.get_and_increment_nonce();
        let request = self.tx.build(wallet.address(), to, input, nonce, gas_limit, &fees);
        tracing::info!(step = step.as_str(), nonce, gas_limit, "Transaction built");

        let tx_hash = self.tx.sign_and_submit(wallet, request).await?;
        tracing::info!(step = step.as_str(), tx_hash = %tx_hash, "Transaction submitted");

        let receipt = self.tx.wait_for_receipt(tx_hash).await?;
        metrics::record_transaction(step.as_str(), receipt.status_label());
        tracing::info!(
            step = step.as_str(),
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            status = receipt.status_label(),
            "Transaction mined"
        );

        if !receipt.success {
            return Err(LendingError::Reverted {
                tx_hash,
                block_number: receipt.block_number,
            });
        }
        Ok(receipt)
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LendingError> {
    if amount <= Decimal::ZERO {
        return Err(LendingError::InvalidAmount {
            amount: amount.to_string(),
            reason: "amount must be greater than zero",
        });
    }
    Ok(())
}

fn read_failed(what: &'static str, err: impl ToString) -> LendingError {
    LendingError::ReadFailed {
        what,
        reason: err.to_string(),
    }
}

/// Log and count the outcome of an operation.
fn finish<T>(operation: &'static str, result: &Result<T, LendingError>) {
    match result {
        Ok(_) => {
            metrics::record_operation(operation, "ok");
            tracing::info!("Operation completed");
        }
        Err(e) => {
            metrics::record_operation(operation, e.kind().as_str());
            tracing::error!(kind = %e.kind(), error = %e, "Operation failed");
        }
    }
}
