//! Lending domain types.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::lending::amount::from_base_units;

/// Decimals of the pool's base currency (USD with 8 decimals on Aave V3).
pub const BASE_CURRENCY_DECIMALS: u8 = 8;

/// Health factor scale (WAD).
pub const HEALTH_FACTOR_DECIMALS: u8 = 18;

/// Borrow interest rate mode.
///
/// Stable rate borrowing is deprecated in Aave V3, so `Variable` is the
/// default; `Stable` stays selectable for pools that still accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RateMode {
    /// Mode 1.
    Stable,
    /// Mode 2.
    #[default]
    Variable,
}

impl RateMode {
    /// On-chain `interestRateMode` value.
    pub fn code(self) -> u8 {
        match self {
            RateMode::Stable => 1,
            RateMode::Variable => 2,
        }
    }
}

impl TryFrom<u8> for RateMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(RateMode::Stable),
            2 => Ok(RateMode::Variable),
            other => Err(format!("unknown interest rate mode {other}, expected 1 (stable) or 2 (variable)")),
        }
    }
}

impl From<RateMode> for u8 {
    fn from(mode: RateMode) -> Self {
        mode.code()
    }
}

impl FromStr for RateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" | "fixed" | "1" => Ok(RateMode::Stable),
            "variable" | "2" => Ok(RateMode::Variable),
            other => Err(format!("unknown rate mode '{other}', expected 'variable' or 'stable'")),
        }
    }
}

impl fmt::Display for RateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateMode::Stable => write!(f, "stable"),
            RateMode::Variable => write!(f, "variable"),
        }
    }
}

/// Result of `Pool.getUserAccountData()`, raw on-chain values.
///
/// Collateral, debt and available borrows are in the pool's base currency;
/// threshold and LTV in basis points; health factor in WAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRiskSnapshot {
    pub total_collateral_base: U256,
    pub total_debt_base: U256,
    pub available_borrows_base: U256,
    pub current_liquidation_threshold: U256,
    pub ltv: U256,
    pub health_factor: U256,
}

impl AccountRiskSnapshot {
    /// Whether any collateral is supplied.
    pub fn has_collateral(&self) -> bool {
        !self.total_collateral_base.is_zero()
    }

    /// Whether the account can borrow anything at all.
    pub fn can_borrow(&self) -> bool {
        !self.available_borrows_base.is_zero()
    }

    /// Health factor as a ratio, `None` when there is no debt (the pool
    /// reports `uint256::MAX`).
    pub fn health_factor_ratio(&self) -> Option<Decimal> {
        if self.health_factor == U256::MAX {
            return None;
        }
        from_base_units(self.health_factor, HEALTH_FACTOR_DECIMALS).ok()
    }

    /// Human view with base-currency values scaled to decimals.
    pub fn summary(&self) -> AccountSummary {
        let base = |v: U256| from_base_units(v, BASE_CURRENCY_DECIMALS).ok();
        AccountSummary {
            total_collateral: base(self.total_collateral_base),
            total_debt: base(self.total_debt_base),
            available_borrows: base(self.available_borrows_base),
            liquidation_threshold_bps: self.current_liquidation_threshold.to_string(),
            ltv_bps: self.ltv.to_string(),
            health_factor: self.health_factor_ratio(),
        }
    }
}

/// Scaled view of an [`AccountRiskSnapshot`] for display and tool replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub total_collateral: Option<Decimal>,
    pub total_debt: Option<Decimal>,
    pub available_borrows: Option<Decimal>,
    pub liquidation_threshold_bps: String,
    pub ltv_bps: String,
    /// `None` means no debt.
    pub health_factor: Option<Decimal>,
}
