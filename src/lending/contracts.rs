//! ABI bindings for the lending pool and ERC-20 tokens.
//!
//! Only the functions the agent calls are declared.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::lending::types::{AccountRiskSnapshot, RateMode};

sol! {
    /// Minimal ERC-20 surface.
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
    }

    /// Aave V3 pool surface.
    interface IPool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function borrow(address asset, uint256 amount, uint256 interestRateMode, uint16 referralCode, address onBehalfOf) external;
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralBase,
            uint256 totalDebtBase,
            uint256 availableBorrowsBase,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );
    }
}

/// `approve(spender, amount)` calldata.
pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// `decimals()` calldata.
pub fn decimals_calldata() -> Bytes {
    IERC20::decimalsCall {}.abi_encode().into()
}

/// `balanceOf(owner)` calldata.
pub fn balance_of_calldata(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }.abi_encode().into()
}

/// `supply(asset, amount, onBehalfOf, referralCode)` calldata.
pub fn supply_calldata(asset: Address, amount: U256, on_behalf_of: Address, referral_code: u16) -> Bytes {
    IPool::supplyCall {
        asset,
        amount,
        onBehalfOf: on_behalf_of,
        referralCode: referral_code,
    }
    .abi_encode()
    .into()
}

/// `borrow(asset, amount, interestRateMode, referralCode, onBehalfOf)` calldata.
pub fn borrow_calldata(
    asset: Address,
    amount: U256,
    rate_mode: RateMode,
    referral_code: u16,
    on_behalf_of: Address,
) -> Bytes {
    IPool::borrowCall {
        asset,
        amount,
        interestRateMode: U256::from(rate_mode.code()),
        referralCode: referral_code,
        onBehalfOf: on_behalf_of,
    }
    .abi_encode()
    .into()
}

/// `getUserAccountData(user)` calldata.
pub fn account_data_calldata(user: Address) -> Bytes {
    IPool::getUserAccountDataCall { user }.abi_encode().into()
}

/// Decode the return of `decimals()`.
pub fn decode_decimals(data: &[u8]) -> Result<u8, alloy::sol_types::Error> {
    IERC20::decimalsCall::abi_decode_returns(data)
}

/// Decode the return of `balanceOf(owner)`.
pub fn decode_balance(data: &[u8]) -> Result<U256, alloy::sol_types::Error> {
    IERC20::balanceOfCall::abi_decode_returns(data)
}

/// Decode the return of `getUserAccountData(user)`.
pub fn decode_account_data(data: &[u8]) -> Result<AccountRiskSnapshot, alloy::sol_types::Error> {
    let ret = IPool::getUserAccountDataCall::abi_decode_returns(data)?;
    Ok(AccountRiskSnapshot {
        total_collateral_base: ret.totalCollateralBase,
        total_debt_base: ret.totalDebtBase,
        available_borrows_base: ret.availableBorrowsBase,
        current_liquidation_threshold: ret.currentLiquidationThreshold,
        ltv: ret.ltv,
        health_factor: ret.healthFactor,
    })
}
