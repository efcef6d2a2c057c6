//! Conversion between human token amounts and integer base units.
//!
//! Amounts are exact decimals. Converting to base units truncates toward
//! zero at the token's decimal places, so `to_base_units` followed by
//! `from_base_units` is lossless for any amount with at most `decimals`
//! fractional digits.

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::lending::error::LendingError;

fn ten_pow(exp: u32) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

fn invalid(amount: impl ToString, reason: &'static str) -> LendingError {
    LendingError::InvalidAmount {
        amount: amount.to_string(),
        reason,
    }
}

/// Convert a human amount to base units, truncating extra fractional digits.
///
/// Fails for non-positive amounts, amounts that truncate to zero, and
/// results that do not fit in 256 bits.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, LendingError> {
    if amount <= Decimal::ZERO {
        return Err(invalid(amount, "amount must be greater than zero"));
    }

    let truncated = amount.round_dp_with_strategy(u32::from(decimals), RoundingStrategy::ToZero);
    let mantissa = u128::try_from(truncated.mantissa())
        .map_err(|_| invalid(amount, "amount must be greater than zero"))?;
    if mantissa == 0 {
        return Err(invalid(amount, "amount is smaller than one base unit"));
    }

    // truncated.scale() <= decimals after rounding
    let shift = u32::from(decimals) - truncated.scale();
    ten_pow(shift)
        .and_then(|factor| U256::from(mantissa).checked_mul(factor))
        .ok_or_else(|| invalid(amount, "amount does not fit in 256-bit base units"))
}

/// Convert base units back to a human amount.
///
/// Fails when the result cannot be held exactly: `Decimal` keeps at most 28
/// fractional digits and 96 bits of mantissa.
pub fn from_base_units(raw: U256, decimals: u8) -> Result<Decimal, LendingError> {
    let divisor = ten_pow(u32::from(decimals))
        .ok_or_else(|| invalid(raw, "token decimals out of range"))?;
    let whole = raw / divisor;
    let frac = raw % divisor;

    let text = if frac.is_zero() {
        whole.to_string()
    } else {
        let frac = frac.to_string();
        let padding = "0".repeat(usize::from(decimals) - frac.len());
        format!("{whole}.{padding}{}", frac.trim_end_matches('0'))
    };

    let lossy = || invalid(raw, "balance exceeds decimal range or precision");
    let value = Decimal::from_str(&text).map_err(|_| lossy())?;
    if base_units_of(value, decimals) != Some(raw) {
        return Err(lossy());
    }
    Ok(value.normalize())
}

/// Exact base units of a non-negative `value` with at most `decimals` fractional digits.
fn base_units_of(value: Decimal, decimals: u8) -> Option<U256> {
    let mantissa = u128::try_from(value.mantissa()).ok()?;
    let shift = u32::from(decimals).checked_sub(value.scale())?;
    U256::from(mantissa).checked_mul(ten_pow(shift)?)
}

/// Exact decimal for a float amount, via its shortest round-trip text.
///
/// `0.1f64` becomes `0.1`, not the nearest binary fraction.
pub fn decimal_from_f64(amount: f64) -> Result<Decimal, LendingError> {
    if !amount.is_finite() {
        return Err(invalid(amount, "amount must be a finite number"));
    }
    Decimal::from_str(&amount.to_string()).map_err(|_| invalid(amount, "amount out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_hundred_with_six_decimals() {
        assert_eq!(to_base_units(dec("100.0"), 6).unwrap(), U256::from(100_000_000u64));
    }

    #[test]
    fn test_round_trip_six_decimals() {
        for s in ["1", "0.000001", "0.29", "1234.567891", "99999999.5"] {
            let amount = dec(s);
            let base = to_base_units(amount, 6).unwrap();
            assert_eq!(from_base_units(base, 6).unwrap(), amount, "amount {s}");
        }
    }

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(to_base_units(dec("1.2345679"), 6).unwrap(), U256::from(1_234_567u64));
        assert_eq!(to_base_units(dec("7.9"), 0).unwrap(), U256::from(7u64));
    }

    #[test]
    fn test_eighteen_decimals() {
        let base = to_base_units(dec("1.5"), 18).unwrap();
        assert_eq!(base, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(from_base_units(base, 18).unwrap(), dec("1.5"));
    }

    #[test]
    fn test_rejects_non_positive_and_dust() {
        assert!(matches!(
            to_base_units(Decimal::ZERO, 6),
            Err(LendingError::InvalidAmount { .. })
        ));
        assert!(to_base_units(dec("-1"), 6).is_err());
        assert!(to_base_units(dec("0.0000001"), 6).is_err());
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(to_base_units(dec("1"), 80).is_err());
        assert!(from_base_units(U256::from(1u64), 80).is_err());
    }

    #[test]
    fn test_balance_five() {
        assert_eq!(from_base_units(U256::from(5_000_000u64), 6).unwrap(), Decimal::from(5));
    }

    #[test]
    fn test_small_balance_keeps_leading_zeros() {
        assert_eq!(from_base_units(U256::from(42u64), 6).unwrap(), dec("0.000042"));
        assert_eq!(from_base_units(U256::ZERO, 6).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_lossy_balance_is_an_error() {
        assert!(matches!(
            from_base_units(U256::from(1u64), 30),
            Err(LendingError::InvalidAmount { .. })
        ));
        assert_eq!(
            from_base_units(U256::from(100u64), 30).unwrap(),
            Decimal::new(1, 28)
        );
        assert_eq!(
            from_base_units(U256::from(10u64).pow(U256::from(30u64)), 30).unwrap(),
            Decimal::ONE
        );
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64(0.1).unwrap(), dec("0.1"));
        assert_eq!(decimal_from_f64(100.0).unwrap(), dec("100"));
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(1e300).is_err());
    }
}
