//! Currency amounts.
//!
//! Invoice arithmetic runs on exact decimals. [`Amount`] is the validated,
//! cent-rounded form handed to presentation code (words, printed totals).

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Exclusive upper bound for amounts (one trillion).
///
/// Scale words stop at "Billion", so anything at or above this cannot be spelled.
pub const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

/// Non-negative currency amount rounded to whole cents.
///
/// Construction rounds half away from zero to two decimals first, so a
/// fraction such as `.995` carries into the whole units and [`Amount::cents`]
/// is always below 100.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Validate and round a raw decimal.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::validation(format!(
                "amount must not be negative (got {value})"
            )));
        }

        let rounded = round_cents(value);
        if rounded >= Decimal::from(AMOUNT_LIMIT) {
            return Err(DomainError::validation(format!(
                "amount must be below {AMOUNT_LIMIT} (got {value})"
            )));
        }

        // Normalizes "-0" and trailing zeros.
        let mut normalized = rounded.abs();
        normalized.rescale(2);
        Ok(Self(normalized))
    }

    /// Validate a floating-point amount. NaN and infinities are rejected.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation(format!(
                "amount must be a finite number (got {value})"
            )));
        }
        let decimal = Decimal::from_f64(value).ok_or_else(|| {
            DomainError::validation(format!("amount is out of range (got {value})"))
        })?;
        Self::new(decimal)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Integer part of the amount.
    pub fn whole_units(&self) -> u64 {
        // Bounded by AMOUNT_LIMIT, so the conversion cannot fail.
        self.0.trunc().to_u64().unwrap_or_default()
    }

    /// Fractional part in cents, 0..=99.
    pub fn cents(&self) -> u32 {
        (self.0.fract() * Decimal::ONE_HUNDRED)
            .to_u32()
            .unwrap_or_default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Round to two decimals, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render a decimal with exactly two fraction digits (`12.5` → `"12.50"`).
pub fn to_fixed_2(value: Decimal) -> String {
    let mut rounded = round_cents(value);
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn splits_whole_units_and_cents() {
        let amount = Amount::new(dec("1500.50")).unwrap();
        assert_eq!(amount.whole_units(), 1500);
        assert_eq!(amount.cents(), 50);
    }

    #[test]
    fn rounding_carries_into_whole_units() {
        let amount = Amount::new(dec("99.999")).unwrap();
        assert_eq!(amount.whole_units(), 100);
        assert_eq!(amount.cents(), 0);

        let amount = Amount::new(dec("0.995")).unwrap();
        assert_eq!(amount.whole_units(), 1);
        assert_eq!(amount.cents(), 0);
    }

    #[test]
    fn midpoint_rounds_away_from_zero() {
        assert_eq!(Amount::new(dec("12.345")).unwrap().cents(), 35);
        assert_eq!(Amount::new(dec("12.344")).unwrap().cents(), 34);
        assert_eq!(Amount::new(dec("0.125")).unwrap().cents(), 13);
    }

    #[test]
    fn rejects_negative_amounts() {
        let err = Amount::new(dec("-0.01")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_zero_is_zero() {
        let amount = Amount::new(dec("-0.00")).unwrap();
        assert!(amount.is_zero());
        assert!(!amount.value().is_sign_negative());
    }

    #[test]
    fn rejects_amounts_that_cannot_be_spelled() {
        assert!(Amount::new(dec("999999999999.99")).is_ok());
        assert!(Amount::new(dec("999999999999.995")).is_err());
        assert!(Amount::new(dec("1000000000000")).is_err());
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        assert!(Amount::from_f64(f64::NAN).is_err());
        assert!(Amount::from_f64(f64::INFINITY).is_err());
        assert!(Amount::from_f64(-1.0).is_err());
        assert_eq!(Amount::from_f64(210.0).unwrap().whole_units(), 210);
    }

    #[test]
    fn to_fixed_2_pads_and_rounds() {
        assert_eq!(to_fixed_2(dec("12.5")), "12.50");
        assert_eq!(to_fixed_2(dec("3")), "3.00");
        assert_eq!(to_fixed_2(dec("2.005")), "2.01");
    }

    #[test]
    fn serde_rejects_negative_values() {
        let ok: Amount = serde_json::from_str("\"10.5\"").unwrap();
        assert_eq!(ok.cents(), 50);
        assert!(serde_json::from_str::<Amount>("\"-1\"").is_err());
    }
}
