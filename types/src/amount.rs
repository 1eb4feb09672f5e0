//! Token amounts in base units.
//!
//! Amounts are raw `uint256` base units. Display uses the token's decimals
//! (18 for the governed ERC20) the same way wallets render them.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use crate::error::TypesError;

/// Decimals of the governed token.
pub const TOKEN_DECIMALS: u8 = 18;

/// An ERC20 amount in base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    /// `whole` tokens expressed in base units (`whole × 10^18`).
    pub fn from_whole(whole: u64) -> Self {
        Self(U256::from(whole) * unit())
    }

    /// Parse a decimal token string such as `"100"` or `"1.5"` into base units.
    pub fn parse_units(input: &str) -> Result<Self, TypesError> {
        let invalid = |reason: &str| TypesError::InvalidAmount {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = input.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if frac.len() > TOKEN_DECIMALS as usize {
            return Err(invalid("too many decimal places"));
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }
        let whole = if whole.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(whole, 10).map_err(|e| invalid(&e.to_string()))?
        };
        let padded = format!("{frac:0<width$}", width = TOKEN_DECIMALS as usize);
        let frac = U256::from_str_radix(&padded, 10).map_err(|e| invalid(&e.to_string()))?;
        whole
            .checked_mul(unit())
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| invalid("overflow"))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Render with 18 decimals, trimming trailing zeros but keeping one
    /// fractional digit (`100.0`, `0.5`, `1.000000000000000001`).
    pub fn format_units(&self) -> String {
        let whole = self.0 / unit();
        let frac = self.0 % unit();
        let frac = format!("{:0>width$}", frac.to_string(), width = TOKEN_DECIMALS as usize);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            format!("{whole}.0")
        } else {
            format!("{whole}.{frac}")
        }
    }
}

fn unit() -> U256 {
    U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl From<U256> for TokenAmount {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_units())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_tokens() {
        let amount = TokenAmount::from_whole(100);
        assert_eq!(
            amount.raw(),
            U256::from_str_radix("100000000000000000000", 10).unwrap()
        );
        assert_eq!(amount.format_units(), "100.0");
    }

    #[test]
    fn parse_units_with_fraction() {
        let amount = TokenAmount::parse_units("1.5").unwrap();
        assert_eq!(amount.raw(), U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(amount.to_string(), "1.5");
        assert_eq!(TokenAmount::parse_units("100").unwrap(), TokenAmount::from_whole(100));
    }

    #[test]
    fn parse_units_rejects_bad_input() {
        assert!(TokenAmount::parse_units("").is_err());
        assert!(TokenAmount::parse_units("1.2.3").is_err());
        assert!(TokenAmount::parse_units("abc").is_err());
        assert!(TokenAmount::parse_units("0.0000000000000000001").is_err());
    }

    #[test]
    fn smallest_unit_formats() {
        let one_wei = TokenAmount::new(U256::from(1u64));
        assert_eq!(one_wei.format_units(), "0.000000000000000001");
        assert_eq!(TokenAmount::ZERO.format_units(), "0.0");
    }
}
