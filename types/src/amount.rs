//! Balance display formatting.
//!
//! The gateway reports balances as decimal strings of raw units (wei,
//! lamports, ...) plus the token's decimals. Scaling is done in integer
//! arithmetic so large balances never lose precision.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;

/// Number of fractional digits shown for every balance.
pub const DISPLAY_DECIMALS: u32 = 6;

/// Largest power of ten that fits in a u128.
const MAX_POW10: u32 = 38;

/// Scale `raw` down by `10^decimals` and render it with exactly
/// [`DISPLAY_DECIMALS`] fractional digits, rounding half up.
///
/// `format_balance("500000000000000000", 18)` → `"0.500000"`.
pub fn format_balance(raw: &str, decimals: u32) -> Result<String, TypesError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypesError::InvalidAmount(raw.to_string()));
    }
    if decimals > MAX_POW10 {
        return Err(TypesError::UnsupportedDecimals(decimals));
    }
    let value: u128 = raw
        .parse()
        .map_err(|_| TypesError::Overflow(raw.to_string()))?;

    let scaled = if decimals >= DISPLAY_DECIMALS {
        let divisor = 10u128.pow(decimals - DISPLAY_DECIMALS);
        let quotient = value / divisor;
        let remainder = value % divisor;
        // remainder * 2 >= divisor, written without overflow
        if remainder >= divisor - remainder {
            quotient + 1
        } else {
            quotient
        }
    } else {
        value
            .checked_mul(10u128.pow(DISPLAY_DECIMALS - decimals))
            .ok_or_else(|| TypesError::Overflow(raw.to_string()))?
    };

    let unit = 10u128.pow(DISPLAY_DECIMALS);
    Ok(format!(
        "{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = DISPLAY_DECIMALS as usize
    ))
}

/// A formatted balance with its ticker, e.g. `0.500000 ETH`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDisplay {
    pub amount: String,
    pub symbol: String,
}

impl BalanceDisplay {
    pub fn new(raw: &str, decimals: u32, symbol: impl Into<String>) -> Result<Self, TypesError> {
        Ok(Self {
            amount: format_balance(raw, decimals)?,
            symbol: symbol.into(),
        })
    }
}

impl fmt::Display for BalanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_ether() {
        assert_eq!(format_balance("500000000000000000", 18).unwrap(), "0.500000");
    }

    #[test]
    fn display_with_symbol() {
        let display = BalanceDisplay::new("500000000000000000", 18, "ETH").unwrap();
        assert_eq!(display.to_string(), "0.500000 ETH");
    }

    #[test]
    fn rounds_half_up_at_sixth_digit() {
        // 1.2345675 with 7 decimals
        assert_eq!(format_balance("12345675", 7).unwrap(), "1.234568");
        assert_eq!(format_balance("12345674", 7).unwrap(), "1.234567");
    }

    #[test]
    fn rounding_can_carry_into_whole_part() {
        assert_eq!(format_balance("999999950000000000", 18).unwrap(), "1.000000");
    }

    #[test]
    fn few_decimals_are_padded() {
        // 6 decimals (USDT-style) and 2 decimals
        assert_eq!(format_balance("1500000", 6).unwrap(), "1.500000");
        assert_eq!(format_balance("1234", 2).unwrap(), "12.340000");
        assert_eq!(format_balance("7", 0).unwrap(), "7.000000");
    }

    #[test]
    fn zero_balance() {
        assert_eq!(format_balance("0", 18).unwrap(), "0.000000");
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(matches!(format_balance("", 18), Err(TypesError::InvalidAmount(_))));
        assert!(matches!(format_balance("1.5", 18), Err(TypesError::InvalidAmount(_))));
        assert!(matches!(format_balance("-1", 18), Err(TypesError::InvalidAmount(_))));
    }

    #[test]
    fn rejects_absurd_decimals() {
        assert_eq!(
            format_balance("1", 77),
            Err(TypesError::UnsupportedDecimals(77))
        );
    }

    #[test]
    fn huge_raw_value_overflows_cleanly() {
        let raw = "9".repeat(60);
        assert!(matches!(format_balance(&raw, 18), Err(TypesError::Overflow(_))));
    }
}
