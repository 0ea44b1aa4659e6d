//! Currencies, rounding, and the balance tolerance.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Everything here wraps `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest debit/credit discrepancy still considered balanced (one cent).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns true if `a` and `b` differ by no more than [`BALANCE_TOLERANCE`].
///
/// Amounts whose difference does not fit in a `Decimal` are never within tolerance.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|difference| difference.abs() <= BALANCE_TOLERANCE)
}

/// Rounds an amount to `decimal_places` using banker's rounding.
///
/// Round half to even keeps cumulative rounding error neutral across many lines.
#[must_use]
pub fn round_currency(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
}

/// ISO 4217 currency codes supported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Nigerian Naira
    Ngn,
    /// Kenyan Shilling
    Kes,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of minor-unit digits used when rounding amounts in this currency.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Usd | Self::Eur | Self::Ngn | Self::Kes => 2,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
            Self::Ngn => write!(f, "NGN"),
            Self::Kes => write!(f, "KES"),
            Self::Jpy => write!(f, "JPY"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "NGN" => Ok(Self::Ngn),
            "KES" => Ok(Self::Kes),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
