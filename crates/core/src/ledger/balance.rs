//! Normal-balance polarity rules.
//!
//! - Debit-normal (asset, expense): balance += debit - credit
//! - Credit-normal (liability, equity, revenue): balance += credit - debit

use rust_decimal::Decimal;

use super::types::{EntryType, NormalBalance};

impl NormalBalance {
    /// Balance change produced by a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Signed change for `amount` posted on `side`: positive when the side matches.
    #[must_use]
    pub fn signed_change(self, side: EntryType, amount: Decimal) -> Decimal {
        if self.matches(side) { amount } else { -amount }
    }

    /// Returns true if posting on `side` increases the balance.
    #[must_use]
    pub fn matches(self, side: EntryType) -> bool {
        matches!(
            (self, side),
            (Self::Debit, EntryType::Debit) | (Self::Credit, EntryType::Credit)
        )
    }

    /// Converts a balance in this polarity to debit polarity (debit positive).
    #[must_use]
    pub fn to_debit_polarity(self, balance: Decimal) -> Decimal {
        match self {
            Self::Debit => balance,
            Self::Credit => -balance,
        }
    }

    /// Places a balance into `(debit, credit)` trial-balance columns.
    ///
    /// The magnitude goes to the normal side; a negative balance flips to
    /// the opposite column.
    #[must_use]
    pub fn columns(self, balance: Decimal) -> (Decimal, Decimal) {
        if balance.is_zero() {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let debit_side = self.to_debit_polarity(balance);
        if debit_side >= Decimal::ZERO {
            (debit_side, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -debit_side)
        }
    }
}
