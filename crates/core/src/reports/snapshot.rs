//! Per-account balances that statements are computed from.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;
use tracing::warn;

use super::error::ReportError;
use crate::ledger::{Account, AccountType, ChartOfAccounts, JournalEntry, NormalBalance};

/// Which posted entries a replayed snapshot includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    /// Everything dated on or before the date.
    AsOf {
        /// Last included date.
        date: NaiveDate,
    },
    /// Entries dated within the inclusive range.
    Range {
        /// First included date.
        start: NaiveDate,
        /// Last included date.
        end: NaiveDate,
    },
}

impl ReportPeriod {
    /// Cumulative period ending on `date`.
    #[must_use]
    pub const fn as_of(date: NaiveDate) -> Self {
        Self::AsOf { date }
    }

    /// Inclusive range; rejects `start > end`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self::Range { start, end })
    }

    /// Returns true if an entry dated `date` falls in the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::AsOf { date: end } => date <= end,
            Self::Range { start, end } => start <= date && date <= end,
        }
    }

    /// Last day of the period.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        match *self {
            Self::AsOf { date } => date,
            Self::Range { end, .. } => end,
        }
    }
}

/// Account balance for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account number.
    pub account_number: String,
    /// Account name.
    pub account_name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Side the balance is expressed on.
    pub normal_balance: NormalBalance,
    /// Whether the account is active.
    pub is_active: bool,
    /// Total debits included.
    pub total_debit: Decimal,
    /// Total credits included.
    pub total_credit: Decimal,
    /// Net balance in normal-balance polarity.
    pub balance: Decimal,
}

impl AccountBalance {
    fn opening(account: &Account, balance: Decimal) -> Self {
        let normal_balance = account.normal_balance();
        let (total_debit, total_credit) = normal_balance.columns(balance);
        Self {
            account_id: account.id,
            account_number: account.number.clone(),
            account_name: account.name.clone(),
            account_type: account.account_type,
            normal_balance,
            is_active: account.is_active,
            total_debit,
            total_credit,
            balance,
        }
    }

    fn record(&mut self, debit: Decimal, credit: Decimal) {
        self.total_debit += debit;
        self.total_credit += credit;
        self.balance += self.normal_balance.balance_change(debit, credit);
    }
}

/// Balances of every account in a chart, sorted by account number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    accounts: Vec<AccountBalance>,
}

impl LedgerSnapshot {
    /// Uses the balances stored on the accounts.
    #[must_use]
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        Self::sorted(
            accounts
                .into_iter()
                .map(|a| AccountBalance::opening(a, a.balance))
                .collect(),
        )
    }

    /// Recomputes balances from posted entries within `period`, starting at zero.
    ///
    /// Drafts, cancelled entries and lines on accounts outside the chart are
    /// skipped.
    #[must_use]
    pub fn replay<'a>(
        chart: &ChartOfAccounts,
        entries: impl IntoIterator<Item = &'a JournalEntry>,
        period: ReportPeriod,
    ) -> Self {
        let mut balances: BTreeMap<AccountId, AccountBalance> = chart
            .iter()
            .map(|a| (a.id, AccountBalance::opening(a, Decimal::ZERO)))
            .collect();

        let included = entries
            .into_iter()
            .filter(|e| e.status.contributes_to_balances() && period.contains(e.entry_date));
        for entry in included {
            for line in &entry.lines {
                let Some(account_id) = line.account() else {
                    continue;
                };
                match balances.get_mut(&account_id) {
                    Some(balance) => balance.record(line.debit, line.credit),
                    None => warn!(
                        entry_number = %entry.entry_number,
                        %account_id,
                        "posted line references an account outside the chart"
                    ),
                }
            }
        }

        Self::sorted(balances.into_values().collect())
    }

    fn sorted(mut accounts: Vec<AccountBalance>) -> Self {
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Self { accounts }
    }

    /// All balances in account-number order.
    #[must_use]
    pub fn accounts(&self) -> &[AccountBalance] {
        &self.accounts
    }

    /// Balances of one account type.
    pub fn of_type(&self, account_type: AccountType) -> impl Iterator<Item = &AccountBalance> {
        self.accounts
            .iter()
            .filter(move |a| a.account_type == account_type)
    }

    /// Sum of balances of one account type.
    #[must_use]
    pub fn total(&self, account_type: AccountType) -> Decimal {
        self.of_type(account_type).map(|a| a.balance).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::UserId;

    use crate::ledger::{AccountBook, EntryNumberSequence, JournalLine, LedgerStore};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn test_range_rejects_reversed_dates() {
        assert_eq!(
            ReportPeriod::range(date(3, 1), date(2, 1)),
            Err(ReportError::InvalidDateRange {
                start: date(3, 1),
                end: date(2, 1),
            })
        );
        assert!(ReportPeriod::range(date(2, 1), date(2, 1)).is_ok());
    }

    #[test]
    fn test_period_contains() {
        let range = ReportPeriod::range(date(1, 1), date(1, 31)).unwrap();
        assert!(range.contains(date(1, 1)));
        assert!(range.contains(date(1, 31)));
        assert!(!range.contains(date(2, 1)));

        let as_of = ReportPeriod::as_of(date(1, 15));
        assert!(as_of.contains(date(1, 1)));
        assert!(!as_of.contains(date(1, 16)));
        assert_eq!(as_of.end(), date(1, 15));
    }

    #[test]
    fn test_from_accounts_sorts_by_number() {
        let accounts = [
            Account::new("4000", "Revenue", AccountType::Revenue).with_balance(dec!(500)),
            Account::new("1000", "Cash", AccountType::Asset).with_balance(dec!(500)),
        ];
        let snapshot = LedgerSnapshot::from_accounts(&accounts);

        let numbers: Vec<_> = snapshot
            .accounts()
            .iter()
            .map(|a| a.account_number.as_str())
            .collect();
        assert_eq!(numbers, ["1000", "4000"]);
        assert_eq!(snapshot.total(AccountType::Revenue), dec!(500));
    }

    #[test]
    fn test_replay_skips_unposted_and_out_of_period() {
        let cash = Account::new("1000", "Cash", AccountType::Asset);
        let revenue = Account::new("4000", "Fees", AccountType::Revenue);
        let (cash_id, revenue_id) = (cash.id, revenue.id);
        let mut book = AccountBook::new(
            [cash, revenue].into_iter().collect(),
            EntryNumberSequence::default(),
        );

        let mut add = |d: NaiveDate, amount| {
            let entry = JournalEntry::draft(
                d,
                "Fee",
                vec![JournalLine::debit(cash_id, amount), JournalLine::credit(revenue_id, amount)],
            );
            book.add_draft(entry).unwrap()
        };
        let january = add(date(1, 10), dec!(100));
        let february = add(date(2, 10), dec!(40));
        let _draft = add(date(1, 20), dec!(7));
        let cancelled = add(date(1, 21), dec!(9));

        book.post(january, UserId::new()).unwrap();
        book.post(february, UserId::new()).unwrap();
        book.cancel(cancelled).unwrap();

        let january_end = ReportPeriod::as_of(date(1, 31));
        let as_of = LedgerSnapshot::replay(book.chart(), book.entries(), january_end);
        assert_eq!(as_of.total(AccountType::Asset), dec!(100));
        assert_eq!(as_of.total(AccountType::Revenue), dec!(100));

        let feb = ReportPeriod::range(date(2, 1), date(2, 28)).unwrap();
        let snapshot = LedgerSnapshot::replay(book.chart(), book.entries(), feb);
        assert_eq!(snapshot.total(AccountType::Revenue), dec!(40));

        // Full replay agrees with the stored balances
        let year_end = ReportPeriod::as_of(date(12, 31));
        let all = LedgerSnapshot::replay(book.chart(), book.entries(), year_end);
        assert_eq!(all, LedgerSnapshot::from_accounts(book.chart().iter()));
    }
}
