//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountId, Currency};
use thiserror::Error;

use crate::ledger::AccountType;

/// Presentation settings shared by all statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Reporting currency.
    pub currency: Currency,
    /// Decimal places amounts are rounded to.
    pub decimal_places: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::for_currency(Currency::default())
    }
}

impl ReportOptions {
    /// Uses the currency's own minor-unit precision.
    #[must_use]
    pub const fn for_currency(currency: Currency) -> Self {
        Self {
            currency,
            decimal_places: currency.decimal_places(),
        }
    }
}

impl From<&LedgerConfig> for ReportOptions {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            currency: config.currency,
            decimal_places: config.decimal_places,
        }
    }
}

/// One account row of a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account number.
    pub account_number: String,
    /// Account name.
    pub account_name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Decimal,
    /// Credit column.
    pub credit: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits within one cent.
    pub balance_check: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: Currency,
    /// Active accounts in account-number order.
    pub rows: Vec<TrialBalanceRow>,
    /// Column totals.
    pub totals: TrialBalanceTotals,
}

/// One account line of a statement section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account number.
    pub account_number: String,
    /// Account name.
    pub account_name: String,
    /// Balance in the account's normal polarity.
    pub amount: Decimal,
}

/// A group of accounts with its total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    /// Section total.
    pub total: Decimal,
    /// Accounts in this section.
    pub lines: Vec<StatementLine>,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Period start date.
    pub period_start: NaiveDate,
    /// Period end date.
    pub period_end: NaiveDate,
    /// Currency code.
    pub currency: Currency,
    /// Revenue section.
    pub revenue: StatementSection,
    /// Expenses section.
    pub expenses: StatementSection,
    /// Revenue minus expenses.
    pub net_income: Decimal,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: Currency,
    /// Assets section.
    pub assets: StatementSection,
    /// Liabilities section.
    pub liabilities: StatementSection,
    /// Equity section.
    pub equity: StatementSection,
    /// Revenue minus expenses not yet closed into equity.
    pub unclosed_earnings: Decimal,
    /// Liabilities, equity and unclosed earnings.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity within one cent.
    pub is_balanced: bool,
    /// Set when the accounting equation does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_warning: Option<IntegrityWarning>,
}

/// Non-fatal data problem found while building a statement.
///
/// Points at an upstream bug (a one-sided posting, a hand-edited balance)
/// and is reported for investigation instead of failing the report.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// Assets differ from liabilities plus equity by more than one cent.
    #[error(
        "Balance sheet does not balance: assets {assets} vs liabilities and equity \
         {liabilities_and_equity} (difference {difference})"
    )]
    BalanceSheetMismatch {
        /// Total assets.
        assets: Decimal,
        /// Liabilities, equity and unclosed earnings.
        liabilities_and_equity: Decimal,
        /// Assets minus liabilities and equity.
        difference: Decimal,
    },
}
