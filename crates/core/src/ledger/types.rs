//! Ledger domain types.
//!
//! Accounts, journal lines and journal entries as exchanged with the
//! dashboard. All records serialize with snake_case field names.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, UserId, within_tolerance};

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// The side on which an account's balance normally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance (assets, expenses).
    Debit,
    /// Credits increase the balance (liabilities, equity, revenue).
    Credit,
}

/// Account classification in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, loans receivable).
    Asset,
    /// Obligations owed.
    Liability,
    /// Owners' residual interest.
    Equity,
    /// Income earned (interest, fees).
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Normal balance implied by the account type.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for types reported on the balance sheet.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Only balance-sheet accounts may group sub-accounts.
    #[must_use]
    pub const fn can_be_parent(self) -> bool {
        self.is_balance_sheet()
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        };
        f.write_str(name)
    }
}

/// A ledger account in a tenant's chart of accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    #[serde(default)]
    pub id: AccountId,
    /// Account number, numeric by convention (e.g. "1000").
    pub number: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Explicit normal balance; `None` means derived from the type.
    #[serde(
        rename = "normal_balance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub normal_balance_override: Option<NormalBalance>,
    /// Accumulated balance in normal-balance polarity.
    #[serde(default)]
    pub balance: Decimal,
    /// Grouping parent (asset, liability or equity account).
    #[serde(default)]
    pub parent_account_id: Option<AccountId>,
    /// Inactive accounts cannot receive new postings.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Account {
    /// Creates an active account with zero balance and derived normal balance.
    #[must_use]
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id: AccountId::new(),
            number: number.into(),
            name: name.into(),
            account_type,
            normal_balance_override: None,
            balance: Decimal::ZERO,
            parent_account_id: None,
            is_active: true,
            description: None,
        }
    }

    /// Overrides the derived normal balance (e.g. contra accounts).
    #[must_use]
    pub fn with_normal_balance(mut self, normal_balance: NormalBalance) -> Self {
        self.normal_balance_override = Some(normal_balance);
        self
    }

    /// Sets the opening balance.
    #[must_use]
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent: AccountId) -> Self {
        self.parent_account_id = Some(parent);
        self
    }

    /// The effective normal balance.
    #[must_use]
    pub fn normal_balance(&self) -> NormalBalance {
        self.normal_balance_override
            .unwrap_or_else(|| self.account_type.default_normal_balance())
    }
}

/// One row of a journal entry.
///
/// Absent amounts deserialize as zero so half-filled form rows validate
/// instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account to post to; `None` when the form row has no account selected.
    #[serde(default)]
    pub account_id: Option<AccountId>,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
    /// Optional line memo.
    #[serde(default)]
    pub description: Option<String>,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id: Some(account_id),
            debit: amount,
            ..Self::default()
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id: Some(account_id),
            credit: amount,
            ..Self::default()
        }
    }

    /// Returns the account if one is selected (nil ids count as unselected).
    #[must_use]
    pub fn account(&self) -> Option<AccountId> {
        self.account_id.filter(|id| !id.is_nil())
    }

    /// Returns the side and amount when exactly one side is positive.
    #[must_use]
    pub fn side(&self) -> Option<(EntryType, Decimal)> {
        let has_debit = self.debit > Decimal::ZERO;
        let has_credit = self.credit > Decimal::ZERO;
        match (has_debit, has_credit) {
            (true, false) if self.credit.is_zero() => Some((EntryType::Debit, self.debit)),
            (false, true) if self.debit.is_zero() => Some((EntryType::Credit, self.credit)),
            _ => None,
        }
    }
}

/// Journal entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Being drafted, mutable and deletable.
    #[default]
    Draft,
    /// Applied to account balances, immutable.
    Posted,
    /// Abandoned, contributes nothing.
    Cancelled,
}

impl EntryStatus {
    /// Returns true if the entry can be modified or deleted.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Cancelled)
    }

    /// Returns true if the entry counts towards account balances.
    #[must_use]
    pub fn contributes_to_balances(&self) -> bool {
        matches!(self, Self::Posted)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Posted => write!(f, "posted"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A journal entry (transaction) made of balanced lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    #[serde(default)]
    pub id: JournalEntryId,
    /// Human-facing number, assigned by [`super::EntryNumberSequence`].
    #[serde(default)]
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative, required.
    #[serde(default)]
    pub description: String,
    /// External reference (loan number, receipt).
    #[serde(default)]
    pub reference: Option<String>,
    /// Lines, at least two.
    #[serde(default)]
    pub lines: Vec<JournalLine>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: EntryStatus,
    /// Author.
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Who posted the entry.
    #[serde(default)]
    pub posted_by: Option<UserId>,
    /// When the entry was posted.
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Creates a draft entry without a number.
    #[must_use]
    pub fn draft(
        entry_date: NaiveDate,
        description: impl Into<String>,
        lines: Vec<JournalLine>,
    ) -> Self {
        Self {
            id: JournalEntryId::new(),
            entry_number: String::new(),
            entry_date,
            description: description.into(),
            reference: None,
            lines,
            status: EntryStatus::Draft,
            created_by: None,
            created_at: Utc::now(),
            posted_by: None,
            posted_at: None,
        }
    }

    /// Running debit/credit totals over all lines, `None` if a sum overflows.
    #[must_use]
    pub fn totals(&self) -> Option<EntryTotals> {
        EntryTotals::from_lines(&self.lines)
    }
}

/// Debit and credit totals of an entry, for validation and live display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Whether debits equal credits within one cent.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: within_tolerance(total_debit, total_credit),
        }
    }

    /// Sums the raw amounts of `lines`.
    ///
    /// Returns `None` when either sum exceeds the range of `Decimal`.
    #[must_use]
    pub fn from_lines(lines: &[JournalLine]) -> Option<Self> {
        let (total_debit, total_credit) = lines
            .iter()
            .try_fold((Decimal::ZERO, Decimal::ZERO), |(debit, credit), line| {
                Some((debit.checked_add(line.debit)?, credit.checked_add(line.credit)?))
            })?;
        Some(Self::new(total_debit, total_credit))
    }
}
