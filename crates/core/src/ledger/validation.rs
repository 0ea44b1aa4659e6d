//! Business rule validation for journal entries.
//!
//! Validation never fails fast: every violated rule is collected into a
//! [`ValidationReport`] so a form can flag all fields at once. Each issue
//! carries a typed location; the `line-<index>-account` style keys used by
//! the dashboard are only a rendering of that location.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::AccountId;
use thiserror::Error;

use super::chart::ChartOfAccounts;
use super::types::{AccountType, EntryTotals, EntryType, JournalEntry, JournalLine};

/// Entry-level (or account-level) field an issue is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
    /// Entry description.
    Description,
    /// The set of lines as a whole.
    Lines,
    /// Debit/credit balance.
    Balance,
    /// Account name.
    Name,
    /// Account number.
    Number,
    /// Parent account.
    Parent,
}

impl EntryField {
    fn key(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Lines => "lines",
            Self::Balance => "balance",
            Self::Name => "name",
            Self::Number => "number",
            Self::Parent => "parent",
        }
    }
}

impl std::fmt::Display for EntryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Description => "Description",
            Self::Lines => "Lines",
            Self::Balance => "Balance",
            Self::Name => "Name",
            Self::Number => "Number",
            Self::Parent => "Parent",
        };
        f.write_str(label)
    }
}

/// Field within a single journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    /// Selected account.
    Account,
    /// Debit/credit pair as a whole.
    Amount,
    /// Debit amount.
    Debit,
    /// Credit amount.
    Credit,
}

impl LineField {
    fn key(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Amount => "amount",
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// Where a validation issue applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorLocation {
    /// Entry-level field.
    Entry {
        /// The field.
        field: EntryField,
    },
    /// Field of the line at `index` (zero-based).
    Line {
        /// Line position.
        index: usize,
        /// The field.
        field: LineField,
    },
}

impl ErrorLocation {
    /// Form key, e.g. `balance` or `line-2-account`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Entry { field } => field.key().to_string(),
            Self::Line { index, field } => format!("line-{index}-{}", field.key()),
        }
    }

    /// Line index, if line-scoped.
    #[must_use]
    pub fn line_index(&self) -> Option<usize> {
        match self {
            Self::Entry { .. } => None,
            Self::Line { index, .. } => Some(*index),
        }
    }
}

/// Kind of rule that was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Required text field is empty or whitespace.
    #[error("{field} is required")]
    MissingField {
        /// The empty field.
        field: EntryField,
    },

    /// Fewer than two lines.
    #[error("Journal entry must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// Debits and credits differ by more than one cent.
    #[error("Debits ({total_debit}) must equal credits ({total_credit})")]
    Unbalanced {
        /// Sum of debits.
        total_debit: Decimal,
        /// Sum of credits.
        total_credit: Decimal,
    },

    /// A total or resulting balance does not fit in a `Decimal`.
    #[error("Amounts exceed the supported range")]
    AmountOutOfRange,

    /// Line has no account selected.
    #[error("Account is required")]
    MissingAccount,

    /// Line has both a debit and a credit.
    #[error("Enter either a debit or a credit, not both")]
    AmbiguousAmount,

    /// Line has neither a debit nor a credit.
    #[error("Enter a debit or a credit amount")]
    ZeroAmount,

    /// Line amount is below zero.
    #[error("Amount cannot be negative ({side}: {amount})")]
    NegativeAmount {
        /// Offending side.
        side: EntryType,
        /// Offending amount.
        amount: Decimal,
    },

    /// Line references an account missing from the chart.
    #[error("Account {account_id} does not exist")]
    UnknownAccount {
        /// The account ID.
        account_id: AccountId,
    },

    /// Line references an inactive account.
    #[error("Account {account_number} is inactive")]
    InactiveAccount {
        /// The account ID.
        account_id: AccountId,
        /// The account number.
        account_number: String,
    },

    /// Account number is not purely numeric.
    #[error("Account number must contain digits only, got '{number}'")]
    InvalidAccountNumber {
        /// The rejected number.
        number: String,
    },

    /// Account number already used by another account.
    #[error("Account number {number} is already in use")]
    DuplicateAccountNumber {
        /// The duplicated number.
        number: String,
    },

    /// Parent account does not exist.
    #[error("Parent account {parent_id} does not exist")]
    ParentNotFound {
        /// The missing parent.
        parent_id: AccountId,
    },

    /// Account names itself as parent.
    #[error("An account cannot be its own parent")]
    SelfParent,

    /// Parent is an income statement account.
    #[error(
        "A {parent_type} account cannot be a parent; use an asset, liability or equity account"
    )]
    InvalidParentType {
        /// The parent's type.
        parent_type: AccountType,
    },
}

/// A violated rule at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Where the issue applies.
    pub location: ErrorLocation,
    /// What went wrong.
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationIssue {
    /// Form key for this issue.
    #[must_use]
    pub fn key(&self) -> String {
        self.location.key()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// All issues found for one input. Empty means valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true if no rule was violated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// All issues in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Records an entry-level issue.
    pub fn push_entry(&mut self, field: EntryField, kind: ValidationErrorKind) {
        self.issues.push(ValidationIssue {
            location: ErrorLocation::Entry { field },
            kind,
        });
    }

    /// Records a line-level issue.
    pub fn push_line(&mut self, index: usize, field: LineField, kind: ValidationErrorKind) {
        self.issues.push(ValidationIssue {
            location: ErrorLocation::Line { index, field },
            kind,
        });
    }

    /// Issues attached to the line at `index`.
    pub fn for_line(&self, index: usize) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.location.line_index() == Some(index))
    }

    /// Returns true if any issue matches `predicate`.
    pub fn any(&self, predicate: impl Fn(&ValidationErrorKind) -> bool) -> bool {
        self.issues.iter().any(|issue| predicate(&issue.kind))
    }

    /// Renders the report as the dashboard's `{key: message}` map.
    ///
    /// If two issues share a key the first one wins.
    #[must_use]
    pub fn to_field_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for issue in &self.issues {
            map.entry(issue.key()).or_insert_with(|| issue.message());
        }
        map
    }

    /// Converts into a `Result`, `Ok` when valid.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.key(), issue.kind)?;
        }
        Ok(())
    }
}

/// Validates a draft journal entry on its own.
///
/// Checks the description, the line count, the balance law (within one
/// cent) and every line's account and amounts. Pure; never fails.
#[must_use]
pub fn validate_entry(entry: &JournalEntry) -> ValidationReport {
    let mut report = ValidationReport::default();

    if entry.description.trim().is_empty() {
        report.push_entry(
            EntryField::Description,
            ValidationErrorKind::MissingField {
                field: EntryField::Description,
            },
        );
    }

    if entry.lines.len() < 2 {
        report.push_entry(
            EntryField::Lines,
            ValidationErrorKind::InsufficientLines {
                count: entry.lines.len(),
            },
        );
    }

    match EntryTotals::from_lines(&entry.lines) {
        None => report.push_entry(EntryField::Balance, ValidationErrorKind::AmountOutOfRange),
        Some(totals) if !totals.is_balanced => report.push_entry(
            EntryField::Balance,
            ValidationErrorKind::Unbalanced {
                total_debit: totals.total_debit,
                total_credit: totals.total_credit,
            },
        ),
        Some(_) => {}
    }

    for (index, line) in entry.lines.iter().enumerate() {
        validate_line(index, line, &mut report);
    }

    tracing::debug!(
        entry_id = %entry.id,
        lines = entry.lines.len(),
        issues = report.len(),
        "validated journal entry"
    );

    report
}

fn validate_line(index: usize, line: &JournalLine, report: &mut ValidationReport) {
    if line.account().is_none() {
        report.push_line(index, LineField::Account, ValidationErrorKind::MissingAccount);
    }

    if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
        report.push_line(index, LineField::Amount, ValidationErrorKind::AmbiguousAmount);
    }

    if line.debit.is_zero() && line.credit.is_zero() {
        report.push_line(index, LineField::Amount, ValidationErrorKind::ZeroAmount);
    }

    if line.debit < Decimal::ZERO {
        report.push_line(
            index,
            LineField::Debit,
            ValidationErrorKind::NegativeAmount {
                side: EntryType::Debit,
                amount: line.debit,
            },
        );
    }

    if line.credit < Decimal::ZERO {
        report.push_line(
            index,
            LineField::Credit,
            ValidationErrorKind::NegativeAmount {
                side: EntryType::Credit,
                amount: line.credit,
            },
        );
    }
}

/// Validates an entry and checks every selected account against the chart.
///
/// Adds `UnknownAccount` / `InactiveAccount` issues on top of
/// [`validate_entry`].
#[must_use]
pub fn validate_against_chart(entry: &JournalEntry, chart: &ChartOfAccounts) -> ValidationReport {
    let mut report = validate_entry(entry);

    for (index, line) in entry.lines.iter().enumerate() {
        let Some(account_id) = line.account() else {
            continue;
        };
        match chart.get(account_id) {
            None => report.push_line(
                index,
                LineField::Account,
                ValidationErrorKind::UnknownAccount { account_id },
            ),
            Some(account) if !account.is_active => report.push_line(
                index,
                LineField::Account,
                ValidationErrorKind::InactiveAccount {
                    account_id,
                    account_number: account.number.clone(),
                },
            ),
            Some(_) => {}
        }
    }

    report
}
