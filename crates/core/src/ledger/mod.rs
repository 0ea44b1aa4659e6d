//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account and journal entry domain types
//! - Normal-balance polarity rules
//! - Chart of accounts rules
//! - Entry validation (exhaustive, field-scoped)
//! - Entry lifecycle and numbering
//! - Atomic posting of entries to account balances

pub mod balance;
pub mod chart;
pub mod entry;
pub mod error;
pub mod posting;
pub mod types;
pub mod validation;

#[cfg(test)]
mod posting_props;
#[cfg(test)]
mod validation_props;

pub use chart::ChartOfAccounts;
pub use entry::EntryNumberSequence;
pub use error::{LedgerError, StateError};
pub use posting::{AccountBook, BalanceDelta, LedgerStore, PostingEngine, PostingPlan};
pub use types::{
    Account, AccountType, EntryStatus, EntryTotals, EntryType, JournalEntry, JournalLine,
    NormalBalance,
};
pub use validation::{
    EntryField, ErrorLocation, LineField, ValidationErrorKind, ValidationIssue, ValidationReport,
    validate_against_chart, validate_entry,
};
