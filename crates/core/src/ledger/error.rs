//! Ledger error types.
//!
//! Validation failures and state failures are kept apart so callers can
//! tell "fix your input" from "this entry was already posted".

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::EntryStatus;
use super::validation::ValidationReport;

/// Lifecycle and chart-of-accounts state errors.
///
/// Recoverable by refetching state rather than editing input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Entry has already been posted; posting again would double-apply balances.
    #[error("Journal entry {entry_number} is already posted")]
    AlreadyPosted {
        /// The entry ID.
        entry_id: JournalEntryId,
        /// The entry number.
        entry_number: String,
    },

    /// The action is not allowed in the entry's current status.
    #[error("Cannot {action} journal entry {entry_id} in {status} status")]
    InvalidState {
        /// The entry ID.
        entry_id: JournalEntryId,
        /// Current status.
        status: EntryStatus,
        /// Attempted action.
        action: &'static str,
    },

    /// Account still carries a balance.
    #[error("Account {account_id} has a non-zero balance of {balance}")]
    NonZeroBalance {
        /// The account ID.
        account_id: AccountId,
        /// Current balance.
        balance: Decimal,
    },

    /// Account still groups sub-accounts.
    #[error("Account {0} has child accounts")]
    HasChildAccounts(AccountId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// An entry with this ID is already stored.
    #[error("Journal entry {entry_id} already exists")]
    DuplicateEntry {
        /// The entry ID.
        entry_id: JournalEntryId,
    },

    /// Entry number already used by another entry.
    #[error("Entry number {entry_number} is already in use")]
    DuplicateEntryNumber {
        /// The duplicated number.
        entry_number: String,
    },

    /// Entry lines changed between preparing and committing a posting.
    #[error("Journal entry {entry_id} was edited after posting was prepared, please retry")]
    EntryModified {
        /// The entry ID.
        entry_id: JournalEntryId,
    },

    /// Account balance changed between preparing and committing a posting.
    #[error("Account {account_id} changed concurrently, please retry")]
    ConcurrentModification {
        /// The account ID.
        account_id: AccountId,
    },
}

/// Errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input failed validation; the report lists every violated rule.
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// Operation not allowed in the current state.
    #[error(transparent)]
    State(#[from] StateError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::State(state) => match state {
                StateError::AlreadyPosted { .. } => "ALREADY_POSTED",
                StateError::InvalidState { .. } => "INVALID_STATE",
                StateError::NonZeroBalance { .. } => "NON_ZERO_BALANCE",
                StateError::HasChildAccounts(_) => "HAS_CHILD_ACCOUNTS",
                StateError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
                StateError::EntryNotFound(_) => "ENTRY_NOT_FOUND",
                StateError::DuplicateEntry { .. } => "DUPLICATE_ENTRY",
                StateError::DuplicateEntryNumber { .. } => "DUPLICATE_ENTRY_NUMBER",
                StateError::EntryModified { .. } => "ENTRY_MODIFIED",
                StateError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            },
        }
    }

    /// Returns true for field-scoped input errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the same request may succeed when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::State(
                StateError::ConcurrentModification { .. } | StateError::EntryModified { .. }
            )
        )
    }

    /// Returns the validation report, if this is a validation error.
    #[must_use]
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            Self::State(_) => None,
        }
    }
}

impl From<ValidationReport> for LedgerError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(report) => Self::Validation(report.to_string()),
            LedgerError::State(
                state @ (StateError::AccountNotFound(_) | StateError::EntryNotFound(_)),
            ) => Self::NotFound(state.to_string()),
            LedgerError::State(
                state @ (StateError::DuplicateEntry { .. }
                | StateError::DuplicateEntryNumber { .. }
                | StateError::EntryModified { .. }
                | StateError::ConcurrentModification { .. }),
            ) => Self::Conflict(state.to_string()),
            LedgerError::State(state) => Self::BusinessRule(state.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        let err: LedgerError = StateError::AlreadyPosted {
            entry_id: JournalEntryId::new(),
            entry_number: "JE-2026-000001".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "ALREADY_POSTED");
        assert!(!err.is_validation());

        let err = LedgerError::Validation(ValidationReport::default());
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(err.is_validation());
        assert!(!err.is_retryable());

        let err: LedgerError = StateError::ConcurrentModification {
            account_id: AccountId::new(),
        }
        .into();
        assert!(err.is_retryable());

        let err: LedgerError = StateError::EntryModified {
            entry_id: JournalEntryId::new(),
        }
        .into();
        assert_eq!(err.error_code(), "ENTRY_MODIFIED");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = StateError::AlreadyPosted {
            entry_id: JournalEntryId::new(),
            entry_number: "JE-2026-000007".to_string(),
        };
        assert_eq!(err.to_string(), "Journal entry JE-2026-000007 is already posted");

        let id = AccountId::new();
        let err = StateError::NonZeroBalance {
            account_id: id,
            balance: dec!(12.50),
        };
        assert_eq!(
            err.to_string(),
            format!("Account {id} has a non-zero balance of 12.50")
        );
    }

    #[test]
    fn test_into_app_error() {
        let app = AppError::from(LedgerError::from(StateError::EntryNotFound(
            JournalEntryId::new(),
        )));
        assert_eq!(app.error_code(), "NOT_FOUND");

        let app = AppError::from(LedgerError::from(StateError::HasChildAccounts(
            AccountId::new(),
        )));
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = LedgerError::from(StateError::DuplicateEntryNumber {
            entry_number: "JE-2026-000001".to_string(),
        })
        .into();
        assert_eq!(app.error_code(), "CONFLICT");
        assert!(app.is_recoverable());

        let app: AppError = LedgerError::Validation(ValidationReport::default()).into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");
    }
}
