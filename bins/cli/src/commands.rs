//! Subcommand handlers.
//!
//! Handlers return JSON for stdout plus a success flag; only I/O problems
//! are `Err`. Rejected entries are reported as data.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tally_core::ledger::{
    AccountBook, EntryStatus, EntryTotals, JournalEntry, LedgerError, LedgerStore, PostingEngine,
    ValidationReport, validate_against_chart,
};
use tally_core::reports::{
    LedgerSnapshot, ReportError, ReportOptions, ReportPeriod, ReportService,
};
use tally_shared::AppError;
use tally_shared::types::{JournalEntryId, UserId};
use tracing::debug;

use crate::ledger_file::find_entry;

/// Result of running a command.
#[derive(Debug)]
pub struct Outcome {
    /// Document printed to stdout.
    pub output: Value,
    /// Whether the command achieved what was asked.
    pub success: bool,
    /// Whether the book changed and should be saved.
    pub changed: bool,
}

impl Outcome {
    fn ok(output: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            output: serde_json::to_value(output)?,
            success: true,
            changed: false,
        })
    }

    fn failed(output: impl Serialize) -> anyhow::Result<Self> {
        Ok(Self {
            output: serde_json::to_value(output)?,
            success: false,
            changed: false,
        })
    }
}

#[derive(Serialize)]
struct EntryCheck {
    entry_id: JournalEntryId,
    entry_number: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    totals: Option<EntryTotals>,
    errors: BTreeMap<String, String>,
    issues: ValidationReport,
}

impl EntryCheck {
    fn new(entry: &JournalEntry, report: ValidationReport) -> Self {
        Self {
            entry_id: entry.id,
            entry_number: entry.entry_number.clone(),
            valid: report.is_valid(),
            totals: entry.totals(),
            errors: report.to_field_map(),
            issues: report,
        }
    }
}

/// Failure document: the specific code plus its application-wide category.
#[derive(Serialize)]
struct ErrorBody {
    error_code: &'static str,
    category: &'static str,
    recoverable: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl ErrorBody {
    fn new(
        error_code: &'static str,
        app: &AppError,
        errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        Self {
            error_code,
            category: app.error_code(),
            recoverable: app.is_recoverable(),
            message: app.to_string(),
            errors,
        }
    }
}

impl From<LedgerError> for ErrorBody {
    fn from(err: LedgerError) -> Self {
        let error_code = err.error_code();
        let errors = err.validation_report().map(ValidationReport::to_field_map);
        Self::new(error_code, &AppError::from(err), errors)
    }
}

impl From<ReportError> for ErrorBody {
    fn from(err: ReportError) -> Self {
        Self::new(err.error_code(), &AppError::from(err), None)
    }
}

fn not_found(key: &str) -> ErrorBody {
    let app = AppError::NotFound(format!("No journal entry matches {key}"));
    ErrorBody::new("ENTRY_NOT_FOUND", &app, None)
}

/// Validates one entry, or every draft when `key` is `None`.
pub fn validate(book: &AccountBook, key: Option<&str>) -> anyhow::Result<Outcome> {
    let entries: Vec<&JournalEntry> = match key {
        Some(key) => match find_entry(book, key).and_then(|id| book.entry(id)) {
            Some(entry) => vec![entry],
            None => return Outcome::failed(not_found(key)),
        },
        None => book
            .entries()
            .filter(|e| e.status == EntryStatus::Draft)
            .collect(),
    };

    let checks: Vec<EntryCheck> = entries
        .into_iter()
        .map(|entry| EntryCheck::new(entry, validate_against_chart(entry, book.chart())))
        .collect();
    let valid = checks.iter().all(|c| c.valid);
    debug!(entries = checks.len(), valid, "validated entries");

    if valid {
        Outcome::ok(checks)
    } else {
        Outcome::failed(checks)
    }
}

/// Posts an entry, or with `dry_run` only shows the balance changes it would make.
pub fn post(
    book: &mut AccountBook,
    key: &str,
    posted_by: UserId,
    dry_run: bool,
) -> anyhow::Result<Outcome> {
    let Some(id) = find_entry(book, key) else {
        return Outcome::failed(not_found(key));
    };

    if dry_run {
        let Some(entry) = book.entry(id) else {
            return Outcome::failed(not_found(key));
        };
        return match PostingEngine::prepare(entry, book.chart(), posted_by, Utc::now()) {
            Ok(plan) => Outcome::ok(plan),
            Err(err) => Outcome::failed(ErrorBody::from(err)),
        };
    }

    match book.post(id, posted_by) {
        Ok(entry) => {
            let mut outcome = Outcome::ok(entry)?;
            outcome.changed = true;
            Ok(outcome)
        }
        Err(err) => Outcome::failed(ErrorBody::from(err)),
    }
}

/// Stored balances, or a replay of posted entries up to `as_of`.
fn snapshot(book: &AccountBook, as_of: Option<NaiveDate>) -> (LedgerSnapshot, NaiveDate) {
    match as_of {
        Some(date) => (
            LedgerSnapshot::replay(book.chart(), book.entries(), ReportPeriod::as_of(date)),
            date,
        ),
        None => (
            LedgerSnapshot::from_accounts(book.chart().iter()),
            Utc::now().date_naive(),
        ),
    }
}

/// Prints the trial balance.
pub fn trial_balance(
    book: &AccountBook,
    as_of: Option<NaiveDate>,
    options: &ReportOptions,
) -> anyhow::Result<Outcome> {
    let (snapshot, date) = snapshot(book, as_of);
    Outcome::ok(ReportService::trial_balance(&snapshot, date, options))
}

/// Prints the income statement for an inclusive date range.
pub fn income_statement(
    book: &AccountBook,
    start: NaiveDate,
    end: NaiveDate,
    options: &ReportOptions,
) -> anyhow::Result<Outcome> {
    let period = match ReportPeriod::range(start, end) {
        Ok(period) => period,
        Err(err) => return Outcome::failed(ErrorBody::from(err)),
    };
    let snapshot = LedgerSnapshot::replay(book.chart(), book.entries(), period);
    match ReportService::income_statement(&snapshot, start, end, options) {
        Ok(statement) => Outcome::ok(statement),
        Err(err) => Outcome::failed(ErrorBody::from(err)),
    }
}

/// Prints the balance sheet. An integrity warning still counts as success.
pub fn balance_sheet(
    book: &AccountBook,
    as_of: Option<NaiveDate>,
    options: &ReportOptions,
) -> anyhow::Result<Outcome> {
    let (snapshot, date) = snapshot(book, as_of);
    Outcome::ok(ReportService::balance_sheet(&snapshot, date, options))
}
