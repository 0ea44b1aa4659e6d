//! Posting journal entries to account balances.
//!
//! Posting is split in two phases:
//! 1. [`PostingEngine::prepare`] checks the entry and computes every balance
//!    change without touching anything.
//! 2. A [`LedgerStore`] commits the resulting [`PostingPlan`] together with the
//!    status transition, or not at all.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, UserId};
use tracing::{debug, info, warn};

use super::chart::ChartOfAccounts;
use super::entry::EntryNumberSequence;
use super::error::{LedgerError, StateError};
use super::types::{Account, EntryStatus, JournalEntry, JournalLine, NormalBalance};
use super::validation::{
    LineField, ValidationErrorKind, ValidationReport, validate_against_chart,
};

/// Effect of one journal line on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Index of the originating line.
    pub line_index: usize,
    /// Account affected.
    pub account_id: AccountId,
    /// Account number, for logs and output.
    pub account_number: String,
    /// Polarity used to sign the change.
    pub normal_balance: NormalBalance,
    /// Debit amount of the line.
    pub debit: Decimal,
    /// Credit amount of the line.
    pub credit: Decimal,
    /// Signed change in the account's own polarity.
    pub change: Decimal,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub new_balance: Decimal,
}

/// Every balance change a posting will make, computed up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingPlan {
    /// Entry being posted.
    pub entry_id: JournalEntryId,
    /// Entry number.
    pub entry_number: String,
    /// One delta per line, in line order.
    pub deltas: Vec<BalanceDelta>,
    /// Who posts.
    pub posted_by: UserId,
    /// Posting time.
    pub posted_at: DateTime<Utc>,
}

impl PostingPlan {
    /// Sum of all changes expressed in debit polarity.
    ///
    /// Zero for a balanced entry: debits add, credits subtract.
    #[must_use]
    pub fn net_signed_delta(&self) -> Decimal {
        self.deltas
            .iter()
            .map(|d| d.normal_balance.to_debit_polarity(d.change))
            .sum()
    }

    /// Final balance of each touched account.
    #[must_use]
    pub fn resulting_balances(&self) -> BTreeMap<AccountId, Decimal> {
        self.deltas
            .iter()
            .map(|d| (d.account_id, d.new_balance))
            .collect()
    }

    /// Balance each touched account must have when the plan is committed.
    #[must_use]
    pub fn expected_balances(&self) -> BTreeMap<AccountId, Decimal> {
        let mut expected = BTreeMap::new();
        for delta in &self.deltas {
            expected
                .entry(delta.account_id)
                .or_insert(delta.previous_balance);
        }
        expected
    }

    /// Returns true if `lines` are exactly the lines this plan was computed from.
    #[must_use]
    pub fn matches_lines(&self, lines: &[JournalLine]) -> bool {
        lines.len() == self.deltas.len()
            && self.deltas.iter().all(|delta| {
                lines.get(delta.line_index).is_some_and(|line| {
                    line.account() == Some(delta.account_id)
                        && line.debit == delta.debit
                        && line.credit == delta.credit
                })
            })
    }

    /// Applies the plan to `chart` and marks `entry` posted.
    ///
    /// All checks run before the first write, so on error neither argument
    /// has changed.
    pub fn apply(
        &self,
        chart: &mut ChartOfAccounts,
        entry: &mut JournalEntry,
    ) -> Result<(), LedgerError> {
        if entry.id != self.entry_id {
            return Err(StateError::EntryNotFound(self.entry_id).into());
        }
        entry.ensure_draft("post")?;

        if !self.matches_lines(&entry.lines) {
            warn!(
                entry_number = %entry.entry_number,
                "journal entry lines changed since posting was prepared"
            );
            return Err(StateError::EntryModified { entry_id: entry.id }.into());
        }

        for (account_id, expected) in self.expected_balances() {
            let account = chart
                .get(account_id)
                .ok_or(StateError::AccountNotFound(account_id))?;
            if account.balance != expected {
                warn!(
                    account_number = %account.number,
                    expected = %expected,
                    actual = %account.balance,
                    "account balance changed since posting was prepared"
                );
                return Err(StateError::ConcurrentModification { account_id }.into());
            }
        }

        for (account_id, balance) in self.resulting_balances() {
            if let Some(account) = chart.get_mut(account_id) {
                account.balance = balance;
            }
        }

        entry.status = EntryStatus::Posted;
        entry.posted_by = Some(self.posted_by);
        entry.posted_at = Some(self.posted_at);
        Ok(())
    }
}

/// Stateless posting rules.
pub struct PostingEngine;

impl PostingEngine {
    /// Checks `entry` and computes its balance changes without mutating anything.
    ///
    /// Fails with `AlreadyPosted` or `InvalidState` for non-drafts, and with the
    /// full validation report (chart checks included) for invalid input or a
    /// resulting balance outside the range of `Decimal`.
    pub fn prepare(
        entry: &JournalEntry,
        chart: &ChartOfAccounts,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> Result<PostingPlan, LedgerError> {
        entry.ensure_draft("post")?;
        validate_against_chart(entry, chart).into_result()?;

        // Lines hitting the same account accumulate on the staged balance
        let mut staged: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        let mut deltas = Vec::with_capacity(entry.lines.len());
        let mut out_of_range = ValidationReport::default();
        for (line_index, line, account) in resolve_lines(entry, chart) {
            let previous_balance = *staged.entry(account.id).or_insert(account.balance);
            let normal_balance = account.normal_balance();
            let change = normal_balance.balance_change(line.debit, line.credit);
            let Some(new_balance) = previous_balance.checked_add(change) else {
                warn!(
                    account_number = %account.number,
                    line_index,
                    "posting would overflow the account balance"
                );
                out_of_range.push_line(
                    line_index,
                    LineField::Amount,
                    ValidationErrorKind::AmountOutOfRange,
                );
                continue;
            };
            staged.insert(account.id, new_balance);

            deltas.push(BalanceDelta {
                line_index,
                account_id: account.id,
                account_number: account.number.clone(),
                normal_balance,
                debit: line.debit,
                credit: line.credit,
                change,
                previous_balance,
                new_balance,
            });
        }
        out_of_range.into_result()?;

        Ok(PostingPlan {
            entry_id: entry.id,
            entry_number: entry.entry_number.clone(),
            deltas,
            posted_by,
            posted_at,
        })
    }

    /// Prepares and commits the posting of a stored entry.
    pub fn post<S: LedgerStore + ?Sized>(
        store: &mut S,
        entry_id: JournalEntryId,
        posted_by: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = store
            .entry(entry_id)
            .ok_or(StateError::EntryNotFound(entry_id))?;
        let plan = Self::prepare(entry, store.chart(), posted_by, Utc::now())?;
        let posted = store.commit(&plan)?;

        info!(
            entry_number = %posted.entry_number,
            lines = plan.deltas.len(),
            "journal entry posted"
        );
        Ok(posted)
    }
}

/// Pairs each line with its account. Only called after chart validation.
fn resolve_lines<'a>(
    entry: &'a JournalEntry,
    chart: &'a ChartOfAccounts,
) -> impl Iterator<Item = (usize, &'a JournalLine, &'a Account)> {
    entry.lines.iter().enumerate().filter_map(|(index, line)| {
        line.account()
            .and_then(|id| chart.get(id))
            .map(|account| (index, line, account))
    })
}

/// Storage for accounts and entries.
///
/// `commit` must apply every balance change and the status transition of a
/// plan as one unit: either all of them persist or none do.
pub trait LedgerStore {
    /// Current chart of accounts.
    fn chart(&self) -> &ChartOfAccounts;

    /// Looks up an entry.
    fn entry(&self, id: JournalEntryId) -> Option<&JournalEntry>;

    /// Commits a prepared plan and returns the posted entry.
    fn commit(&mut self, plan: &PostingPlan) -> Result<JournalEntry, LedgerError>;
}

/// In-memory ledger: a chart of accounts plus its journal.
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    chart: ChartOfAccounts,
    entries: BTreeMap<JournalEntryId, JournalEntry>,
    numbers: EntryNumberSequence,
}

impl AccountBook {
    /// Creates a book with no entries.
    #[must_use]
    pub fn new(chart: ChartOfAccounts, numbers: EntryNumberSequence) -> Self {
        Self {
            chart,
            entries: BTreeMap::new(),
            numbers,
        }
    }

    /// Loads persisted accounts and entries.
    ///
    /// Numbering continues after the highest existing number with `prefix`.
    /// Entries stored without a number get one, in date order.
    #[must_use]
    pub fn load(
        accounts: impl IntoIterator<Item = Account>,
        entries: impl IntoIterator<Item = JournalEntry>,
        prefix: &str,
    ) -> Self {
        let mut entries: BTreeMap<_, _> = entries.into_iter().map(|e| (e.id, e)).collect();
        let mut numbers = EntryNumberSequence::resume(
            prefix,
            entries.values().map(|e| e.entry_number.as_str()),
        );

        let mut unnumbered: Vec<_> = entries
            .values()
            .filter(|e| e.entry_number.trim().is_empty())
            .map(|e| (e.entry_date, e.created_at, e.id))
            .collect();
        unnumbered.sort_unstable();
        for (_, _, id) in unnumbered {
            if let Some(entry) = entries.get_mut(&id) {
                numbers.assign(entry);
                debug!(entry_number = %entry.entry_number, "numbered loaded entry");
            }
        }

        Self {
            chart: accounts.into_iter().collect(),
            entries,
            numbers,
        }
    }

    /// Mutable chart, for account maintenance.
    pub fn chart_mut(&mut self) -> &mut ChartOfAccounts {
        &mut self.chart
    }

    /// All entries in ID (creation) order.
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.values()
    }

    /// Entries that count towards balances.
    pub fn posted_entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .values()
            .filter(|e| e.status.contributes_to_balances())
    }

    /// Stores a new draft, numbering it if needed.
    ///
    /// Drafts may be incomplete; validation happens when posting. The ID and
    /// any supplied number must not belong to a stored entry.
    pub fn add_draft(&mut self, mut entry: JournalEntry) -> Result<JournalEntryId, LedgerError> {
        entry.ensure_editable()?;
        if self.entries.contains_key(&entry.id) {
            return Err(StateError::DuplicateEntry { entry_id: entry.id }.into());
        }
        let number = entry.entry_number.trim();
        if !number.is_empty() && self.entries.values().any(|e| e.entry_number.trim() == number) {
            return Err(StateError::DuplicateEntryNumber {
                entry_number: number.to_string(),
            }
            .into());
        }

        self.numbers.assign(&mut entry);
        let id = entry.id;
        self.entries.insert(id, entry);
        Ok(id)
    }

    /// Replaces a draft's content. Number and creation metadata are kept.
    pub fn update_draft(&mut self, mut entry: JournalEntry) -> Result<(), LedgerError> {
        let existing = self
            .entries
            .get_mut(&entry.id)
            .ok_or(StateError::EntryNotFound(entry.id))?;
        existing.ensure_editable()?;

        entry.entry_number = existing.entry_number.clone();
        entry.created_by = existing.created_by;
        entry.created_at = existing.created_at;
        entry.status = EntryStatus::Draft;
        entry.posted_by = None;
        entry.posted_at = None;
        *existing = entry;
        Ok(())
    }

    /// Deletes a draft.
    pub fn delete_draft(&mut self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        let entry = self.entries.get(&id).ok_or(StateError::EntryNotFound(id))?;
        entry.ensure_deletable()?;
        self.entries
            .remove(&id)
            .ok_or_else(|| StateError::EntryNotFound(id).into())
    }

    /// Cancels a draft.
    pub fn cancel(&mut self, id: JournalEntryId) -> Result<(), LedgerError> {
        self.entries
            .get_mut(&id)
            .ok_or(StateError::EntryNotFound(id))?
            .cancel()?;
        Ok(())
    }

    /// Posts a draft.
    pub fn post(
        &mut self,
        id: JournalEntryId,
        posted_by: UserId,
    ) -> Result<JournalEntry, LedgerError> {
        PostingEngine::post(self, id, posted_by)
    }
}

impl LedgerStore for AccountBook {
    fn chart(&self) -> &ChartOfAccounts {
        &self.chart
    }

    fn entry(&self, id: JournalEntryId) -> Option<&JournalEntry> {
        self.entries.get(&id)
    }

    fn commit(&mut self, plan: &PostingPlan) -> Result<JournalEntry, LedgerError> {
        let entry = self
            .entries
            .get_mut(&plan.entry_id)
            .ok_or(StateError::EntryNotFound(plan.entry_id))?;
        plan.apply(&mut self.chart, entry)?;
        Ok(entry.clone())
    }
}
