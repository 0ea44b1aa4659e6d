//! Journal entry lifecycle and numbering.
//!
//! draft -> posted (via posting), draft -> cancelled. Nothing returns to draft.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::error::StateError;
use super::types::{EntryStatus, JournalEntry};

impl JournalEntry {
    /// Fails unless the entry is still a draft.
    pub fn ensure_editable(&self) -> Result<(), StateError> {
        self.ensure_draft("edit")
    }

    /// Only drafts can be deleted.
    pub fn ensure_deletable(&self) -> Result<(), StateError> {
        self.ensure_draft("delete")
    }

    /// Abandons a draft. Cancelled entries never affect balances.
    pub fn cancel(&mut self) -> Result<(), StateError> {
        self.ensure_draft("cancel")?;
        self.status = EntryStatus::Cancelled;
        Ok(())
    }

    pub(crate) fn ensure_draft(&self, action: &'static str) -> Result<(), StateError> {
        match self.status {
            EntryStatus::Draft => Ok(()),
            EntryStatus::Posted if action == "post" => Err(StateError::AlreadyPosted {
                entry_id: self.id,
                entry_number: self.entry_number.clone(),
            }),
            status => Err(StateError::InvalidState {
                entry_id: self.id,
                status,
                action,
            }),
        }
    }
}

/// Generates unique entry numbers of the form `JE-2026-000042`.
///
/// Numbering restarts at 1 each calendar year of the entry date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNumberSequence {
    prefix: String,
    last_by_year: BTreeMap<i32, u64>,
}

impl Default for EntryNumberSequence {
    fn default() -> Self {
        Self::new("JE")
    }
}

impl EntryNumberSequence {
    /// Starts an empty sequence.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_by_year: BTreeMap::new(),
        }
    }

    /// Continues after the highest existing number per year.
    ///
    /// Numbers with another prefix or an unparseable shape are ignored.
    #[must_use]
    pub fn resume<'a>(
        prefix: impl Into<String>,
        existing: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut sequence = Self::new(prefix);
        for number in existing {
            sequence.observe(number);
        }
        sequence
    }

    /// Records a number issued elsewhere so it is never generated again.
    pub fn observe(&mut self, number: &str) {
        if let Some((year, seq)) = self.parse(number) {
            let last = self.last_by_year.entry(year).or_insert(0);
            *last = (*last).max(seq);
        }
    }

    /// Returns the next number for an entry dated `date`.
    pub fn next_for(&mut self, date: NaiveDate) -> String {
        let last = self.last_by_year.entry(date.year()).or_insert(0);
        *last += 1;
        let seq = *last;
        format!("{}-{}-{seq:06}", self.prefix, date.year())
    }

    /// Gives `entry` a number if it has none, otherwise observes its number.
    pub fn assign(&mut self, entry: &mut JournalEntry) {
        if entry.entry_number.trim().is_empty() {
            entry.entry_number = self.next_for(entry.entry_date);
        } else {
            self.observe(&entry.entry_number);
        }
    }

    fn parse(&self, number: &str) -> Option<(i32, u64)> {
        let rest = number.strip_prefix(self.prefix.as_str())?.strip_prefix('-')?;
        let (year, seq) = rest.split_once('-')?;
        Some((year.parse().ok()?, seq.parse().ok()?))
    }
}
