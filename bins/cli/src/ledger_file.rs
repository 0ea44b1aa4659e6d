//! JSON ledger file: `{ "accounts": [...], "entries": [...] }`.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{Account, AccountBook, JournalEntry, LedgerStore};
use tally_shared::types::JournalEntryId;

/// On-disk representation of a ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerFile {
    /// Chart of accounts with current balances.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Journal entries in any status.
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
}

impl LedgerFile {
    /// Reads and parses a ledger file.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse ledger file {}", path.display()))
    }

    /// Writes the ledger as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to serialize ledger")?;
        fs::write(path, text + "\n")
            .with_context(|| format!("failed to write ledger file {}", path.display()))
    }

    /// Loads the ledger into an in-memory book.
    #[must_use]
    pub fn into_book(self, entry_prefix: &str) -> AccountBook {
        AccountBook::load(self.accounts, self.entries, entry_prefix)
    }

    /// Captures a book's current state.
    #[must_use]
    pub fn from_book(book: &AccountBook) -> Self {
        let mut accounts: Vec<Account> = book.chart().iter().cloned().collect();
        accounts.sort_by(|a, b| a.number.cmp(&b.number));
        Self {
            accounts,
            entries: book.entries().cloned().collect(),
        }
    }
}

/// Finds an entry by number (`JE-2026-000001`) or ID.
#[must_use]
pub fn find_entry(book: &AccountBook, key: &str) -> Option<JournalEntryId> {
    let by_id = key.parse::<JournalEntryId>().ok();
    book.entries()
        .find(|e| e.entry_number == key || Some(e.id) == by_id)
        .map(|e| e.id)
}
