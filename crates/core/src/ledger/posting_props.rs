//! Property-based tests for posting.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, UserId};

use super::chart::ChartOfAccounts;
use super::entry::EntryNumberSequence;
use super::posting::{AccountBook, LedgerStore, PostingEngine};
use super::types::{Account, AccountType, JournalEntry, JournalLine};

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

/// A chart of `types.len()` accounts with starting balances.
fn chart_accounts(types: &[AccountType], openings: &[Decimal]) -> Vec<Account> {
    types
        .iter()
        .zip(openings)
        .enumerate()
        .map(|(i, (&account_type, &opening))| {
            Account::new((1000 + i).to_string(), format!("Account {i}"), account_type)
                .with_balance(opening)
        })
        .collect()
}

/// Balanced lines: each amount is debited to one account and credited to another.
fn balanced_lines(ids: &[AccountId], legs: &[(usize, usize, Decimal)]) -> Vec<JournalLine> {
    legs.iter()
        .flat_map(|&(from, to, amount)| {
            [
                JournalLine::debit(ids[from % ids.len()], amount),
                JournalLine::credit(ids[to % ids.len()], amount),
            ]
        })
        .collect()
}

fn draft(lines: Vec<JournalLine>) -> JournalEntry {
    JournalEntry::draft(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(), "Generated", lines)
}

fn legs() -> impl Strategy<Value = Vec<(usize, usize, Decimal)>> {
    prop::collection::vec((0usize..8, 0usize..8, positive_amount()), 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balance changes of a balanced entry cancel out in debit polarity.
    #[test]
    fn prop_net_signed_delta_is_zero(
        types in prop::collection::vec(account_type(), 2..6),
        legs in legs(),
    ) {
        let openings = vec![Decimal::ZERO; types.len()];
        let accounts = chart_accounts(&types, &openings);
        let ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
        let chart: ChartOfAccounts = accounts.into_iter().collect();

        let entry = draft(balanced_lines(&ids, &legs));
        let plan = PostingEngine::prepare(&entry, &chart, UserId::new(), Utc::now()).unwrap();

        prop_assert_eq!(plan.deltas.len(), entry.lines.len());
        prop_assert_eq!(plan.net_signed_delta(), Decimal::ZERO);
    }

    /// Each account moves by its debits minus credits, in its own polarity.
    #[test]
    fn prop_balance_follows_normal_side(
        types in prop::collection::vec(account_type(), 2..6),
        opening_cents in prop::collection::vec(-100_000i64..100_000i64, 6),
        legs in legs(),
    ) {
        let openings: Vec<_> = opening_cents.iter().map(|&c| Decimal::new(c, 2)).collect();
        let accounts = chart_accounts(&types, &openings);
        let ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
        let mut book = AccountBook::new(
            accounts.iter().cloned().collect(),
            EntryNumberSequence::default(),
        );

        let entry = draft(balanced_lines(&ids, &legs));
        let lines = entry.lines.clone();
        let id = book.add_draft(entry).unwrap();
        book.post(id, UserId::new()).unwrap();

        for account in &accounts {
            let (debits, credits) = lines
                .iter()
                .filter(|l| l.account_id == Some(account.id))
                .fold((Decimal::ZERO, Decimal::ZERO), |(d, c), l| (d + l.debit, c + l.credit));
            let change = account.normal_balance().balance_change(debits, credits);
            let expected = account.balance + change;
            prop_assert_eq!(book.chart().get(account.id).unwrap().balance, expected);
        }
    }

    /// Posting the same entry again fails and changes nothing.
    #[test]
    fn prop_second_post_is_rejected(
        types in prop::collection::vec(account_type(), 2..6),
        legs in legs(),
    ) {
        let openings = vec![Decimal::ZERO; types.len()];
        let accounts = chart_accounts(&types, &openings);
        let ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
        let mut book = AccountBook::new(
            accounts.into_iter().collect(),
            EntryNumberSequence::default(),
        );

        let id = book.add_draft(draft(balanced_lines(&ids, &legs))).unwrap();
        book.post(id, UserId::new()).unwrap();
        let after_first = book.chart().clone();

        let err = book.post(id, UserId::new()).unwrap_err();
        prop_assert_eq!(err.error_code(), "ALREADY_POSTED");
        prop_assert_eq!(book.chart(), &after_first);
    }
}
