//! Property-based tests for journal entry validation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, BALANCE_TOLERANCE};

use super::types::{JournalEntry, JournalLine};
use super::validation::{ValidationErrorKind, validate_entry};

/// Amounts from -1.00 to 1,000.00, zero included, at cent precision.
fn any_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        2 => Just(Decimal::ZERO),
        1 => (1i64..=100i64).prop_map(|cents| Decimal::new(-cents, 2)),
        5 => (1i64..=100_000i64).prop_map(|cents| Decimal::new(cents, 2)),
    ]
}

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn any_line() -> impl Strategy<Value = JournalLine> {
    (any::<bool>(), any_amount(), any_amount()).prop_map(|(has_account, debit, credit)| {
        JournalLine {
            account_id: has_account.then(AccountId::new),
            debit,
            credit,
            description: None,
        }
    })
}

fn any_description() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z]{1,12}"]
}

fn make_entry(description: String, lines: Vec<JournalLine>) -> JournalEntry {
    JournalEntry::draft(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(), description, lines)
}

fn line_is_well_formed(line: &JournalLine) -> bool {
    let one_side = (line.debit > Decimal::ZERO && line.credit.is_zero())
        || (line.credit > Decimal::ZERO && line.debit.is_zero());
    line.account_id.is_some() && one_side
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An entry is valid exactly when it has a description, at least two
    /// lines, balances within one cent and every line has an account and
    /// one positive side.
    #[test]
    fn prop_valid_iff_all_rules_hold(
        description in any_description(),
        lines in prop::collection::vec(any_line(), 0..5),
    ) {
        let entry = make_entry(description, lines);
        let totals = entry.totals().unwrap();

        let expected = !entry.description.trim().is_empty()
            && entry.lines.len() >= 2
            && (totals.total_debit - totals.total_credit).abs() <= BALANCE_TOLERANCE
            && entry.lines.iter().all(line_is_well_formed);

        let report = validate_entry(&entry);
        prop_assert_eq!(report.is_valid(), expected, "report: {}", report);
    }

    /// Entries built from matching debit/credit pairs always validate.
    #[test]
    fn prop_balanced_pairs_are_valid(
        amounts in prop::collection::vec(positive_amount(), 1..6),
    ) {
        let lines = amounts
            .iter()
            .flat_map(|&amount| {
                [
                    JournalLine::debit(AccountId::new(), amount),
                    JournalLine::credit(AccountId::new(), amount),
                ]
            })
            .collect();

        let report = validate_entry(&make_entry("Transfer".to_string(), lines));
        prop_assert!(report.is_valid(), "report: {}", report);
    }

    /// Imbalance beyond one cent is always reported with both totals.
    #[test]
    fn prop_imbalance_reports_totals(
        amount in positive_amount(),
        extra_cents in 2i64..10_000i64,
    ) {
        let debit = amount + Decimal::new(extra_cents, 2);
        let entry = make_entry(
            "Uneven".to_string(),
            vec![
                JournalLine::debit(AccountId::new(), debit),
                JournalLine::credit(AccountId::new(), amount),
            ],
        );

        let report = validate_entry(&entry);
        prop_assert_eq!(report.len(), 1);
        let is_unbalanced = report.any(|k| matches!(
            k,
            ValidationErrorKind::Unbalanced { total_debit, total_credit }
                if *total_debit == debit && *total_credit == amount
        ));
        prop_assert!(is_unbalanced);
        prop_assert!(report.to_field_map().contains_key("balance"));
    }

    /// Every offending line is reported, not only the first.
    #[test]
    fn prop_every_bad_line_is_reported(
        amount in positive_amount(),
        bad_count in 1usize..4,
    ) {
        let mut lines = vec![
            JournalLine::debit(AccountId::new(), amount),
            JournalLine::credit(AccountId::new(), amount),
        ];
        lines.extend((0..bad_count).map(|_| JournalLine {
            account_id: None,
            ..JournalLine::default()
        }));

        let map = validate_entry(&make_entry("Partial".to_string(), lines)).to_field_map();
        for index in 2..2 + bad_count {
            let account_key = format!("line-{index}-account");
            let amount_key = format!("line-{index}-amount");
            prop_assert!(map.contains_key(&account_key));
            prop_assert!(map.contains_key(&amount_key));
        }
    }
}
