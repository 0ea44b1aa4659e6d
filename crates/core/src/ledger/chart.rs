//! Chart of accounts rules.
//!
//! Account numbers are numeric and unique, parents must be balance-sheet
//! accounts, and an account carrying a balance can be neither deactivated
//! nor deleted.

use std::collections::BTreeMap;

use tally_shared::types::AccountId;

use super::error::{LedgerError, StateError};
use super::types::Account;
use super::validation::{EntryField, ValidationErrorKind, ValidationReport};

/// A tenant's accounts keyed by ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartOfAccounts {
    accounts: BTreeMap<AccountId, Account>,
}

impl ChartOfAccounts {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Iterates accounts in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Direct children of `parent`.
    pub fn children(&self, parent: AccountId) -> impl Iterator<Item = &Account> {
        self.accounts
            .values()
            .filter(move |a| a.parent_account_id == Some(parent))
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Checks a new or edited account against the rest of the chart.
    #[must_use]
    pub fn validate_account(&self, account: &Account) -> ValidationReport {
        let mut report = ValidationReport::default();

        if account.name.trim().is_empty() {
            report.push_entry(
                EntryField::Name,
                ValidationErrorKind::MissingField {
                    field: EntryField::Name,
                },
            );
        }

        let number = account.number.trim();
        if number.is_empty() {
            report.push_entry(
                EntryField::Number,
                ValidationErrorKind::MissingField {
                    field: EntryField::Number,
                },
            );
        } else if !number.chars().all(|c| c.is_ascii_digit()) {
            report.push_entry(
                EntryField::Number,
                ValidationErrorKind::InvalidAccountNumber {
                    number: account.number.clone(),
                },
            );
        } else if self
            .accounts
            .values()
            .any(|other| other.id != account.id && other.number.trim() == number)
        {
            report.push_entry(
                EntryField::Number,
                ValidationErrorKind::DuplicateAccountNumber {
                    number: number.to_string(),
                },
            );
        }

        if let Some(parent_id) = account.parent_account_id {
            if parent_id == account.id {
                report.push_entry(EntryField::Parent, ValidationErrorKind::SelfParent);
            } else {
                match self.accounts.get(&parent_id) {
                    None => report.push_entry(
                        EntryField::Parent,
                        ValidationErrorKind::ParentNotFound { parent_id },
                    ),
                    Some(parent) if !parent.account_type.can_be_parent() => report.push_entry(
                        EntryField::Parent,
                        ValidationErrorKind::InvalidParentType {
                            parent_type: parent.account_type,
                        },
                    ),
                    Some(_) => {}
                }
            }
        }

        report
    }

    /// Adds or replaces an account after validating it.
    ///
    /// An existing account's balance is preserved; balances only change by posting.
    pub fn upsert(&mut self, mut account: Account) -> Result<AccountId, LedgerError> {
        self.validate_account(&account).into_result()?;

        if let Some(existing) = self.accounts.get(&account.id) {
            account.balance = existing.balance;
            if existing.is_active && !account.is_active {
                ensure_can_deactivate(existing)?;
            }
        }

        let id = account.id;
        self.accounts.insert(id, account);
        Ok(id)
    }

    /// Marks an account inactive.
    pub fn deactivate(&mut self, id: AccountId) -> Result<(), StateError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(StateError::AccountNotFound(id))?;
        ensure_can_deactivate(account)?;
        account.is_active = false;
        Ok(())
    }

    /// Removes an account.
    pub fn remove(&mut self, id: AccountId) -> Result<Account, StateError> {
        let account = self.accounts.get(&id).ok_or(StateError::AccountNotFound(id))?;
        ensure_can_delete(account)?;
        if self.children(id).next().is_some() {
            return Err(StateError::HasChildAccounts(id));
        }
        self.accounts.remove(&id).ok_or(StateError::AccountNotFound(id))
    }

    /// Mutable access for committing postings.
    pub(crate) fn get_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(&id)
    }
}

impl FromIterator<Account> for ChartOfAccounts {
    /// Builds a chart from already-persisted accounts without re-validating them.
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

/// Fails if the account still carries a balance.
pub fn ensure_can_deactivate(account: &Account) -> Result<(), StateError> {
    if account.balance.is_zero() {
        Ok(())
    } else {
        Err(StateError::NonZeroBalance {
            account_id: account.id,
            balance: account.balance,
        })
    }
}

/// Fails if the account still carries a balance.
pub fn ensure_can_delete(account: &Account) -> Result<(), StateError> {
    ensure_can_deactivate(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use crate::ledger::types::AccountType;

    fn chart_with(accounts: Vec<Account>) -> ChartOfAccounts {
        accounts.into_iter().collect()
    }

    #[test]
    fn test_valid_account() {
        let chart = chart_with(vec![Account::new("1000", "Cash", AccountType::Asset)]);
        let loans = Account::new("1100", "Loans Receivable", AccountType::Asset);
        let report = chart.validate_account(&loans);
        assert!(report.is_valid());
    }

    #[rstest]
    #[case("10A0")]
    #[case("1000-1")]
    #[case("cash")]
    fn test_non_numeric_number_rejected(#[case] number: &str) {
        let chart = ChartOfAccounts::new();
        let report = chart.validate_account(&Account::new(number, "Cash", AccountType::Asset));
        assert!(report.any(|k| matches!(k, ValidationErrorKind::InvalidAccountNumber { .. })));
        assert!(report.to_field_map().contains_key("number"));
    }

    #[test]
    fn test_missing_name_and_number() {
        let chart = ChartOfAccounts::new();
        let report = chart.validate_account(&Account::new("", " ", AccountType::Asset));
        let map = report.to_field_map();
        assert_eq!(map["name"], "Name is required");
        assert_eq!(map["number"], "Number is required");
    }

    #[test]
    fn test_duplicate_number_rejected() {
        let chart = chart_with(vec![Account::new("1000", "Cash", AccountType::Asset)]);
        let petty_cash = Account::new("1000", "Petty Cash", AccountType::Asset);
        let report = chart.validate_account(&petty_cash);
        assert_eq!(report.to_field_map()["number"], "Account number 1000 is already in use");
    }

    #[test]
    fn test_editing_account_keeps_its_own_number() {
        let cash = Account::new("1000", "Cash", AccountType::Asset);
        let chart = chart_with(vec![cash.clone()]);
        let mut renamed = cash;
        renamed.name = "Cash on Hand".to_string();
        assert!(chart.validate_account(&renamed).is_valid());
    }

    #[test]
    fn test_parent_rules() {
        let assets = Account::new("1000", "Assets", AccountType::Asset);
        let income = Account::new("4000", "Income", AccountType::Revenue);
        let chart = chart_with(vec![assets.clone(), income.clone()]);

        let child = Account::new("1010", "Cash", AccountType::Asset).with_parent(assets.id);
        assert!(chart.validate_account(&child).is_valid());

        let bad = Account::new("4010", "Fees", AccountType::Revenue).with_parent(income.id);
        assert!(bad_parent(&chart.validate_account(&bad), |k| {
            matches!(
                k,
                ValidationErrorKind::InvalidParentType {
                    parent_type: AccountType::Revenue
                }
            )
        }));

        let orphan = Account::new("1020", "Bank", AccountType::Asset).with_parent(AccountId::new());
        assert!(bad_parent(&chart.validate_account(&orphan), |k| {
            matches!(k, ValidationErrorKind::ParentNotFound { .. })
        }));

        let mut own = Account::new("1030", "Loop", AccountType::Asset);
        own.parent_account_id = Some(own.id);
        assert!(bad_parent(&chart.validate_account(&own), |k| {
            matches!(k, ValidationErrorKind::SelfParent)
        }));
    }

    fn bad_parent(
        report: &ValidationReport,
        predicate: impl Fn(&ValidationErrorKind) -> bool,
    ) -> bool {
        report.to_field_map().contains_key("parent") && report.any(predicate)
    }

    #[test]
    fn test_cannot_deactivate_or_delete_with_balance() {
        let cash = Account::new("1000", "Cash", AccountType::Asset).with_balance(dec!(25));
        let id = cash.id;
        let mut chart = chart_with(vec![cash]);

        assert!(matches!(chart.deactivate(id), Err(StateError::NonZeroBalance { .. })));
        assert!(matches!(chart.remove(id), Err(StateError::NonZeroBalance { .. })));
        assert!(chart.get(id).unwrap().is_active);
    }

    #[test]
    fn test_deactivate_and_delete_zero_balance() {
        let cash = Account::new("1000", "Cash", AccountType::Asset);
        let bank = Account::new("1010", "Bank", AccountType::Asset);
        let (cash_id, bank_id) = (cash.id, bank.id);
        let mut chart = chart_with(vec![cash, bank]);

        chart.deactivate(cash_id).unwrap();
        assert!(!chart.get(cash_id).unwrap().is_active);

        let removed = chart.remove(bank_id).unwrap();
        assert_eq!(removed.number, "1010");
        assert_eq!(chart.len(), 1);
    }

    #[test]
    fn test_cannot_delete_parent_with_children() {
        let assets = Account::new("1000", "Assets", AccountType::Asset);
        let cash = Account::new("1010", "Cash", AccountType::Asset).with_parent(assets.id);
        let assets_id = assets.id;
        let mut chart = chart_with(vec![assets, cash]);

        assert_eq!(chart.remove(assets_id), Err(StateError::HasChildAccounts(assets_id)));
    }

    #[test]
    fn test_upsert_preserves_balance_and_blocks_deactivation() {
        let cash = Account::new("1000", "Cash", AccountType::Asset).with_balance(dec!(10));
        let mut chart = chart_with(vec![cash.clone()]);

        let mut edited = cash.clone().with_balance(dec!(999));
        edited.name = "Cash on Hand".to_string();
        chart.upsert(edited).unwrap();
        assert_eq!(chart.get(cash.id).unwrap().balance, dec!(10));

        let mut inactive = cash.clone();
        inactive.is_active = false;
        let err = chart.upsert(inactive).unwrap_err();
        assert_eq!(err.error_code(), "NON_ZERO_BALANCE");
    }

    #[test]
    fn test_upsert_rejects_invalid_account() {
        let mut chart = ChartOfAccounts::new();
        let err = chart.upsert(Account::new("ABC", "Cash", AccountType::Asset)).unwrap_err();
        assert!(err.is_validation());
        assert!(chart.is_empty());
    }
}
