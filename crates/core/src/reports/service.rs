//! Report generation service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{round_currency, within_tolerance};
use tracing::warn;

use super::error::ReportError;
use super::snapshot::{AccountBalance, LedgerSnapshot};
use super::types::{
    BalanceSheet, IncomeStatement, IntegrityWarning, ReportOptions, StatementLine, StatementSection,
    TrialBalance, TrialBalanceRow, TrialBalanceTotals,
};
use crate::ledger::AccountType;

/// Service for generating financial statements.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance from account balances.
    ///
    /// Each active account's balance goes to its normal-balance column, or to
    /// the opposite column when negative.
    #[must_use]
    pub fn trial_balance(
        snapshot: &LedgerSnapshot,
        as_of: NaiveDate,
        options: &ReportOptions,
    ) -> TrialBalance {
        let rows: Vec<TrialBalanceRow> = snapshot
            .accounts()
            .iter()
            .filter(|a| a.is_active)
            .map(|a| {
                let (debit, credit) = a.normal_balance.columns(a.balance);
                TrialBalanceRow {
                    account_id: a.account_id,
                    account_number: a.account_number.clone(),
                    account_name: a.account_name.clone(),
                    account_type: a.account_type,
                    debit: round_currency(debit, options.decimal_places),
                    credit: round_currency(credit, options.decimal_places),
                }
            })
            .collect();

        let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();

        TrialBalance {
            as_of,
            currency: options.currency,
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                balance_check: within_tolerance(total_debit, total_credit),
            },
        }
    }

    /// Generates an income statement.
    ///
    /// The snapshot should cover the period, e.g. a replay over
    /// `ReportPeriod::range(start, end)`. A period without activity yields zeros.
    pub fn income_statement(
        snapshot: &LedgerSnapshot,
        start: NaiveDate,
        end: NaiveDate,
        options: &ReportOptions,
    ) -> Result<IncomeStatement, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }

        let revenue = Self::section(snapshot, AccountType::Revenue, options);
        let expenses = Self::section(snapshot, AccountType::Expense, options);
        let net_income = revenue.total - expenses.total;

        Ok(IncomeStatement {
            period_start: start,
            period_end: end,
            currency: options.currency,
            revenue,
            expenses,
            net_income,
        })
    }

    /// Generates a balance sheet and checks the accounting equation.
    ///
    /// Revenue and expense balances not yet closed into equity count as
    /// unclosed earnings on the equity side. A mismatch is reported as an
    /// [`IntegrityWarning`], never as an error.
    #[must_use]
    pub fn balance_sheet(
        snapshot: &LedgerSnapshot,
        as_of: NaiveDate,
        options: &ReportOptions,
    ) -> BalanceSheet {
        let assets = Self::section(snapshot, AccountType::Asset, options);
        let liabilities = Self::section(snapshot, AccountType::Liability, options);
        let equity = Self::section(snapshot, AccountType::Equity, options);

        let unclosed_earnings = round_currency(
            snapshot.total(AccountType::Revenue) - snapshot.total(AccountType::Expense),
            options.decimal_places,
        );
        let liabilities_and_equity = liabilities.total + equity.total + unclosed_earnings;
        let is_balanced = within_tolerance(assets.total, liabilities_and_equity);

        let integrity_warning = (!is_balanced).then(|| {
            let difference = assets.total - liabilities_and_equity;
            warn!(
                %as_of,
                assets = %assets.total,
                liabilities_and_equity = %liabilities_and_equity,
                %difference,
                "balance sheet does not balance"
            );
            IntegrityWarning::BalanceSheetMismatch {
                assets: assets.total,
                liabilities_and_equity,
                difference,
            }
        });

        BalanceSheet {
            as_of,
            currency: options.currency,
            assets,
            liabilities,
            equity,
            unclosed_earnings,
            liabilities_and_equity,
            is_balanced,
            integrity_warning,
        }
    }

    fn section(
        snapshot: &LedgerSnapshot,
        account_type: AccountType,
        options: &ReportOptions,
    ) -> StatementSection {
        let lines: Vec<StatementLine> = snapshot
            .of_type(account_type)
            .map(|a| Self::line(a, options))
            .collect();
        StatementSection {
            total: lines.iter().map(|l| l.amount).sum(),
            lines,
        }
    }

    fn line(account: &AccountBalance, options: &ReportOptions) -> StatementLine {
        StatementLine {
            account_id: account.account_id,
            account_number: account.account_number.clone(),
            account_name: account.account_name.clone(),
            amount: round_currency(account.balance, options.decimal_places),
        }
    }
}
