//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Callers own all mutable session state and pass immutable values in.
//!
//! # Modules
//!
//! - `ledger` - Accounts, journal entries, validation and posting
//! - `reports` - Trial balance, income statement and balance sheet

pub mod ledger;
pub mod reports;
