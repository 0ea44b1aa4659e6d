//! Common types used across the workspace.

pub mod id;
pub mod money;

#[cfg(test)]
mod money_tests;

pub use id::*;
pub use money::{BALANCE_TOLERANCE, Currency, round_currency, within_tolerance};
