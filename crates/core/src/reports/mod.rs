//! Financial statement generation.
//!
//! Statements are derived on demand from a [`LedgerSnapshot`], never stored:
//! - Trial Balance
//! - Income Statement
//! - Balance Sheet

pub mod error;
pub mod service;
pub mod snapshot;
pub mod types;


pub use error::ReportError;
pub use service::ReportService;
pub use snapshot::{AccountBalance, LedgerSnapshot, ReportPeriod};
pub use types::*;
