//! Tally CLI
//!
//! Validates and posts journal entries in a JSON ledger file and prints
//! financial statements as JSON.

mod commands;
mod ledger_file;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tally_core::reports::ReportOptions;
use tally_shared::{AppConfig, AppError};
use tally_shared::config::{LogFormat, LoggingConfig};
use tally_shared::types::UserId;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Outcome;
use crate::ledger_file::LedgerFile;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Double-entry ledger validation, posting and statements")]
#[command(version)]
struct Cli {
    /// Ledger file to read
    #[arg(long, env = "TALLY_LEDGER", default_value = "ledger.json")]
    ledger: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one entry, or every draft
    Validate {
        /// Entry number or ID
        entry: Option<String>,
    },

    /// Post a draft entry to account balances
    Post {
        /// Entry number or ID
        entry: String,

        /// User recorded as the poster (default: a fresh ID)
        #[arg(long)]
        posted_by: Option<UserId>,

        /// Show the balance changes without saving
        #[arg(long)]
        dry_run: bool,

        /// Write the updated ledger here instead of overwriting the input
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Trial balance of active accounts
    TrialBalance {
        /// Replay posted entries up to this date instead of using stored balances
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Income statement for an inclusive date range
    IncomeStatement {
        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },

    /// Balance sheet with the accounting-equation check
    BalanceSheet {
        /// Replay posted entries up to this date instead of using stored balances
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()
        .map_err(AppError::from)
        .context("failed to load configuration")?;
    init_tracing(&config.logging, cli.verbose);

    let options = ReportOptions::from(&config.ledger);
    let mut book = LedgerFile::read(&cli.ledger)?.into_book(&config.ledger.entry_prefix);

    let outcome = match &cli.command {
        Commands::Validate { entry } => commands::validate(&book, entry.as_deref())?,
        Commands::Post {
            entry,
            posted_by,
            dry_run,
            ..
        } => commands::post(&mut book, entry, posted_by.unwrap_or_default(), *dry_run)?,
        Commands::TrialBalance { as_of } => commands::trial_balance(&book, *as_of, &options)?,
        Commands::IncomeStatement { start, end } => {
            commands::income_statement(&book, *start, *end, &options)?
        }
        Commands::BalanceSheet { as_of } => commands::balance_sheet(&book, *as_of, &options)?,
    };

    if outcome.changed {
        let path = match &cli.command {
            Commands::Post {
                output: Some(path), ..
            } => path,
            _ => &cli.ledger,
        };
        LedgerFile::from_book(&book).write(path)?;
        tracing::info!(path = %path.display(), "ledger saved");
    }

    print_json(&outcome)?;
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Installs the global subscriber. Logs go to stderr so stdout stays JSON.
fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let directive = if verbose { "tally=debug" } else { config.filter.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_json(outcome: &Outcome) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &outcome.output)
        .context("failed to write output")?;
    writeln!(stdout)?;
    Ok(())
}
