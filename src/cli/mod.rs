//! Command implementations and terminal rendering

pub mod advise;
pub mod schedule;
pub mod seed;
pub mod setup;
pub mod summary;
pub mod ui;

use crate::core::bank::{BankingProvider, Snapshot, fetch_snapshot};
use crate::core::config::{AppConfig, Session};
use crate::core::loan::AnnualRate;
use crate::core::portfolio::{PortfolioScope, Projection, project};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Options shared by every command that renders a projection.
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// Rate applied to every loan, overriding configured rates.
    pub rate: Option<AnnualRate>,
    /// Accounts to include; empty means every account in the session.
    pub accounts: Vec<String>,
    pub format: OutputFormat,
}

pub(crate) struct LoadedPortfolio {
    pub snapshot: Snapshot,
    pub projection: Projection,
}

/// Fetches the session's accounts and projects every loan from `start`.
pub(crate) async fn load_portfolio(
    config: &AppConfig,
    session: &Session,
    bank: &(dyn BankingProvider + Send + Sync),
    options: &ViewOptions,
    start: NaiveDate,
) -> Result<LoadedPortfolio> {
    let account_ids = if options.accounts.is_empty() {
        session.account_ids.clone()
    } else {
        options.accounts.clone()
    };
    if account_ids.is_empty() {
        bail!("No accounts configured: set session.account_ids or run `loanlens seed` first");
    }

    let pb = ui::new_progress_bar(account_ids.len() as u64, true);
    pb.set_message("Fetching accounts and loans...");
    let snapshot = fetch_snapshot(bank, &account_ids, &|| pb.inc(1)).await;
    pb.finish_and_clear();
    let snapshot = snapshot?;

    let projection = project(
        &snapshot.loans,
        &snapshot.accounts,
        &config.rate_book(options.rate),
        &PortfolioScope::accounts(account_ids),
        start,
        config.max_periods,
    );

    Ok(LoadedPortfolio {
        snapshot,
        projection,
    })
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
