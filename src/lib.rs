pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::ViewOptions;
use crate::core::config::AppConfig;
use crate::providers::{NessieProvider, OpenAiAdvisor};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Commands that talk to the bank. `setup` is handled before a config exists.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Seed,
    Summary(ViewOptions),
    Schedule {
        options: ViewOptions,
        loan_id: Option<String>,
        limit: Option<usize>,
    },
    Advise(ViewOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Loan dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currency = %config.currency,
        accounts = config.session.account_ids.len(),
        max_periods = config.max_periods,
        "Loaded config"
    );

    let session = config.session()?;
    let bank = NessieProvider::new(&config.providers.bank.base_url, &session.bank_api_key);
    let start = chrono::Local::now().date_naive();

    match command {
        AppCommand::Seed => cli::seed::run(&session, &bank).await,
        AppCommand::Summary(options) => {
            cli::summary::run(&config, &session, &bank, &options, start).await
        }
        AppCommand::Schedule {
            options,
            loan_id,
            limit,
        } => {
            cli::schedule::run(
                &config,
                &session,
                &bank,
                &options,
                loan_id.as_deref(),
                limit,
                start,
            )
            .await
        }
        AppCommand::Advise(options) => {
            let llm = config
                .providers
                .llm
                .as_ref()
                .context("No language model provider configured under providers.llm")?;
            let advisor = OpenAiAdvisor::new(&llm.base_url, &config.llm_api_key()?, &llm.model);
            cli::advise::run(&config, &session, &bank, &advisor, &options, start).await
        }
    }
}
