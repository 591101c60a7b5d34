use crate::core::amortization::DEFAULT_MAX_PERIODS;
use crate::core::loan::AnnualRate;
use crate::core::portfolio::RateBook;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_BANK_URL: &str = "http://api.nessieisreal.com";
const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionConfig {
    pub customer_id: Option<String>,
    #[serde(default)]
    pub account_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BankProviderConfig {
    pub base_url: String,
    #[serde(default = "default_bank_key_env")]
    pub api_key_env: String,
    /// Inline key, takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for BankProviderConfig {
    fn default() -> Self {
        BankProviderConfig {
            base_url: DEFAULT_BANK_URL.to_string(),
            api_key_env: default_bank_key_env(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmProviderConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub bank: BankProviderConfig,
    pub llm: Option<LlmProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RatesConfig {
    pub default: Option<AnnualRate>,
    #[serde(default)]
    pub loans: HashMap<String, AnnualRate>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default = "default_max_periods")]
    pub max_periods: usize,
    pub currency: String,
    #[serde(default)]
    pub products: Vec<String>,
}

/// Explicit request context handed to commands instead of global session state.
#[derive(Debug, Clone)]
pub struct Session {
    pub customer_id: Option<String>,
    pub account_ids: Vec<String>,
    pub bank_api_key: String,
}

fn default_bank_key_env() -> String {
    "NESSIE_API_KEY".to_string()
}

fn default_llm_url() -> String {
    DEFAULT_LLM_URL.to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_periods() -> usize {
    DEFAULT_MAX_PERIODS
}

/// Inline key first, then the named environment variable.
fn resolve_key(inline: Option<&String>, env_name: &str) -> Result<String> {
    if let Some(key) = inline {
        return Ok(key.clone());
    }
    std::env::var(env_name)
        .with_context(|| format!("API key not found: set the {env_name} environment variable"))
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "loanlens", "loanlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Builds the session context for banking calls.
    pub fn session(&self) -> Result<Session> {
        let bank = &self.providers.bank;
        Ok(Session {
            customer_id: self.session.customer_id.clone(),
            account_ids: self.session.account_ids.clone(),
            bank_api_key: resolve_key(bank.api_key.as_ref(), &bank.api_key_env)?,
        })
    }

    pub fn llm_api_key(&self) -> Result<String> {
        let llm = self
            .providers
            .llm
            .as_ref()
            .context("No language model provider configured under providers.llm")?;
        resolve_key(llm.api_key.as_ref(), &llm.api_key_env)
    }

    /// Rates from the config, with an optional rate applied to every loan.
    pub fn rate_book(&self, override_rate: Option<AnnualRate>) -> RateBook {
        let mut book = RateBook::new()
            .with_default(self.rates.default)
            .with_override(override_rate);
        for (loan_id, rate) in &self.rates.loans {
            book.set(loan_id.clone(), *rate);
        }
        book
    }
}
