//! Banking data abstractions

use crate::core::loan::{AccountRecord, LoanRecord, RawRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub street_number: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub nickname: String,
    pub rewards: u32,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLoan {
    #[serde(rename = "type")]
    pub loan_type: String,
    pub status: String,
    pub credit_score: u32,
    pub monthly_payment: Decimal,
    pub amount: Decimal,
    pub description: String,
}

impl NewCustomer {
    pub fn demo() -> Self {
        NewCustomer {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            address: Address {
                street_number: "123".to_string(),
                street_name: "Main Street".to_string(),
                city: "New York".to_string(),
                state: "NY".to_string(),
                zip: "10001".to_string(),
            },
        }
    }
}

impl NewAccount {
    pub fn demo() -> Self {
        NewAccount {
            account_type: "Checking".to_string(),
            nickname: "John's Account".to_string(),
            rewards: 100,
            balance: Decimal::from(10_000),
        }
    }
}

impl NewLoan {
    /// A mortgage and a car loan.
    pub fn demo_set() -> Vec<Self> {
        vec![
            NewLoan {
                loan_type: "home".to_string(),
                status: "pending".to_string(),
                credit_score: 750,
                monthly_payment: Decimal::from(1200),
                amount: Decimal::from(250_000),
                description: "Mortgage loan".to_string(),
            },
            NewLoan {
                loan_type: "auto".to_string(),
                status: "approved".to_string(),
                credit_score: 680,
                monthly_payment: Decimal::from(350),
                amount: Decimal::from(20_000),
                description: "Car loan".to_string(),
            },
        ]
    }
}

/// Access to customers, accounts and loans held by the bank.
#[async_trait]
pub trait BankingProvider: Send + Sync {
    async fn fetch_loans(&self, account_id: &str) -> Result<Vec<RawRecord>>;
    async fn fetch_account(&self, account_id: &str) -> Result<RawRecord>;
    /// Returns the id of the created customer.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String>;
    /// Returns the id of the created account.
    async fn create_account(&self, customer_id: &str, account: &NewAccount) -> Result<String>;
    /// Returns the id of the created loan.
    async fn create_loan(&self, account_id: &str, loan: &NewLoan) -> Result<String>;
}

/// Loans and accounts fetched at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub loans: Vec<LoanRecord>,
    pub accounts: Vec<AccountRecord>,
}

/// Fetches every account and its loans concurrently and validates the records.
///
/// Malformed records fail the whole snapshot rather than being skipped.
pub async fn fetch_snapshot(
    provider: &(dyn BankingProvider + Send + Sync),
    account_ids: &[String],
    update_callback: &(dyn Fn() + Sync),
) -> Result<Snapshot> {
    let futures = account_ids.iter().map(|account_id| async move {
        let (account, loans) = futures::join!(
            provider.fetch_account(account_id),
            provider.fetch_loans(account_id)
        );
        update_callback();
        (account_id, account, loans)
    });

    let mut snapshot = Snapshot::default();
    for (account_id, account, loans) in join_all(futures).await {
        let account = account.with_context(|| format!("Failed to fetch account {account_id}"))?;
        snapshot.accounts.push(
            AccountRecord::from_raw(&account)
                .with_context(|| format!("Invalid account data for {account_id}"))?,
        );

        let loans = loans.with_context(|| format!("Failed to fetch loans for {account_id}"))?;
        debug!(account_id = %account_id, count = loans.len(), "Fetched loans");
        for raw in &loans {
            let loan = LoanRecord::from_raw(raw)
                .with_context(|| format!("Invalid loan data in account {account_id}"))?;
            snapshot.loans.push(loan.with_account(account_id));
        }
    }

    Ok(snapshot)
}
