use super::ui;
use crate::core::bank::{BankingProvider, NewAccount, NewCustomer, NewLoan};
use crate::core::config::Session;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

/// Ids of the records created by [`seed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeededIds {
    pub customer_id: String,
    pub account_id: String,
    pub loan_ids: Vec<String>,
}

impl SeededIds {
    /// `session` block to paste into the configuration file.
    pub fn session_yaml(&self) -> String {
        format!(
            "session:\n  customer_id: \"{}\"\n  account_ids:\n    - \"{}\"\n",
            self.customer_id, self.account_id
        )
    }
}

/// Creates a demo customer, or reuses the session's, with one account and two loans.
pub async fn seed(
    session: &Session,
    bank: &(dyn BankingProvider + Send + Sync),
) -> Result<SeededIds> {
    let customer_id = match &session.customer_id {
        Some(id) => {
            info!(customer_id = %id, "Reusing configured customer");
            id.clone()
        }
        None => bank
            .create_customer(&NewCustomer::demo())
            .await
            .context("Failed to create customer")?,
    };

    let account_id = bank
        .create_account(&customer_id, &NewAccount::demo())
        .await
        .with_context(|| format!("Failed to create account for customer {customer_id}"))?;

    let mut loan_ids = Vec::new();
    for loan in NewLoan::demo_set() {
        let id = bank
            .create_loan(&account_id, &loan)
            .await
            .with_context(|| format!("Failed to create {} loan", loan.loan_type))?;
        info!(loan_id = %id, loan_type = %loan.loan_type, "Created loan");
        loan_ids.push(id);
    }

    Ok(SeededIds {
        customer_id,
        account_id,
        loan_ids,
    })
}

pub async fn run(session: &Session, bank: &(dyn BankingProvider + Send + Sync)) -> Result<()> {
    let ids = seed(session, bank).await?;
    println!(
        "{} customer {}, account {}, loans {}",
        ui::style_text("Created", ui::StyleType::TotalLabel),
        ids.customer_id,
        ids.account_id,
        ids.loan_ids.join(", ")
    );
    println!(
        "\n{}\n\n{}",
        ui::style_text("Add this to your configuration:", ui::StyleType::Subtle),
        ids.session_yaml()
    );
    Ok(())
}
