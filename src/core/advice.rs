//! Inputs and prompt for the natural-language loan summary

use crate::core::portfolio::PortfolioSummary;
use crate::core::report::format_amount;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

const SYSTEM_PROMPT: &str = "You are a financial assistant specialized in loan analysis. Provide structured responses in bullet points.";

/// The only figures handed to the summary generator. Schedules never leave the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryInputs {
    pub total_loan_amount: Decimal,
    pub account_balance: Decimal,
    pub fastest_loan_description: String,
}

impl SummaryInputs {
    pub fn from_summary(summary: &PortfolioSummary) -> Self {
        let fastest_loan_description = match &summary.fastest_loan {
            Some(loan) => format!(
                "{} with {} outstanding, paying {} per month",
                loan.label(),
                format_amount(loan.principal),
                format_amount(loan.monthly_payment)
            ),
            None => "No loans on record".to_string(),
        };
        SummaryInputs {
            total_loan_amount: summary.total_principal,
            account_balance: summary.total_balance,
            fastest_loan_description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

/// Builds the system and user messages asking for a three-bullet summary.
pub fn build_messages(inputs: &SummaryInputs, products: &[String]) -> Vec<ChatMessage> {
    let product_list = if products.is_empty() {
        "- (none configured)".to_string()
    } else {
        products
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        "Summarize the customer's loan status in 3 bullet points:\n\n\
         1. Provide a one-line comment on their overall financial situation.\n\
         2. Compare the account balance with the total loan amount.\n\
         3. Identify the loan that will be paid off first and recommend a suitable loan product.\n\n\
         Customer Data:\n\
         - **Total Loan Amount**: ${}\n\
         - **Account Balance**: ${}\n\
         - **Fastest Finishing Loan**: {}\n\n\
         Available Loan Products:\n{}\n",
        format_amount(inputs.total_loan_amount),
        format_amount(inputs.account_balance),
        inputs.fastest_loan_description,
        product_list
    );

    vec![
        ChatMessage::new("system", SYSTEM_PROMPT.to_string()),
        ChatMessage::new("user", user),
    ]
}

/// Generates the loan summary, delivering text incrementally through `on_chunk`.
#[async_trait]
pub trait LoanAdvisor: Send + Sync {
    /// Returns the full text once the stream ends.
    async fn stream_summary(
        &self,
        inputs: &SummaryInputs,
        products: &[String],
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String>;
}
