//! Typed errors raised by the loan domain

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoanError {
    /// A raw loan or account mapping is missing a required field or carries
    /// a value that cannot be used as an amount.
    #[error("Malformed loan data: field `{field}` {reason}")]
    MalformedLoanData { field: &'static str, reason: String },

    #[error("Invalid interest rate '{0}': expected a non-negative annual rate such as 0.05 or 5%")]
    InvalidRate(String),
}

impl LoanError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        LoanError::MalformedLoanData {
            field,
            reason: reason.into(),
        }
    }
}
