//! Core loan domain: records, amortization, aggregation and their boundaries

pub mod advice;
pub mod amortization;
pub mod bank;
pub mod config;
pub mod error;
pub mod log;
pub mod loan;
pub mod portfolio;
pub mod report;

// Re-export main types for cleaner imports
pub use advice::{LoanAdvisor, SummaryInputs};
pub use amortization::{AmortizationPeriod, Schedule, ScheduleWarning, amortize};
pub use bank::BankingProvider;
pub use error::LoanError;
pub use loan::{AccountRecord, AnnualRate, LoanRecord};
pub use portfolio::{PortfolioScope, PortfolioSummary, Projection, RateBook, project};
