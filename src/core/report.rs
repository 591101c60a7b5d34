//! Chart- and table-ready rows built from schedules and loans.
use crate::core::amortization::Schedule;
use crate::core::loan::{AnnualRate, LoanRecord};
use crate::core::portfolio::Projection;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One period of one loan, for timeline and area charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub period_date: String,
    pub loan_id: String,
    pub loan_type: String,
    pub remaining_balance: Decimal,
    pub principal_paid: Decimal,
    pub interest_paid: Decimal,
    pub cumulative_principal_paid: Decimal,
    pub cumulative_interest_paid: Decimal,
    pub principal_share_pct: Decimal,
    pub interest_share_pct: Decimal,
}

/// One loan, for breakdown charts and detail tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanBreakdownRow {
    pub loan_id: String,
    pub loan_type: String,
    pub principal: Decimal,
    pub monthly_payment: Decimal,
    pub annual_rate: Option<AnnualRate>,
    pub credit_score: Option<i64>,
    pub status: Option<String>,
    pub months_to_payoff: Option<usize>,
    pub payoff_date: Option<String>,
    pub total_interest: Option<Decimal>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    pub loan_type: String,
    pub principal: Decimal,
    pub share_pct: Decimal,
}

/// Calendar month label used for period dates, e.g. `2026-10`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn timeline_rows(schedules: &[Schedule]) -> Vec<TimelineRow> {
    schedules
        .iter()
        .flat_map(|s| s.periods.iter())
        .map(|p| TimelineRow {
            period_date: month_label(p.period_date),
            loan_id: p.loan_id.clone(),
            loan_type: p.loan_type.clone(),
            remaining_balance: p.remaining_balance,
            principal_paid: p.principal_paid,
            interest_paid: p.interest_paid,
            cumulative_principal_paid: p.cumulative_principal_paid,
            cumulative_interest_paid: p.cumulative_interest_paid,
            principal_share_pct: p.principal_share_pct,
            interest_share_pct: p.interest_share_pct,
        })
        .collect()
}

/// One row per loan; schedule columns stay empty for loans without a chosen rate.
pub fn breakdown_rows(loans: &[LoanRecord], projection: &Projection) -> Vec<LoanBreakdownRow> {
    loans
        .iter()
        .filter(|l| {
            projection.schedule_for(&l.id).is_some() || projection.summary.unrated.contains(&l.id)
        })
        .map(|loan| {
            let schedule = projection.schedule_for(&loan.id);
            let paid_off = schedule.filter(|s| s.is_paid_off());
            LoanBreakdownRow {
                loan_id: loan.id.clone(),
                loan_type: loan.loan_type.clone(),
                principal: loan.principal,
                monthly_payment: loan.monthly_payment,
                annual_rate: schedule.map(|s| s.annual_rate),
                credit_score: loan.credit_score,
                status: loan.status.clone(),
                months_to_payoff: paid_off.map(Schedule::months),
                payoff_date: paid_off.and_then(Schedule::payoff_date).map(month_label),
                total_interest: paid_off.map(Schedule::total_interest),
                warning: schedule
                    .and_then(|s| s.warning.as_ref())
                    .map(ToString::to_string),
            }
        })
        .collect()
}

/// Principal grouped by loan type, sorted by type name.
pub fn share_by_type(loans: &[LoanRecord]) -> Vec<TypeShare> {
    let mut by_type: BTreeMap<&str, Decimal> = BTreeMap::new();
    for loan in loans {
        *by_type.entry(loan.loan_type.as_str()).or_insert(Decimal::ZERO) += loan.principal;
    }
    let total: Decimal = by_type.values().copied().sum();

    by_type
        .into_iter()
        .map(|(loan_type, principal)| TypeShare {
            loan_type: loan_type.to_string(),
            principal,
            share_pct: if total.is_zero() {
                Decimal::ZERO
            } else {
                principal / total * Decimal::ONE_HUNDRED
            },
        })
        .collect()
}

/// Formats an amount with two decimals and thousands separators, e.g. `250,000.00`.
pub fn format_amount(amount: Decimal) -> String {
    let text = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}
