//! Portfolio-level figures computed over every loan and account in scope.
use crate::core::amortization::{Schedule, amortize_with_cap, start_of_month};
use crate::core::loan::{AccountRecord, AnnualRate, LoanRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Interest rates chosen for each loan.
///
/// Lookup order is: portfolio-wide override, per-loan rate, default rate.
/// A loan without any rate is left out of projections.
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    override_rate: Option<AnnualRate>,
    default_rate: Option<AnnualRate>,
    loans: HashMap<String, AnnualRate>,
}

impl RateBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, rate: Option<AnnualRate>) -> Self {
        self.override_rate = rate;
        self
    }

    pub fn with_default(mut self, rate: Option<AnnualRate>) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn set(&mut self, loan_id: impl Into<String>, rate: AnnualRate) {
        self.loans.insert(loan_id.into(), rate);
    }

    pub fn rate_for(&self, loan_id: &str) -> Option<AnnualRate> {
        self.override_rate
            .or_else(|| self.loans.get(loan_id).copied())
            .or(self.default_rate)
    }
}

/// Restricts aggregation to a set of accounts. The default scope covers everything.
#[derive(Debug, Clone, Default)]
pub struct PortfolioScope {
    accounts: Option<HashSet<String>>,
}

impl PortfolioScope {
    pub fn all() -> Self {
        Self::default()
    }

    /// An empty list of ids means no restriction.
    pub fn accounts<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
        Self {
            accounts: (!ids.is_empty()).then_some(ids),
        }
    }

    pub fn includes(&self, account_id: Option<&str>) -> bool {
        match (&self.accounts, account_id) {
            (None, _) => true,
            (Some(ids), Some(id)) => ids.contains(id),
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanPayoff {
    pub loan_id: String,
    pub loan_type: String,
    pub payoff_date: NaiveDate,
    pub months: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub total_principal: Decimal,
    /// Only loans with a chosen rate contribute.
    pub total_monthly_payment: Decimal,
    pub total_balance: Decimal,
    /// Month in which the last terminating schedule reaches zero.
    pub debt_free_period: Option<NaiveDate>,
    /// Loan with the smallest `monthly_payment / principal` ratio.
    pub fastest_loan: Option<LoanRecord>,
    /// Loan whose schedule reaches zero first.
    pub earliest_payoff: Option<LoanPayoff>,
    /// Set when at least one schedule was truncated before reaching zero.
    pub incomplete: bool,
    /// Loans whose schedule stopped before reaching zero.
    pub truncated: Vec<String>,
    pub unrated: Vec<String>,
}

/// Output of one aggregation pass: the summary plus the schedules it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub start: NaiveDate,
    pub summary: PortfolioSummary,
    pub schedules: Vec<Schedule>,
}

impl Projection {
    pub fn schedule_for(&self, loan_id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.loan_id == loan_id)
    }
}

pub fn total_principal(loans: &[LoanRecord]) -> Decimal {
    loans.iter().map(|l| l.principal).sum()
}

pub fn total_monthly_payment(loans: &[LoanRecord], rates: &RateBook) -> Decimal {
    loans
        .iter()
        .filter(|l| rates.rate_for(&l.id).is_some())
        .map(|l| l.monthly_payment)
        .sum()
}

pub fn total_balance(accounts: &[AccountRecord]) -> Decimal {
    accounts.iter().map(|a| a.balance).sum()
}

/// Latest payoff month across schedules that actually reach zero.
pub fn debt_free_period(schedules: &[Schedule]) -> Option<NaiveDate> {
    schedules.iter().filter_map(Schedule::payoff_date).max()
}

/// Loan with the minimum `monthly_payment / principal` ratio.
///
/// Zero-principal loans, and ratios too large to represent, rank last.
/// Ties keep the first loan in input order.
pub fn fastest_loan(loans: &[LoanRecord]) -> Option<&LoanRecord> {
    let ratio =
        |loan: &LoanRecord| -> Option<Decimal> { loan.monthly_payment.checked_div(loan.principal) };

    let mut loans_iter = loans.iter();
    let mut best = loans_iter.next()?;
    let mut best_ratio = ratio(best);
    for loan in loans_iter {
        let candidate = ratio(loan);
        if compare_ratio(candidate, best_ratio) == Ordering::Less {
            best = loan;
            best_ratio = candidate;
        }
    }
    Some(best)
}

// `None` stands for an infinite ratio.
fn compare_ratio(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Schedule that reaches zero in the fewest months; first in input order on ties.
pub fn earliest_payoff(schedules: &[Schedule]) -> Option<LoanPayoff> {
    schedules
        .iter()
        .filter_map(|s| {
            s.payoff_date().map(|payoff_date| LoanPayoff {
                loan_id: s.loan_id.clone(),
                loan_type: s.loan_type.clone(),
                payoff_date,
                months: s.months(),
            })
        })
        .min_by_key(|p| (p.payoff_date, p.months))
}

/// Builds schedules and the portfolio summary for every loan in `scope`.
///
/// `start` is pinned once and shared by every schedule of the pass.
pub fn project(
    loans: &[LoanRecord],
    accounts: &[AccountRecord],
    rates: &RateBook,
    scope: &PortfolioScope,
    start: NaiveDate,
    max_periods: usize,
) -> Projection {
    let start = start_of_month(start);
    let loans: Vec<LoanRecord> = loans
        .iter()
        .filter(|l| scope.includes(l.account_id.as_deref()))
        .cloned()
        .collect();
    let accounts: Vec<AccountRecord> = accounts
        .iter()
        .filter(|a| scope.includes(Some(a.id.as_str())))
        .cloned()
        .collect();

    let mut schedules = Vec::new();
    let mut unrated = Vec::new();
    for loan in &loans {
        match rates.rate_for(&loan.id) {
            Some(rate) => schedules.push(amortize_with_cap(loan, rate, start, max_periods)),
            None => {
                debug!(loan_id = %loan.id, "No rate chosen, loan left out of projections");
                unrated.push(loan.id.clone());
            }
        }
    }

    let truncated: Vec<String> = schedules
        .iter()
        .filter(|s| !s.is_paid_off())
        .map(|s| s.loan_id.clone())
        .collect();

    let summary = PortfolioSummary {
        loan_count: loans.len(),
        total_principal: total_principal(&loans),
        total_monthly_payment: total_monthly_payment(&loans, rates),
        total_balance: total_balance(&accounts),
        debt_free_period: debt_free_period(&schedules),
        fastest_loan: fastest_loan(&loans).cloned(),
        earliest_payoff: earliest_payoff(&schedules),
        incomplete: !truncated.is_empty(),
        truncated,
        unrated,
    };

    info!(
        loans = summary.loan_count,
        schedules = schedules.len(),
        incomplete = summary.incomplete,
        "Portfolio projected"
    );

    Projection {
        start,
        summary,
        schedules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan(id: &str, principal: Decimal, monthly_payment: Decimal) -> LoanRecord {
        LoanRecord {
            id: id.to_string(),
            loan_type: "home".to_string(),
            principal,
            monthly_payment,
            status: None,
            credit_score: None,
            description: None,
            account_id: Some("acc1".to_string()),
        }
    }

    fn account(id: &str, balance: Decimal) -> AccountRecord {
        AccountRecord {
            id: id.to_string(),
            balance,
            nickname: None,
            account_type: None,
        }
    }

    fn rate(r: Decimal) -> AnnualRate {
        AnnualRate::new(r).unwrap()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn demo_loans() -> Vec<LoanRecord> {
        vec![
            loan("home", dec!(250000), dec!(1200)),
            loan("auto", dec!(20000), dec!(350)),
        ]
    }

    #[test]
    fn test_rate_book_resolution_order() {
        let mut rates = RateBook::new().with_default(Some(rate(dec!(0.05))));
        rates.set("auto", rate(dec!(0.07)));
        assert_eq!(rates.rate_for("auto"), Some(rate(dec!(0.07))));
        assert_eq!(rates.rate_for("home"), Some(rate(dec!(0.05))));

        let rates = rates.with_override(Some(rate(dec!(0.01))));
        assert_eq!(rates.rate_for("auto"), Some(rate(dec!(0.01))));

        assert_eq!(RateBook::new().rate_for("auto"), None);
    }

    #[test]
    fn test_fastest_loan_uses_smallest_ratio() {
        // 1200 / 250000 = 0.0048 < 350 / 20000 = 0.0175
        let loans = demo_loans();
        assert_eq!(fastest_loan(&loans).unwrap().id, "home");
    }

    #[test]
    fn test_fastest_loan_ties_and_zero_principal() {
        let loans = vec![
            loan("paid", Decimal::ZERO, dec!(100)),
            loan("a", dec!(1000), dec!(100)),
            loan("b", dec!(2000), dec!(200)),
        ];
        assert_eq!(fastest_loan(&loans).unwrap().id, "a");

        let only_paid = vec![loan("p1", Decimal::ZERO, dec!(1)), loan("p2", Decimal::ZERO, dec!(1))];
        assert_eq!(fastest_loan(&only_paid).unwrap().id, "p1");

        assert!(fastest_loan(&[]).is_none());
    }

    #[test]
    fn test_fastest_loan_with_unrepresentable_ratio() {
        let tiny = Decimal::from_scientific("1e-28").unwrap();
        let loans = vec![
            loan("tiny", tiny, dec!(100000000000)),
            loan("home", dec!(250000), dec!(1200)),
        ];
        assert_eq!(fastest_loan(&loans).unwrap().id, "home");
        assert_eq!(fastest_loan(&loans[..1]).unwrap().id, "tiny");
    }

    #[test]
    fn test_project_two_loans() {
        let loans = demo_loans();
        let accounts = vec![account("acc1", dec!(10000))];
        let rates = RateBook::new().with_default(Some(rate(dec!(0.05))));

        let projection = project(
            &loans,
            &accounts,
            &rates,
            &PortfolioScope::all(),
            start(),
            1200,
        );
        let summary = &projection.summary;

        assert_eq!(projection.start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(projection.schedules.len(), 2);
        assert_eq!(summary.loan_count, 2);
        assert_eq!(summary.total_principal, dec!(270000));
        assert_eq!(summary.total_monthly_payment, dec!(1550));
        assert_eq!(summary.total_balance, dec!(10000));
        assert!(!summary.incomplete);
        assert_eq!(summary.fastest_loan.as_ref().unwrap().id, "home");

        let home = projection.schedule_for("home").unwrap();
        let auto = projection.schedule_for("auto").unwrap();
        assert_eq!(summary.debt_free_period, home.payoff_date());
        assert!(home.payoff_date() > auto.payoff_date());

        let earliest = summary.earliest_payoff.as_ref().unwrap();
        assert_eq!(earliest.loan_id, "auto");
        assert_eq!(earliest.months, auto.months());
    }

    #[test]
    fn test_project_flags_truncated_loans() {
        let loans = vec![
            loan("ok", dec!(20000), dec!(350)),
            loan("stuck", dec!(10000), dec!(10)),
        ];
        let rates = RateBook::new().with_default(Some(rate(dec!(0.10))));

        let projection = project(&loans, &[], &rates, &PortfolioScope::all(), start(), 1200);

        assert!(projection.summary.incomplete);
        assert_eq!(projection.summary.truncated, vec!["stuck".to_string()]);
        assert_eq!(
            projection.summary.debt_free_period,
            projection.schedule_for("ok").unwrap().payoff_date()
        );
    }

    #[test]
    fn test_unrated_loans_excluded_from_projection() {
        let loans = demo_loans();
        let mut rates = RateBook::new();
        rates.set("auto", rate(dec!(0.05)));

        let projection = project(&loans, &[], &rates, &PortfolioScope::all(), start(), 1200);

        assert_eq!(projection.schedules.len(), 1);
        assert_eq!(projection.summary.unrated, vec!["home".to_string()]);
        assert_eq!(projection.summary.total_principal, dec!(270000));
        assert_eq!(projection.summary.total_monthly_payment, dec!(350));
        assert!(!projection.summary.incomplete);
    }

    #[test]
    fn test_project_respects_account_scope() {
        let mut loans = demo_loans();
        loans[1].account_id = Some("acc2".to_string());
        let accounts = vec![account("acc1", dec!(10000)), account("acc2", dec!(500))];
        let rates = RateBook::new().with_default(Some(rate(dec!(0.05))));

        let projection = project(
            &loans,
            &accounts,
            &rates,
            &PortfolioScope::accounts(["acc2"]),
            start(),
            1200,
        );

        assert_eq!(projection.summary.loan_count, 1);
        assert_eq!(projection.summary.total_principal, dec!(20000));
        assert_eq!(projection.summary.total_balance, dec!(500));
        assert!(PortfolioScope::accounts(Vec::<String>::new()).includes(None));
    }

    #[test]
    fn test_empty_portfolio() {
        let projection = project(
            &[],
            &[account("acc1", dec!(42))],
            &RateBook::new(),
            &PortfolioScope::all(),
            start(),
            1200,
        );
        let summary = projection.summary;
        assert_eq!(summary.loan_count, 0);
        assert_eq!(summary.total_principal, Decimal::ZERO);
        assert_eq!(summary.total_balance, dec!(42));
        assert!(summary.fastest_loan.is_none());
        assert!(summary.debt_free_period.is_none());
        assert!(summary.earliest_payoff.is_none());
        assert!(!summary.incomplete);
    }

    #[test]
    fn test_schedules_share_the_pinned_start() {
        let loans = demo_loans();
        let rates = RateBook::new().with_default(Some(rate(dec!(0.05))));
        let projection = project(&loans, &[], &rates, &PortfolioScope::all(), start(), 1200);
        assert!(projection.schedules.iter().all(|s| s.start == projection.start));
        assert!(
            projection
                .schedules
                .iter()
                .all(|s| s.periods[0].period_date == projection.start)
        );
    }
}
