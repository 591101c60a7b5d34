//! Month-by-month payoff schedules for a fixed nominal payment.
//!
//! Interest compounds monthly at `annual_rate / 12`. Each period the fixed
//! payment first covers the interest due; the remainder reduces principal.
//! A payment that cannot cover the interest stops the schedule instead of
//! letting the balance grow forever.
use crate::core::loan::{AnnualRate, LoanRecord};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt::Display;
use tracing::{debug, warn};

/// Upper bound on the number of periods a single schedule may hold (100 years).
pub const DEFAULT_MAX_PERIODS: usize = 1200;

/// One month of a payoff schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmortizationPeriod {
    pub period_date: NaiveDate,
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

/// Why a schedule stopped before the balance reached zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// The payment does not cover the interest accrued in `period`.
    NonAmortizingPayment {
        period: usize,
        interest_due: Decimal,
        monthly_payment: Decimal,
    },
    PeriodCapReached { max_periods: usize },
}

impl Display for ScheduleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleWarning::NonAmortizingPayment {
                period,
                interest_due,
                monthly_payment,
            } => write!(
                f,
                "payment {monthly_payment:.2} does not cover interest of {interest_due:.2} in period {period}; raise the payment or lower the rate"
            ),
            ScheduleWarning::PeriodCapReached { max_periods } => {
                write!(f, "not paid off within {max_periods} months")
            }
        }
    }
}

/// Payoff schedule of one loan under one annual rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub loan_id: String,
    pub loan_type: String,
    pub annual_rate: AnnualRate,
    pub start: NaiveDate,
    pub periods: Vec<AmortizationPeriod>,
    pub warning: Option<ScheduleWarning>,
}

impl Schedule {
    /// True when the schedule ran to a zero balance (or the loan had none).
    pub fn is_paid_off(&self) -> bool {
        self.warning.is_none()
    }

    /// Month in which the balance reaches zero; `None` for empty or truncated schedules.
    pub fn payoff_date(&self) -> Option<NaiveDate> {
        if !self.is_paid_off() {
            return None;
        }
        self.periods.last().map(|p| p.period_date)
    }

    pub fn months(&self) -> usize {
        self.periods.len()
    }

    pub fn total_interest(&self) -> Decimal {
        self.periods
            .last()
            .map_or(Decimal::ZERO, |p| p.cumulative_interest_paid)
    }

    pub fn total_principal(&self) -> Decimal {
        self.periods
            .last()
            .map_or(Decimal::ZERO, |p| p.cumulative_principal_paid)
    }
}

/// First day of the month containing `date`. Schedules are anchored here.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Computes the payoff schedule of `loan` at `rate`, starting in the month of `start`.
pub fn amortize(loan: &LoanRecord, rate: AnnualRate, start: NaiveDate) -> Schedule {
    amortize_with_cap(loan, rate, start, DEFAULT_MAX_PERIODS)
}

/// Same as [`amortize`] with an explicit ceiling on the number of periods.
pub fn amortize_with_cap(
    loan: &LoanRecord,
    rate: AnnualRate,
    start: NaiveDate,
    max_periods: usize,
) -> Schedule {
    let start = start_of_month(start);
    let monthly_rate = rate.monthly();

    let mut balance = loan.principal;
    let mut cumulative_principal = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;
    let mut periods = Vec::new();
    let mut warning = None;

    while balance > Decimal::ZERO {
        let period_date = match u32::try_from(periods.len())
            .ok()
            .filter(|_| periods.len() < max_periods)
            .and_then(|offset| start.checked_add_months(Months::new(offset)))
        {
            Some(date) => date,
            None => {
                warning = Some(ScheduleWarning::PeriodCapReached { max_periods });
                break;
            }
        };

        // Interest beyond the representable range can never be covered by the payment.
        let Some(mut interest) = balance.checked_mul(monthly_rate).map(round_cents) else {
            warning = Some(ScheduleWarning::NonAmortizingPayment {
                period: periods.len() + 1,
                interest_due: Decimal::MAX,
                monthly_payment: loan.monthly_payment,
            });
            break;
        };
        let mut principal_paid = loan.monthly_payment - interest;

        if principal_paid <= Decimal::ZERO {
            warning = Some(ScheduleWarning::NonAmortizingPayment {
                period: periods.len() + 1,
                interest_due: interest,
                monthly_payment: loan.monthly_payment,
            });
            break;
        }

        // Last partial payment settles the balance without charging interest.
        if balance < principal_paid {
            principal_paid = balance;
            interest = Decimal::ZERO;
            balance = Decimal::ZERO;
        } else {
            balance -= principal_paid;
        }

        cumulative_principal += principal_paid;
        cumulative_interest = cumulative_interest.saturating_add(interest);
        let (principal_share_pct, interest_share_pct) =
            shares(cumulative_principal, cumulative_interest);

        periods.push(AmortizationPeriod {
            period_date,
            loan_id: loan.id.clone(),
            loan_type: loan.loan_type.clone(),
            remaining_balance: balance,
            principal_paid,
            interest_paid: interest,
            cumulative_principal_paid: cumulative_principal,
            cumulative_interest_paid: cumulative_interest,
            principal_share_pct,
            interest_share_pct,
        });
    }

    match &warning {
        Some(w) => warn!(loan_id = %loan.id, %rate, "Schedule truncated: {w}"),
        None => debug!(
            loan_id = %loan.id,
            %rate,
            months = periods.len(),
            "Schedule computed"
        ),
    }

    Schedule {
        loan_id: loan.id.clone(),
        loan_type: loan.loan_type.clone(),
        annual_rate: rate,
        start,
        periods,
        warning,
    }
}

/// Interest is charged in whole cents, half a cent rounding up.
fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn shares(principal: Decimal, interest: Decimal) -> (Decimal, Decimal) {
    // Halving both keeps the ratio when the sum would overflow.
    let (principal, interest) = match principal.checked_add(interest) {
        Some(_) => (principal, interest),
        None => (principal / Decimal::TWO, interest / Decimal::TWO),
    };
    let total = principal + interest;
    if total.is_zero() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let principal_pct = (principal / total * Decimal::ONE_HUNDRED).round_dp(4);
    (principal_pct, Decimal::ONE_HUNDRED - principal_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, monthly_payment: Decimal) -> LoanRecord {
        LoanRecord {
            id: "loan-1".to_string(),
            loan_type: "auto".to_string(),
            principal,
            monthly_payment,
            status: None,
            credit_score: None,
            description: None,
            account_id: None,
        }
    }

    fn rate(r: Decimal) -> AnnualRate {
        AnnualRate::new(r).unwrap()
    }

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_first_period_split() {
        let schedule = amortize(&loan(dec!(20000), dec!(350)), rate(dec!(0.05)), anchor());
        let first = &schedule.periods[0];

        assert_eq!(first.interest_paid, dec!(83.33));
        assert_eq!(first.principal_paid, dec!(266.67));
        assert_eq!(first.remaining_balance, dec!(19733.33));
        assert_eq!(first.period_date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(first.loan_id, "loan-1");
        assert_eq!(first.loan_type, "auto");
    }

    #[test]
    fn test_amortizing_loan_reaches_zero() {
        let schedule = amortize(&loan(dec!(20000), dec!(350)), rate(dec!(0.05)), anchor());

        assert!(schedule.is_paid_off());
        let last = schedule.periods.last().unwrap();
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_eq!(last.interest_paid, Decimal::ZERO);
        assert_eq!(schedule.total_principal(), dec!(20000));
        assert!(schedule.total_interest() > Decimal::ZERO);
        assert_eq!(schedule.payoff_date(), Some(last.period_date));
    }

    #[test]
    fn test_amounts_stay_in_whole_cents() {
        let schedule = amortize(&loan(dec!(250000), dec!(1200)), rate(dec!(0.05)), anchor());
        assert!(schedule.is_paid_off());
        for period in &schedule.periods {
            assert_eq!(period.interest_paid, period.interest_paid.round_dp(2));
            assert_eq!(period.principal_paid, period.principal_paid.round_dp(2));
            assert_eq!(period.remaining_balance, period.remaining_balance.round_dp(2));
            assert_eq!(
                period.cumulative_interest_paid,
                period.cumulative_interest_paid.round_dp(2)
            );
        }
        assert_eq!(schedule.total_principal(), dec!(250000));
    }

    #[test]
    fn test_half_cent_interest_rounds_up() {
        // 1 * 0.06 / 12 == 0.005
        let schedule = amortize(&loan(dec!(1), dec!(0.50)), rate(dec!(0.06)), anchor());
        assert_eq!(schedule.periods[0].interest_paid, dec!(0.01));
        assert_eq!(schedule.periods[0].principal_paid, dec!(0.49));
        assert_eq!(schedule.periods[0].remaining_balance, dec!(0.51));
    }

    #[test]
    fn test_unrepresentable_interest_is_non_amortizing() {
        let principal = Decimal::from_scientific("1e28").unwrap();
        let schedule = amortize(&loan(principal, Decimal::ONE), rate(dec!(120)), anchor());
        assert!(schedule.periods.is_empty());
        assert_eq!(
            schedule.warning,
            Some(ScheduleWarning::NonAmortizingPayment {
                period: 1,
                interest_due: Decimal::MAX,
                monthly_payment: Decimal::ONE,
            })
        );
    }

    #[test]
    fn test_balance_is_non_increasing() {
        let schedule = amortize(&loan(dec!(250000), dec!(1200)), rate(dec!(0.05)), anchor());
        assert!(schedule.is_paid_off());
        for pair in schedule.periods.windows(2) {
            assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
            assert!(pair[1].period_date > pair[0].period_date);
        }
    }

    #[test]
    fn test_shares_sum_to_one_hundred() {
        let schedule = amortize(&loan(dec!(5000), dec!(150)), rate(dec!(0.12)), anchor());
        for period in &schedule.periods {
            assert_eq!(
                period.principal_share_pct + period.interest_share_pct,
                Decimal::ONE_HUNDRED
            );
            assert!(period.principal_paid >= Decimal::ZERO);
            assert!(period.interest_paid >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let schedule = amortize(&loan(dec!(1000), dec!(300)), AnnualRate::ZERO, anchor());
        assert_eq!(schedule.months(), 4);
        assert!(
            schedule
                .periods
                .iter()
                .all(|p| p.interest_paid == Decimal::ZERO)
        );
        assert_eq!(schedule.periods[3].principal_paid, dec!(100));
        assert_eq!(schedule.periods[0].principal_share_pct, Decimal::ONE_HUNDRED);

        let exact = amortize(&loan(dec!(900), dec!(300)), AnnualRate::ZERO, anchor());
        assert_eq!(exact.months(), 3);
        assert_eq!(exact.periods[2].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_principal_yields_empty_schedule() {
        let schedule = amortize(&loan(Decimal::ZERO, dec!(350)), rate(dec!(0.05)), anchor());
        assert!(schedule.periods.is_empty());
        assert!(schedule.warning.is_none());
        assert!(schedule.is_paid_off());
        assert_eq!(schedule.payoff_date(), None);
    }

    #[test]
    fn test_non_amortizing_payment_stops_immediately() {
        let schedule = amortize(&loan(dec!(10000), dec!(10)), rate(dec!(0.10)), anchor());
        assert!(schedule.periods.is_empty());
        match schedule.warning {
            Some(ScheduleWarning::NonAmortizingPayment {
                period,
                interest_due,
                monthly_payment,
            }) => {
                assert_eq!(period, 1);
                assert_eq!(interest_due, dec!(83.33));
                assert_eq!(monthly_payment, dec!(10));
            }
            other => panic!("Expected a non-amortizing warning, got {other:?}"),
        }
        assert!(!schedule.is_paid_off());
        assert_eq!(schedule.payoff_date(), None);
    }

    #[test]
    fn test_payment_equal_to_interest_is_non_amortizing() {
        // 12000 * 0.12 / 12 == 120
        let schedule = amortize(&loan(dec!(12000), dec!(120)), rate(dec!(0.12)), anchor());
        assert!(schedule.periods.is_empty());
        assert!(matches!(
            schedule.warning,
            Some(ScheduleWarning::NonAmortizingPayment { .. })
        ));
    }

    #[test]
    fn test_zero_payment_is_non_amortizing_at_zero_rate() {
        let schedule = amortize(&loan(dec!(100), Decimal::ZERO), AnnualRate::ZERO, anchor());
        assert!(schedule.periods.is_empty());
        assert!(!schedule.is_paid_off());
    }

    #[test]
    fn test_period_cap_truncates() {
        let schedule = amortize_with_cap(
            &loan(dec!(250000), dec!(1200)),
            rate(dec!(0.05)),
            anchor(),
            12,
        );
        assert_eq!(schedule.months(), 12);
        assert_eq!(
            schedule.warning,
            Some(ScheduleWarning::PeriodCapReached { max_periods: 12 })
        );
        assert!(schedule.payoff_date().is_none());
    }

    #[test]
    fn test_idempotent_for_same_anchor() {
        let l = loan(dec!(20000), dec!(350));
        let first = amortize(&l, rate(dec!(0.05)), anchor());
        let second = amortize(&l, rate(dec!(0.05)), anchor());
        assert_eq!(first, second);
    }

    #[test]
    fn test_dates_roll_over_year_end() {
        let start = NaiveDate::from_ymd_opt(2026, 11, 30).unwrap();
        let schedule = amortize(&loan(dec!(300), dec!(100)), AnnualRate::ZERO, start);
        let dates: Vec<_> = schedule.periods.iter().map(|p| p.period_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_warning_messages() {
        let warning = ScheduleWarning::NonAmortizingPayment {
            period: 1,
            interest_due: dec!(83.3333),
            monthly_payment: dec!(10),
        };
        assert_eq!(
            warning.to_string(),
            "payment 10.00 does not cover interest of 83.33 in period 1; raise the payment or lower the rate"
        );
        assert_eq!(
            ScheduleWarning::PeriodCapReached { max_periods: 1200 }.to_string(),
            "not paid off within 1200 months"
        );
    }
}
