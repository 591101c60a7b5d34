//! Loan and account records normalized from banking API responses

use crate::core::error::LoanError;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

/// A raw JSON object as returned by the banking API.
pub type RawRecord = Map<String, Value>;

/// A loan as seen by the amortization engine.
///
/// `status` and `credit_score` are descriptive only and are carried through
/// untouched for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanRecord {
    pub id: String,
    pub loan_type: String,
    pub principal: Decimal,
    pub monthly_payment: Decimal,
    pub status: Option<String>,
    pub credit_score: Option<i64>,
    pub description: Option<String>,
    pub account_id: Option<String>,
}

impl LoanRecord {
    /// Builds a loan from a raw API mapping.
    ///
    /// `_id`, `amount` and `monthly_payment` are required; amounts must be
    /// numeric and non-negative. Nothing is coerced to zero.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, LoanError> {
        let id = required_str(raw, "_id")?;
        let principal = required_amount(raw, "amount")?;
        let monthly_payment = required_amount(raw, "monthly_payment")?;

        Ok(LoanRecord {
            id,
            loan_type: optional_str(raw, "type").unwrap_or_else(|| "other".to_string()),
            principal,
            monthly_payment,
            status: optional_str(raw, "status"),
            credit_score: raw.get("credit_score").and_then(Value::as_i64),
            description: optional_str(raw, "description"),
            account_id: None,
        })
    }

    pub fn with_account(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    /// Human readable label, e.g. `auto loan (64f0...)`.
    pub fn label(&self) -> String {
        format!("{} loan ({})", self.loan_type, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRecord {
    pub id: String,
    pub balance: Decimal,
    pub nickname: Option<String>,
    pub account_type: Option<String>,
}

impl AccountRecord {
    /// Builds an account from a raw API mapping. `_id` and `balance` are required.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, LoanError> {
        let id = required_str(raw, "_id")?;
        let balance = number(raw, "balance")?;
        Ok(AccountRecord {
            id,
            balance,
            nickname: optional_str(raw, "nickname"),
            account_type: optional_str(raw, "type"),
        })
    }
}

fn required_str(raw: &RawRecord, field: &'static str) -> Result<String, LoanError> {
    match raw.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(LoanError::malformed(field, "is empty")),
        Some(other) => Err(LoanError::malformed(
            field,
            format!("expected a string, got {other}"),
        )),
        None => Err(LoanError::malformed(field, "is missing")),
    }
}

fn optional_str(raw: &RawRecord, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

fn number(raw: &RawRecord, field: &'static str) -> Result<Decimal, LoanError> {
    let value = raw
        .get(field)
        .ok_or_else(|| LoanError::malformed(field, "is missing"))?;
    let amount = match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        _ => None,
    };
    amount.ok_or_else(|| LoanError::malformed(field, format!("expected a number, got {value}")))
}

fn required_amount(raw: &RawRecord, field: &'static str) -> Result<Decimal, LoanError> {
    let amount = number(raw, field)?;
    if amount < Decimal::ZERO {
        return Err(LoanError::malformed(
            field,
            format!("must not be negative, got {amount}"),
        ));
    }
    Ok(amount)
}

/// A validated annual interest rate expressed as a fraction (`0.05` is 5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct AnnualRate(Decimal);

impl AnnualRate {
    pub const ZERO: AnnualRate = AnnualRate(Decimal::ZERO);

    pub fn new(rate: Decimal) -> Result<Self, LoanError> {
        if rate < Decimal::ZERO {
            return Err(LoanError::InvalidRate(rate.to_string()));
        }
        Ok(AnnualRate(rate.normalize()))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Monthly compounding rate, `annual / 12`.
    pub fn monthly(&self) -> Decimal {
        self.0 / Decimal::from(12)
    }

    pub fn as_percent(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }
}

impl TryFrom<Decimal> for AnnualRate {
    type Error = LoanError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        AnnualRate::new(value)
    }
}

impl From<AnnualRate> for Decimal {
    fn from(rate: AnnualRate) -> Self {
        rate.0
    }
}

impl FromStr for AnnualRate {
    type Err = LoanError;

    /// Accepts a fraction (`0.05`) or a percentage (`5%`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (digits, is_percent) = match trimmed.strip_suffix('%') {
            Some(rest) => (rest.trim(), true),
            None => (trimmed, false),
        };
        let value =
            Decimal::from_str(digits).map_err(|_| LoanError::InvalidRate(s.to_string()))?;
        let value = if is_percent {
            value / Decimal::ONE_HUNDRED
        } else {
            value
        };
        AnnualRate::new(value).map_err(|_| LoanError::InvalidRate(s.to_string()))
    }
}

impl Display for AnnualRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.as_percent())
    }
}
