pub mod accrual;
pub mod compound;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{PawnError, Result};
use crate::types::InterestType;

pub use accrual::{elapsed_days, elapsed_days_between, AccrualEngine};
pub use compound::{compound_amount, growth_factor};

/// inputs to one accrual calculation, built fresh per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualInput {
    pub principal: Money,
    pub loan_date: NaiveDate,
    /// percent charged per interest month (2.0 == 2%)
    pub monthly_rate_percent: Decimal,
    pub as_of: NaiveDate,
}

impl AccrualInput {
    pub fn new(
        principal: Money,
        loan_date: NaiveDate,
        monthly_rate_percent: Decimal,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            principal,
            loan_date,
            monthly_rate_percent,
            as_of,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(PawnError::invalid_input(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.monthly_rate_percent < Decimal::ZERO {
            return Err(PawnError::invalid_input(format!(
                "monthly interest rate cannot be negative, got {}",
                self.monthly_rate_percent
            )));
        }
        Ok(())
    }

    pub fn monthly_rate(&self) -> Rate {
        Rate::from_percent(self.monthly_rate_percent)
    }
}

/// accrual result consumed by listings, release dialogs and risk checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResult {
    pub principal: Money,
    pub interest: Money,
    pub total_amount: Money,
    pub days: u32,
    pub interest_type: InterestType,
}

/// intermediate figures behind an accrual, for receipts and audits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualBreakdown {
    pub result: AccrualResult,
    pub elapsed_months: Decimal,
    pub monthly_rate: Rate,
    /// set only on the compound branch
    pub capitalization: Option<Capitalization>,
}

/// year-one interest folded into the compounding base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capitalization {
    pub year_one_interest: Money,
    pub compounding_base: Money,
    pub compounding_months: Decimal,
}

/// seam for anything that turns an accrual input into a result
pub trait InterestCalculator {
    fn accrue(&self, input: &AccrualInput) -> Result<AccrualResult>;
}

/// accrue with the standard policy: simple for 12 months of 30 days, monthly compounding after
pub fn compute_accrual(
    principal: Money,
    loan_date: NaiveDate,
    monthly_rate_percent: Decimal,
    as_of: NaiveDate,
) -> Result<AccrualResult> {
    AccrualEngine::standard().compute(&AccrualInput::new(
        principal,
        loan_date,
        monthly_rate_percent,
        as_of,
    ))
}

/// parse a loan or evaluation date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive ISO-8601 datetimes;
/// timestamps are reduced to their UTC calendar day.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.date());
    }

    Err(PawnError::invalid_input(format!("unparsable date: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compute_accrual_simple_scenario() {
        let result = compute_accrual(
            Money::from_major(100_000),
            date(2024, 1, 1),
            dec!(2),
            date(2024, 3, 1),
        )
        .unwrap();

        assert_eq!(result.days, 60);
        assert_eq!(result.interest, Money::from_major(4_000));
        assert_eq!(result.total_amount, Money::from_major(104_000));
        assert_eq!(result.interest_type, InterestType::Simple);
    }

    #[test]
    fn test_zero_principal_is_invalid_input() {
        let err = compute_accrual(Money::ZERO, date(2024, 1, 1), dec!(2), date(2024, 3, 1))
            .unwrap_err();
        assert!(matches!(err, PawnError::InvalidInput { .. }));
    }

    #[test]
    fn test_negative_rate_is_invalid_input() {
        let err = compute_accrual(
            Money::from_major(1_000),
            date(2024, 1, 1),
            dec!(-0.5),
            date(2024, 3, 1),
        )
        .unwrap_err();
        assert!(matches!(err, PawnError::InvalidInput { .. }));
    }

    #[test]
    fn test_result_serializes_with_contract_field_names() {
        let result = compute_accrual(
            Money::from_major(100_000),
            date(2024, 1, 1),
            dec!(2),
            date(2024, 3, 1),
        )
        .unwrap();

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["interest_type"], "simple");
        assert_eq!(json["days"], 60);
        assert!(json.get("total_amount").is_some());
        assert!(json.get("principal").is_some());
        assert!(json.get("interest").is_some());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-15").unwrap(), date(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15T10:30:00+00:00").unwrap(), date(2024, 3, 15));
        assert_eq!(parse_date("2024-03-15T23:30:00-05:00").unwrap(), date(2024, 3, 16));
        assert_eq!(parse_date("2024-03-15T10:30:00.123456").unwrap(), date(2024, 3, 15));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date("15/03/2024"), Err(PawnError::InvalidInput { .. })));
        assert!(matches!(parse_date("2024-02-30"), Err(PawnError::InvalidInput { .. })));
        assert!(parse_date("").is_err());
    }
}
