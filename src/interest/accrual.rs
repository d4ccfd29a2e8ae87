use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::AccrualConfig;
use crate::decimal::Money;
use crate::errors::{PawnError, Result};
use crate::interest::compound::compound_amount;
use crate::interest::{
    AccrualBreakdown, AccrualInput, AccrualResult, Capitalization, InterestCalculator,
};
use crate::types::InterestType;

/// whole days from `start` to `end`, zero when `end` precedes `start`
pub fn elapsed_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// whole days between two instants, floored, zero when `end` precedes `start`
pub fn elapsed_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let days = (end - start).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// tiered accrual engine: simple interest through the simple period, then
/// monthly compounding on the capitalized year-one balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccrualEngine {
    pub config: AccrualConfig,
}

impl AccrualEngine {
    pub fn new(config: AccrualConfig) -> Self {
        Self { config }
    }

    /// 30-day months, 12 months simple, 2 decimal places
    pub fn standard() -> Self {
        Self::new(AccrualConfig::default())
    }

    /// continuous month count; no truncation so there is no cliff at each month end
    pub fn elapsed_months(&self, days: u32) -> Decimal {
        Decimal::from(days) / Decimal::from(self.config.days_per_month.max(1))
    }

    /// accrue as of an explicit date
    pub fn compute(&self, input: &AccrualInput) -> Result<AccrualResult> {
        Ok(self.breakdown(input)?.result)
    }

    /// accrue as of the provider's current UTC date
    pub fn compute_at(
        &self,
        principal: Money,
        loan_date: NaiveDate,
        monthly_rate_percent: Decimal,
        time_provider: &SafeTimeProvider,
    ) -> Result<AccrualResult> {
        let as_of = time_provider.now().date_naive();
        self.compute(&AccrualInput::new(principal, loan_date, monthly_rate_percent, as_of))
    }

    /// accrue and keep the intermediate figures
    pub fn breakdown(&self, input: &AccrualInput) -> Result<AccrualBreakdown> {
        input.validate()?;

        let days = elapsed_days(input.loan_date, input.as_of);
        let months = self.elapsed_months(days);
        let rate = input.monthly_rate();
        let principal = input.principal.as_decimal();
        let simple_period = Decimal::from(self.config.simple_period_months);

        let (raw_interest, interest_type, capitalization) = if months <= simple_period {
            let interest = simple_interest(principal, rate.as_decimal(), months)?;
            (interest, InterestType::Simple, None)
        } else {
            let year_one_interest = simple_interest(principal, rate.as_decimal(), simple_period)?;
            let compounding_base = principal
                .checked_add(year_one_interest)
                .ok_or_else(|| overflow("capitalizing year-one interest"))?;
            let compounding_months = months - simple_period;
            let amount = compound_amount(compounding_base, rate, compounding_months)?;

            let capitalization = Capitalization {
                year_one_interest: Money::from_decimal(year_one_interest),
                compounding_base: Money::from_decimal(compounding_base),
                compounding_months,
            };
            (amount - principal, InterestType::Compound, Some(capitalization))
        };

        let interest = self.round_interest(raw_interest);
        let total_amount = principal
            .checked_add(interest)
            .ok_or_else(|| overflow("adding interest to principal"))?;

        Ok(AccrualBreakdown {
            result: AccrualResult {
                principal: input.principal,
                interest: Money::from_decimal(interest),
                total_amount: Money::from_decimal(total_amount),
                days,
                interest_type,
            },
            elapsed_months: months,
            monthly_rate: rate,
            capitalization,
        })
    }

    fn round_interest(&self, raw: Decimal) -> Decimal {
        raw.max(Decimal::ZERO).round_dp_with_strategy(
            self.config.currency_scale,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

fn simple_interest(principal: Decimal, rate: Decimal, months: Decimal) -> Result<Decimal> {
    principal
        .checked_mul(rate)
        .and_then(|per_month| per_month.checked_mul(months))
        .ok_or_else(|| overflow("simple interest"))
}

fn overflow(step: &str) -> PawnError {
    PawnError::CalculationError {
        message: format!("arithmetic overflow in {step}"),
    }
}

impl InterestCalculator for AccrualEngine {
    fn accrue(&self, input: &AccrualInput) -> Result<AccrualResult> {
        self.compute(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PawnError;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input_after_days(principal: i64, rate: Decimal, days: i64) -> AccrualInput {
        let loan_date = date(2024, 1, 1);
        AccrualInput::new(
            Money::from_major(principal),
            loan_date,
            rate,
            loan_date + Duration::days(days),
        )
    }

    #[test]
    fn test_elapsed_days_clamps_backdated_evaluation() {
        assert_eq!(elapsed_days(date(2024, 1, 1), date(2024, 3, 1)), 60);
        assert_eq!(elapsed_days(date(2024, 3, 1), date(2024, 1, 1)), 0);
        assert_eq!(elapsed_days(date(2024, 3, 1), date(2024, 3, 1)), 0);
    }

    #[test]
    fn test_elapsed_days_between_floors_partial_days() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 17, 59, 59).unwrap();
        assert_eq!(elapsed_days_between(start, end), 1);
        assert_eq!(elapsed_days_between(end, start), 0);
    }

    #[test]
    fn test_same_day_accrues_nothing() {
        let engine = AccrualEngine::standard();
        let result = engine.compute(&input_after_days(50_000, dec!(2), 0)).unwrap();

        assert_eq!(result.days, 0);
        assert_eq!(result.interest, Money::ZERO);
        assert_eq!(result.total_amount, Money::from_major(50_000));
        assert_eq!(result.interest_type, InterestType::Simple);
    }

    #[test]
    fn test_backdated_evaluation_clamps_to_zero() {
        let engine = AccrualEngine::standard();
        let result = engine.compute(&input_after_days(50_000, dec!(2), -15)).unwrap();

        assert_eq!(result.days, 0);
        assert_eq!(result.interest, Money::ZERO);
    }

    #[test]
    fn test_simple_interest_two_months() {
        let engine = AccrualEngine::standard();
        let result = engine.compute(&input_after_days(100_000, dec!(2), 60)).unwrap();

        assert_eq!(result.days, 60);
        assert_eq!(result.interest, Money::from_major(4_000));
        assert_eq!(result.total_amount, Money::from_major(104_000));
        assert_eq!(result.interest_type, InterestType::Simple);
    }

    #[test]
    fn test_partial_month_is_not_truncated() {
        let engine = AccrualEngine::standard();
        // 45 days = 1.5 months at 2% on 10 000
        let result = engine.compute(&input_after_days(10_000, dec!(2), 45)).unwrap();
        assert_eq!(result.interest, Money::from_major(300));
    }

    #[test]
    fn test_compound_after_eighteen_months() {
        let engine = AccrualEngine::standard();
        let breakdown = engine.breakdown(&input_after_days(100_000, dec!(1), 540)).unwrap();
        let result = breakdown.result;

        assert_eq!(result.days, 540);
        assert_eq!(breakdown.elapsed_months, dec!(18));
        assert_eq!(result.interest_type, InterestType::Compound);

        let capitalization = breakdown.capitalization.unwrap();
        assert_eq!(capitalization.year_one_interest, Money::from_major(12_000));
        assert_eq!(capitalization.compounding_base, Money::from_major(112_000));
        assert_eq!(capitalization.compounding_months, dec!(6));

        // 112 000 * 1.01^6 = 118 890.2569
        assert_eq!(result.interest, Money::from_str_exact("18890.26").unwrap());
        assert_eq!(result.total_amount, Money::from_str_exact("118890.26").unwrap());
    }

    #[test]
    fn test_branches_agree_at_twelve_months() {
        let engine = AccrualEngine::standard();
        let input = input_after_days(100_000, dec!(1.5), 360);

        let at_boundary = engine.breakdown(&input).unwrap();
        assert_eq!(at_boundary.result.interest_type, InterestType::Simple);
        assert!(at_boundary.capitalization.is_none());

        // compound formula evaluated with zero compounding months
        let principal = input.principal.as_decimal();
        let year_one = principal * dec!(0.015) * dec!(12);
        let compound = compound_amount(principal + year_one, input.monthly_rate(), Decimal::ZERO)
            .unwrap()
            - principal;

        assert_eq!(at_boundary.result.interest.as_decimal(), compound.round_dp(2));
        assert_eq!(at_boundary.result.interest, Money::from_major(18_000));
    }

    #[test]
    fn test_first_compound_day_continues_from_boundary() {
        let engine = AccrualEngine::standard();
        let at_boundary = engine.compute(&input_after_days(100_000, dec!(2), 360)).unwrap();
        let next_day = engine.compute(&input_after_days(100_000, dec!(2), 361)).unwrap();

        assert_eq!(next_day.interest_type, InterestType::Compound);
        assert!(next_day.interest > at_boundary.interest);
        // one day of growth on 124 000 at 2% a month is roughly 82
        let step = next_day.interest - at_boundary.interest;
        assert!(step > Money::from_major(81) && step < Money::from_major(84));
    }

    #[test]
    fn test_interest_never_decreases_as_days_pass() {
        let engine = AccrualEngine::standard();
        let mut previous = Money::ZERO;

        for days in 0..=900 {
            let result = engine.compute(&input_after_days(75_000, dec!(2.5), days)).unwrap();
            assert!(result.interest >= previous, "interest fell on day {days}");
            assert_eq!(result.total_amount, result.principal + result.interest);
            previous = result.interest;
        }
    }

    #[test]
    fn test_zero_rate_accrues_nothing_in_either_branch() {
        let engine = AccrualEngine::standard();
        for days in [0, 200, 360, 361, 1_000] {
            let result = engine.compute(&input_after_days(20_000, Decimal::ZERO, days)).unwrap();
            assert_eq!(result.interest, Money::ZERO);
        }
    }

    #[test]
    fn test_invalid_principal_rejected() {
        let engine = AccrualEngine::standard();
        let mut input = input_after_days(1, dec!(2), 30);
        input.principal = Money::ZERO;
        assert!(matches!(engine.compute(&input), Err(PawnError::InvalidInput { .. })));

        input.principal = Money::from_major(-500);
        assert!(matches!(engine.compute(&input), Err(PawnError::InvalidInput { .. })));
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let engine = AccrualEngine::standard();
        let huge = Money::from_str_exact("1000000000000000000000000000").unwrap();

        let simple = AccrualInput::new(huge, date(2024, 1, 1), dec!(1000), date(2024, 12, 26));
        assert!(matches!(engine.compute(&simple), Err(PawnError::CalculationError { .. })));

        assert!(matches!(
            crate::interest::compute_accrual(huge, date(2024, 1, 1), dec!(1000), date(2025, 1, 1)),
            Err(PawnError::CalculationError { .. })
        ));
    }

    #[test]
    fn test_custom_month_length() {
        let engine = AccrualEngine::new(AccrualConfig {
            days_per_month: 31,
            ..AccrualConfig::default()
        });
        let result = engine.compute(&input_after_days(31_000, dec!(1), 62)).unwrap();
        assert_eq!(result.interest, Money::from_major(620));
    }

    #[test]
    fn test_compute_at_reads_injected_clock() {
        let engine = AccrualEngine::standard();
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        let control = time.test_control().unwrap();
        let loan_date = date(2024, 1, 1);

        let today = engine
            .compute_at(Money::from_major(30_000), loan_date, dec!(2), &time)
            .unwrap();
        assert_eq!(today.days, 0);

        control.advance(Duration::days(90));
        let later = engine
            .compute_at(Money::from_major(30_000), loan_date, dec!(2), &time)
            .unwrap();
        assert_eq!(later.days, 90);
        assert_eq!(later.interest, Money::from_major(1_800));
    }
}
