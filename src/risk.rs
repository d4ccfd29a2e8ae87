use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collateral::{LtvCalculator, MetalRates};
use crate::config::RiskConfig;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::InterestCalculator;
use crate::loan::PawnLoan;
use crate::types::{LoanId, LoanStatus, LtvStatus, RiskLevel};

/// follow-up view of one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub loan_id: LoanId,
    pub serial_no: String,
    pub customer_name: String,
    /// days since interest was last settled
    pub days: u32,
    pub days_overdue: u32,
    pub level: RiskLevel,
    pub total_due: Money,
    /// none when the pledge has no value to measure against
    pub ltv: Option<Rate>,
    pub ltv_status: Option<LtvStatus>,
    /// payment that brings ltv back down to the warning line
    pub cure_payment: Option<Money>,
}

/// engine for flagging loans that need follow-up
#[derive(Debug, Clone, Copy)]
pub struct RiskClassifier {
    pub config: RiskConfig,
}

impl RiskClassifier {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// days past the grace period, zero inside it
    pub fn days_overdue(&self, days: u32) -> u32 {
        days.saturating_sub(self.config.grace_period_days)
    }

    /// status an open loan should carry after `days` without settling interest
    pub fn status_for(&self, days: u32) -> LoanStatus {
        if self.days_overdue(days) > 0 {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }

    pub fn level(&self, days: u32, ltv_status: Option<LtvStatus>) -> RiskLevel {
        let overdue = self.days_overdue(days);

        if overdue > self.config.high_risk_after_days || ltv_status == Some(LtvStatus::Critical) {
            RiskLevel::HighRisk
        } else if overdue > 0 {
            RiskLevel::Overdue
        } else {
            RiskLevel::Current
        }
    }

    pub fn assess(
        &self,
        loan: &PawnLoan,
        engine: &impl InterestCalculator,
        as_of: NaiveDate,
        rates: Option<&MetalRates>,
    ) -> Result<RiskAssessment> {
        let balance = loan.balance(engine, as_of)?;
        let days = balance.accrual.days;

        let collateral_value = loan.collateral_value(rates);
        let (ltv, ltv_status, cure_payment) = if collateral_value.is_positive() {
            let calculator = LtvCalculator::new(self.config.ltv_thresholds);
            let (ltv, status) = calculator.assess(balance.total_due, collateral_value)?;
            let cure = calculator.required_payment(
                balance.total_due,
                collateral_value,
                self.config.ltv_thresholds.warning_ltv,
            );
            (Some(ltv), Some(status), Some(cure))
        } else {
            (None, None, None)
        };

        Ok(RiskAssessment {
            loan_id: loan.id,
            serial_no: loan.serial_no.clone(),
            customer_name: loan.customer_name.clone(),
            days,
            days_overdue: self.days_overdue(days),
            level: self.level(days, ltv_status),
            total_due: balance.total_due,
            ltv,
            ltv_status,
            cure_payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::CollateralItem;
    use crate::interest::AccrualEngine;
    use crate::types::Metal;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn classifier() -> RiskClassifier {
        RiskClassifier::new(RiskConfig::default())
    }

    fn loan_with_value(principal: i64, value: i64) -> PawnLoan {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        ));
        PawnLoan::builder()
            .serial_no("A160")
            .customer(Uuid::new_v4(), "Meena")
            .principal(Money::from_major(principal))
            .monthly_rate(dec!(2))
            .loan_date(date(2024, 1, 1))
            .item(CollateralItem::new(1, "Bangle", Metal::Gold, dec!(30), dec!(91.6), Money::from_major(value)).unwrap())
            .build_with_time(&time)
            .unwrap()
    }

    #[test]
    fn test_days_overdue_after_grace() {
        let classifier = classifier();
        assert_eq!(classifier.days_overdue(0), 0);
        assert_eq!(classifier.days_overdue(30), 0);
        assert_eq!(classifier.days_overdue(31), 1);
        assert_eq!(classifier.days_overdue(75), 45);
    }

    #[test]
    fn test_levels() {
        let classifier = classifier();
        assert_eq!(classifier.level(10, None), RiskLevel::Current);
        assert_eq!(classifier.level(45, None), RiskLevel::Overdue);
        assert_eq!(classifier.level(120, Some(LtvStatus::Healthy)), RiskLevel::Overdue);
        assert_eq!(classifier.level(121, None), RiskLevel::HighRisk);
        assert_eq!(classifier.level(5, Some(LtvStatus::Critical)), RiskLevel::HighRisk);
    }

    #[test]
    fn test_status_follows_grace_period() {
        let classifier = classifier();
        assert_eq!(classifier.status_for(30), LoanStatus::Active);
        assert_eq!(classifier.status_for(31), LoanStatus::Overdue);
    }

    #[test]
    fn test_assess_measures_ltv_on_total_due() {
        let loan = loan_with_value(80_000, 100_000);
        let assessment = classifier()
            .assess(&loan, &AccrualEngine::standard(), date(2024, 3, 1), None)
            .unwrap();

        // 80 000 + 3 200 interest over 60 days
        assert_eq!(assessment.days, 60);
        assert_eq!(assessment.days_overdue, 30);
        assert_eq!(assessment.total_due, Money::from_major(83_200));
        assert_eq!(assessment.ltv.unwrap().as_decimal(), dec!(0.832));
        assert_eq!(assessment.ltv_status, Some(LtvStatus::Warning));
        assert_eq!(assessment.level, RiskLevel::Overdue);
        assert_eq!(assessment.cure_payment, Some(Money::from_major(3_200)));
    }

    #[test]
    fn test_assess_underwater_pledge_is_high_risk() {
        let loan = loan_with_value(100_000, 90_000);
        let assessment = classifier()
            .assess(&loan, &AccrualEngine::standard(), date(2024, 1, 10), None)
            .unwrap();

        assert_eq!(assessment.days_overdue, 0);
        assert_eq!(assessment.ltv_status, Some(LtvStatus::Critical));
        assert_eq!(assessment.level, RiskLevel::HighRisk);
        // 100 600 due against a 72 000 warning line
        assert_eq!(assessment.cure_payment, Some(Money::from_major(28_600)));
    }

    #[test]
    fn test_assess_without_collateral_value() {
        let loan = loan_with_value(10_000, 0);
        let assessment = classifier()
            .assess(&loan, &AccrualEngine::standard(), date(2024, 1, 10), None)
            .unwrap();

        assert!(assessment.ltv.is_none());
        assert!(assessment.cure_payment.is_none());
        assert_eq!(assessment.level, RiskLevel::Current);
    }
}
