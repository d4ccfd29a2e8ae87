use crate::decimal::{Money, Rate};
use crate::errors::{PawnError, Result};
use crate::types::{LtvStatus, LtvThresholds};

/// loan-to-value checks against the pledge
#[derive(Debug, Clone, Copy)]
pub struct LtvCalculator {
    thresholds: LtvThresholds,
}

impl LtvCalculator {
    pub fn new(thresholds: LtvThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> LtvThresholds {
        self.thresholds
    }

    /// amount due over pledge value
    pub fn calculate_ltv(&self, amount_due: Money, collateral_value: Money) -> Result<Rate> {
        if !collateral_value.is_positive() {
            return Err(PawnError::InvalidCollateral {
                message: "collateral value must be positive to compute ltv".to_string(),
            });
        }

        Ok(Rate::from_decimal(
            amount_due.as_decimal() / collateral_value.as_decimal(),
        ))
    }

    pub fn status(&self, ltv: Rate) -> LtvStatus {
        if ltv >= self.thresholds.critical_ltv {
            LtvStatus::Critical
        } else if ltv >= self.thresholds.warning_ltv {
            LtvStatus::Warning
        } else {
            LtvStatus::Healthy
        }
    }

    /// ltv and status in one step
    pub fn assess(&self, amount_due: Money, collateral_value: Money) -> Result<(Rate, LtvStatus)> {
        let ltv = self.calculate_ltv(amount_due, collateral_value)?;
        Ok((ltv, self.status(ltv)))
    }

    /// payment needed to bring the loan back to `target_ltv`
    pub fn required_payment(
        &self,
        amount_due: Money,
        collateral_value: Money,
        target_ltv: Rate,
    ) -> Money {
        let target_due = Money::from_decimal(collateral_value.as_decimal() * target_ltv.as_decimal());
        amount_due.saturating_sub(target_due)
    }

    /// largest principal the pledge supports at the warning threshold
    pub fn max_advance(&self, collateral_value: Money) -> Money {
        Money::from_decimal(collateral_value.as_decimal() * self.thresholds.warning_ltv.as_decimal())
            .round_currency()
    }
}
