use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Rate, CURRENCY_SCALE};
use crate::errors::{PawnError, Result};
use crate::types::LtvThresholds;

/// top-level configuration for a pawn book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PawnConfig {
    pub accrual: AccrualConfig,
    pub risk: RiskConfig,
    pub book: BookConfig,
}

/// interest accrual policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualConfig {
    /// days that make one interest month
    pub days_per_month: u32,
    /// months charged at simple interest before compounding starts
    pub simple_period_months: u32,
    /// decimal places interest is rounded to
    pub currency_scale: u32,
}

/// overdue and collateral-coverage policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// days after the loan date before a loan counts as overdue
    pub grace_period_days: u32,
    /// overdue days after which a loan is flagged high risk
    pub high_risk_after_days: u32,
    pub ltv_thresholds: LtvThresholds,
}

/// book-keeping defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookConfig {
    /// monthly rate (percent) applied when a loan does not carry one
    pub default_monthly_rate: Decimal,
    /// fixed monthly rate (percent) for dashboard "interest potential"
    pub potential_monthly_rate: Decimal,
    pub serial_prefix: String,
    pub serial_start: u32,
    /// number of recent loans/payments on the dashboard
    pub recent_window: usize,
    /// allow cash in hand to go negative on disbursement
    pub allow_cash_overdraw: bool,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            days_per_month: 30,
            simple_period_months: 12,
            currency_scale: CURRENCY_SCALE,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            grace_period_days: 30,
            high_risk_after_days: 90,
            ltv_thresholds: LtvThresholds {
                warning_ltv: Rate::from_percentage(80),
                critical_ltv: Rate::from_percentage(100),
            },
        }
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            default_monthly_rate: dec!(2.0),
            potential_monthly_rate: dec!(2.0),
            serial_prefix: "A".to_string(),
            serial_start: 150,
            recent_window: 5,
            allow_cash_overdraw: false,
        }
    }
}

impl Default for PawnConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PawnConfig {
    /// year one simple, compound after, 2% a month, 30 day grace
    pub fn standard() -> Self {
        Self {
            accrual: AccrualConfig::default(),
            risk: RiskConfig::default(),
            book: BookConfig::default(),
        }
    }

    /// silver counters run tighter margins on metal value
    pub fn silver_counter() -> Self {
        let mut config = Self::standard();
        config.book.default_monthly_rate = dec!(3.0);
        config.risk.ltv_thresholds = LtvThresholds {
            warning_ltv: Rate::from_percentage(70),
            critical_ltv: Rate::from_percentage(90),
        };
        config
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PawnConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.accrual.validate()?;

        if self.book.default_monthly_rate < Decimal::ZERO {
            return Err(invalid("default monthly rate cannot be negative"));
        }
        if self.book.potential_monthly_rate < Decimal::ZERO {
            return Err(invalid("potential monthly rate cannot be negative"));
        }
        if self.book.serial_prefix.trim().is_empty() {
            return Err(invalid("serial prefix cannot be empty"));
        }

        let thresholds = self.risk.ltv_thresholds;
        if thresholds.warning_ltv.as_decimal() <= Decimal::ZERO
            || thresholds.warning_ltv > thresholds.critical_ltv
        {
            return Err(invalid("ltv thresholds must satisfy 0 < warning <= critical"));
        }

        Ok(())
    }
}

impl AccrualConfig {
    pub fn validate(&self) -> Result<()> {
        if self.days_per_month == 0 {
            return Err(invalid("days per month must be positive"));
        }
        if self.currency_scale > 8 {
            return Err(invalid("currency scale above 8 places is not supported"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> PawnError {
    PawnError::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defaults() {
        let config = PawnConfig::standard();

        assert_eq!(config.accrual.days_per_month, 30);
        assert_eq!(config.accrual.simple_period_months, 12);
        assert_eq!(config.risk.grace_period_days, 30);
        assert_eq!(config.book.default_monthly_rate, dec!(2.0));
        assert_eq!(config.book.serial_prefix, "A");
        assert_eq!(config.book.serial_start, 150);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_overrides() {
        let mut config = PawnConfig::silver_counter();
        config.risk.grace_period_days = 45;

        let json = config.to_json().unwrap();
        let restored = PawnConfig::from_json(&json).unwrap();

        assert_eq!(restored, config);
        assert_eq!(restored.book.default_monthly_rate, dec!(3.0));
    }

    #[test]
    fn test_rejects_zero_day_month() {
        let mut config = PawnConfig::standard();
        config.accrual.days_per_month = 0;

        assert!(matches!(
            config.validate(),
            Err(PawnError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_ltv_thresholds() {
        let mut config = PawnConfig::standard();
        config.risk.ltv_thresholds.warning_ltv = Rate::from_percentage(95);
        config.risk.ltv_thresholds.critical_ltv = Rate::from_percentage(90);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        assert!(matches!(
            PawnConfig::from_json("{ not json"),
            Err(PawnError::Serialization(_))
        ));
    }
}
