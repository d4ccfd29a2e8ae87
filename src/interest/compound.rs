use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::Rate;
use crate::errors::{PawnError, Result};

/// growth factor `(1 + rate)^periods` for a non-negative, possibly fractional, period count.
///
/// Whole periods are raised exactly; only the fractional remainder goes
/// through the logarithmic power, so whole-month results carry no
/// approximation error.
pub fn growth_factor(rate: Rate, periods: Decimal) -> Result<Decimal> {
    if periods < Decimal::ZERO {
        return Err(PawnError::invalid_input(format!(
            "compounding periods cannot be negative, got {periods}"
        )));
    }
    if rate.is_negative() {
        return Err(PawnError::invalid_input(format!(
            "compounding rate cannot be negative, got {rate}"
        )));
    }
    if periods.is_zero() || rate.as_decimal().is_zero() {
        return Ok(Decimal::ONE);
    }

    let base = Decimal::ONE + rate.as_decimal();
    let whole = periods.trunc();
    let fraction = periods - whole;

    let whole_periods = whole.to_u64().ok_or_else(|| overflow(periods))?;
    let mut factor = base
        .checked_powu(whole_periods)
        .ok_or_else(|| overflow(periods))?;

    if !fraction.is_zero() {
        let partial = base
            .checked_powd(fraction)
            .ok_or_else(|| overflow(periods))?;
        factor = factor.checked_mul(partial).ok_or_else(|| overflow(periods))?;
    }

    Ok(factor)
}

/// `base * (1 + rate)^periods`
pub fn compound_amount(base: Decimal, rate: Rate, periods: Decimal) -> Result<Decimal> {
    let factor = growth_factor(rate, periods)?;
    base.checked_mul(factor).ok_or_else(|| overflow(periods))
}

fn overflow(periods: Decimal) -> PawnError {
    PawnError::CalculationError {
        message: format!("compounding overflowed over {periods} periods"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_periods_are_exact() {
        let factor = growth_factor(Rate::from_percentage(1), dec!(6)).unwrap();
        assert_eq!(factor, dec!(1.061520150601));
    }

    #[test]
    fn test_zero_periods_is_identity() {
        assert_eq!(growth_factor(Rate::from_percentage(3), Decimal::ZERO).unwrap(), Decimal::ONE);
        assert_eq!(
            compound_amount(dec!(112000), Rate::from_percentage(1), Decimal::ZERO).unwrap(),
            dec!(112000)
        );
    }

    #[test]
    fn test_zero_rate_never_grows() {
        assert_eq!(growth_factor(Rate::ZERO, dec!(7.5)).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_fractional_periods_sit_between_neighbours() {
        let rate = Rate::from_percentage(2);
        let two = growth_factor(rate, dec!(2)).unwrap();
        let two_and_half = growth_factor(rate, dec!(2.5)).unwrap();
        let three = growth_factor(rate, dec!(3)).unwrap();

        assert!(two < two_and_half && two_and_half < three);
        // 1.02^2.5 = 1.0404 * sqrt(1.02) = 1.05075249...
        assert!((two_and_half - dec!(1.0507525)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_negative_periods_rejected() {
        assert!(matches!(
            growth_factor(Rate::from_percentage(1), dec!(-1)),
            Err(PawnError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_compound_amount() {
        let amount = compound_amount(dec!(112000), Rate::from_percentage(1), dec!(6)).unwrap();
        assert_eq!(amount.round_dp(2), dec!(118890.26));
    }
}
