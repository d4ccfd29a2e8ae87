pub mod waterfall;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PawnError, Result};
use crate::types::{LoanId, PaymentKind};

pub use waterfall::{PaymentComponent, PaymentProcessor, PaymentWaterfall};

/// payment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub amount: Money,
    pub kind: PaymentKind,
    /// defaults to today when absent
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn new(loan_id: LoanId, amount: Money, kind: PaymentKind) -> Self {
        Self {
            loan_id,
            amount,
            kind,
            payment_date: None,
            notes: None,
        }
    }

    pub fn on(mut self, payment_date: NaiveDate) -> Self {
        self.payment_date = Some(payment_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// balances a payment is applied against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentContext {
    pub loan_id: LoanId,
    pub interest_due: Money,
    pub outstanding_principal: Money,
}

impl PaymentContext {
    pub fn total_due(&self) -> Money {
        self.interest_due + self.outstanding_principal
    }

    pub fn is_settled(&self) -> bool {
        self.interest_due.is_zero() && self.outstanding_principal.is_zero()
    }

    pub fn validate_payment(&self, amount: Money, kind: PaymentKind) -> Result<()> {
        if !amount.is_positive() {
            return Err(PawnError::InvalidPaymentAmount { amount });
        }

        if kind == PaymentKind::FullRelease && amount < self.total_due() {
            return Err(PawnError::PaymentBelowRelease {
                required: self.total_due(),
                provided: amount,
            });
        }

        Ok(())
    }
}

/// payment as recorded against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub loan_serial_no: String,
    pub customer_name: String,
    /// amount tendered at the counter
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub payment_type: String,
    pub kind: PaymentKind,
    pub principal_paid: Money,
    pub interest_paid: Money,
    /// change handed back
    pub excess: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn context() -> PaymentContext {
        PaymentContext {
            loan_id: Uuid::new_v4(),
            interest_due: Money::from_major(4_000),
            outstanding_principal: Money::from_major(100_000),
        }
    }

    #[test]
    fn test_payment_context_validation() {
        let context = context();

        assert!(matches!(
            context.validate_payment(Money::ZERO, PaymentKind::Interest),
            Err(PawnError::InvalidPaymentAmount { .. })
        ));
        assert!(matches!(
            context.validate_payment(Money::from_major(-5), PaymentKind::Both),
            Err(PawnError::InvalidPaymentAmount { .. })
        ));
        assert!(context.validate_payment(Money::from_major(500), PaymentKind::Interest).is_ok());
    }

    #[test]
    fn test_full_release_needs_total_due() {
        let context = context();
        assert_eq!(context.total_due(), Money::from_major(104_000));

        let short = Money::from_decimal(dec!(103999.99));
        assert!(matches!(
            context.validate_payment(short, PaymentKind::FullRelease),
            Err(PawnError::PaymentBelowRelease { .. })
        ));
        assert!(context
            .validate_payment(Money::from_major(104_000), PaymentKind::FullRelease)
            .is_ok());
    }

    #[test]
    fn test_request_builder() {
        let loan_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let request = PaymentRequest::new(loan_id, Money::from_major(1_000), PaymentKind::Both)
            .on(date)
            .with_notes("paid by son");

        assert_eq!(request.payment_date, Some(date));
        assert_eq!(request.notes.as_deref(), Some("paid by son"));
    }
}
