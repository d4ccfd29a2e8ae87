use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{PaymentApplication, PaymentKind};

use super::PaymentContext;

/// balance a payment can be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentComponent {
    Interest,
    Principal,
}

/// order in which balances absorb a payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWaterfall {
    pub components: Vec<PaymentComponent>,
}

impl PaymentWaterfall {
    /// waterfall for the kind of payment the customer asked for
    pub fn for_kind(kind: PaymentKind) -> Self {
        let components = match kind {
            PaymentKind::Interest => vec![PaymentComponent::Interest],
            PaymentKind::Principal => vec![PaymentComponent::Principal],
            PaymentKind::Both | PaymentKind::FullRelease => {
                vec![PaymentComponent::Interest, PaymentComponent::Principal]
            }
        };
        Self { components }
    }
}

/// payment processor
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentProcessor;

impl PaymentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// split `amount` across the context balances; balances are reduced in place
    pub fn allocate(
        &self,
        amount: Money,
        kind: PaymentKind,
        context: &mut PaymentContext,
    ) -> Result<PaymentApplication> {
        context.validate_payment(amount, kind)?;

        let mut remaining = amount;
        let mut application = PaymentApplication::default();

        for component in PaymentWaterfall::for_kind(kind).components {
            remaining = self.apply_to_component(component, remaining, context, &mut application);
            if remaining.is_zero() {
                break;
            }
        }

        application.excess = remaining;
        Ok(application)
    }

    fn apply_to_component(
        &self,
        component: PaymentComponent,
        available: Money,
        context: &mut PaymentContext,
        application: &mut PaymentApplication,
    ) -> Money {
        let (balance, applied) = match component {
            PaymentComponent::Interest => (&mut context.interest_due, &mut application.to_interest),
            PaymentComponent::Principal => {
                (&mut context.outstanding_principal, &mut application.to_principal)
            }
        };

        let payment = available.min(*balance);
        *balance -= payment;
        *applied = payment;

        available - payment
    }
}
