use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::InterestCalculator;
use crate::loan::PawnLoan;
use crate::payments::Payment;
use crate::types::LoanStatus;

/// which monthly rate portfolio interest is projected at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatePolicy {
    /// each loan's own rate
    LoanRate,
    /// one rate (percent) across the book
    Fixed(Decimal),
}

/// dashboard figures for the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub as_of: NaiveDate,
    pub rate_policy: RatePolicy,
    /// open loans, overdue included
    pub total_active_loans: usize,
    pub overdue_loans: usize,
    /// outstanding principal over open loans
    pub total_loan_amount: Money,
    pub total_interest: Money,
    pub total_due: Money,
    pub total_customers: usize,
    pub cash_in_hand: Money,
    pub recent_loans: Vec<PawnLoan>,
    pub recent_payments: Vec<Payment>,
}

/// interest owed on one loan under `policy`
pub fn projected_interest(
    loan: &PawnLoan,
    engine: &impl InterestCalculator,
    policy: RatePolicy,
    as_of: NaiveDate,
) -> Result<Money> {
    match policy {
        RatePolicy::LoanRate => Ok(loan.balance(engine, as_of)?.interest_due),
        RatePolicy::Fixed(rate_percent) => {
            let accrual = loan.accrue_with_rate(engine, rate_percent, as_of)?;
            Ok(loan.interest_arrears + accrual.interest)
        }
    }
}

/// inputs borrowed from the book for one summary
pub struct PortfolioInputs<'a> {
    pub loans: &'a [PawnLoan],
    pub payments: &'a [Payment],
    pub total_customers: usize,
    pub cash_in_hand: Money,
}

pub fn summarize(
    inputs: PortfolioInputs<'_>,
    engine: &impl InterestCalculator,
    policy: RatePolicy,
    as_of: NaiveDate,
    recent_window: usize,
) -> Result<PortfolioSummary> {
    let mut total_active_loans = 0;
    let mut overdue_loans = 0;
    let mut total_loan_amount = Money::ZERO;
    let mut total_interest = Money::ZERO;

    for loan in inputs.loans.iter().filter(|loan| loan.is_open()) {
        total_active_loans += 1;
        if loan.status == LoanStatus::Overdue {
            overdue_loans += 1;
        }
        total_loan_amount += loan.outstanding_principal;
        total_interest += projected_interest(loan, engine, policy, as_of)?;
    }

    let mut recent_loans = inputs.loans.to_vec();
    recent_loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_loans.truncate(recent_window);

    let mut recent_payments = inputs.payments.to_vec();
    recent_payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_payments.truncate(recent_window);

    debug!(
        "portfolio as of {}: {} open, {} overdue, principal {}, interest {}",
        as_of, total_active_loans, overdue_loans, total_loan_amount, total_interest
    );

    Ok(PortfolioSummary {
        as_of,
        rate_policy: policy,
        total_active_loans,
        overdue_loans,
        total_loan_amount,
        total_interest,
        total_due: total_loan_amount + total_interest,
        total_customers: inputs.total_customers,
        cash_in_hand: inputs.cash_in_hand,
        recent_loans,
        recent_payments,
    })
}
