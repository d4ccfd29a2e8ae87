use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collateral::{CollateralItem, CollateralSummary, MetalRates};
use crate::decimal::Money;
use crate::errors::{PawnError, Result};
use crate::interest::{elapsed_days, AccrualInput, AccrualResult, InterestCalculator};
use crate::payments::PaymentContext;
use crate::types::{CustomerId, InterestType, LoanId, LoanStatus, PaymentApplication};

/// a pawn ticket: principal lent against pledged items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PawnLoan {
    pub id: LoanId,
    pub serial_no: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    /// amount disbursed at origination
    pub principal: Money,
    pub outstanding_principal: Money,
    /// percent per interest month (2.0 == 2%)
    pub monthly_rate_percent: Decimal,
    pub loan_date: NaiveDate,
    /// last day interest was paid in full; the tiered schedule restarts here
    pub last_interest_payment_date: Option<NaiveDate>,
    /// interest accrued up to `interest_accrued_through` and not yet paid
    pub interest_arrears: Money,
    /// set while a partial payment has left interest unpaid
    #[serde(default)]
    pub interest_accrued_through: Option<NaiveDate>,
    pub status: LoanStatus,
    pub items: Vec<CollateralItem>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// what the customer owes on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanBalance {
    /// accrual on the outstanding principal since the anchor
    pub accrual: AccrualResult,
    pub interest_arrears: Money,
    pub interest_due: Money,
    pub outstanding_principal: Money,
    pub total_due: Money,
}

/// figures shown in the release dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementQuote {
    pub loan_id: LoanId,
    pub serial_no: String,
    pub as_of: NaiveDate,
    pub outstanding_principal: Money,
    /// pay this to clear interest and keep the loan running
    pub interest_only: Money,
    /// pay this to close the loan and take the items back
    pub full_release: Money,
    pub days: u32,
    pub interest_type: InterestType,
}

impl PawnLoan {
    pub fn builder() -> PawnLoanBuilder {
        PawnLoanBuilder::new()
    }

    /// date the simple/compound schedule counts from
    pub fn accrual_anchor(&self) -> NaiveDate {
        self.last_interest_payment_date.unwrap_or(self.loan_date)
    }

    /// date up to which accrued interest already sits in arrears
    pub fn accrued_through(&self) -> NaiveDate {
        let anchor = self.accrual_anchor();
        self.interest_accrued_through.unwrap_or(anchor).max(anchor)
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(PawnError::LoanClosed {
                serial_no: self.serial_no.clone(),
                status: self.status,
            })
        }
    }

    /// whole days since the anchor
    pub fn days_since_anchor(&self, as_of: NaiveDate) -> u32 {
        elapsed_days(self.accrual_anchor(), as_of)
    }

    /// interest on the outstanding principal not yet in arrears, as of `as_of`
    pub fn accrue(&self, engine: &impl InterestCalculator, as_of: NaiveDate) -> Result<AccrualResult> {
        self.accrue_with_rate(engine, self.monthly_rate_percent, as_of)
    }

    /// accrue at `monthly_rate_percent` instead of the loan's own rate.
    ///
    /// The schedule always runs from the anchor, so a partial payment never
    /// resets the simple period. What was booked into arrears up to
    /// [`accrued_through`](Self::accrued_through) is taken off the result.
    pub fn accrue_with_rate(
        &self,
        engine: &impl InterestCalculator,
        monthly_rate_percent: Decimal,
        as_of: NaiveDate,
    ) -> Result<AccrualResult> {
        if self.outstanding_principal.is_zero() {
            return Ok(AccrualResult {
                principal: Money::ZERO,
                interest: Money::ZERO,
                total_amount: Money::ZERO,
                days: self.days_since_anchor(as_of),
                interest_type: InterestType::Simple,
            });
        }

        let anchor = self.accrual_anchor();
        let to_date = engine.accrue(&AccrualInput::new(
            self.outstanding_principal,
            anchor,
            monthly_rate_percent,
            as_of,
        ))?;

        let booked_through = self.accrued_through();
        if booked_through == anchor {
            return Ok(to_date);
        }

        let booked = engine.accrue(&AccrualInput::new(
            self.outstanding_principal,
            anchor,
            monthly_rate_percent,
            booked_through,
        ))?;
        let interest = to_date.interest.saturating_sub(booked.interest);

        Ok(AccrualResult {
            interest,
            total_amount: to_date.principal + interest,
            ..to_date
        })
    }

    pub fn balance(&self, engine: &impl InterestCalculator, as_of: NaiveDate) -> Result<LoanBalance> {
        let accrual = self.accrue(engine, as_of)?;
        let interest_due = self.interest_arrears + accrual.interest;

        Ok(LoanBalance {
            accrual,
            interest_arrears: self.interest_arrears,
            interest_due,
            outstanding_principal: self.outstanding_principal,
            total_due: self.outstanding_principal + interest_due,
        })
    }

    pub fn settlement_quote(
        &self,
        engine: &impl InterestCalculator,
        as_of: NaiveDate,
    ) -> Result<SettlementQuote> {
        let balance = self.balance(engine, as_of)?;

        Ok(SettlementQuote {
            loan_id: self.id,
            serial_no: self.serial_no.clone(),
            as_of,
            outstanding_principal: balance.outstanding_principal,
            interest_only: balance.interest_due,
            full_release: balance.total_due,
            days: balance.accrual.days,
            interest_type: balance.accrual.interest_type,
        })
    }

    pub fn payment_context(&self, balance: &LoanBalance) -> PaymentContext {
        PaymentContext {
            loan_id: self.id,
            interest_due: balance.interest_due,
            outstanding_principal: balance.outstanding_principal,
        }
    }

    /// move balances after an allocated payment; returns true when the loan closed
    pub fn apply_payment(
        &mut self,
        balance: &LoanBalance,
        application: &PaymentApplication,
        payment_date: NaiveDate,
        at: DateTime<Utc>,
    ) -> bool {
        self.interest_arrears = balance.interest_due.saturating_sub(application.to_interest);
        self.outstanding_principal = balance
            .outstanding_principal
            .saturating_sub(application.to_principal);

        let booked_through = self.accrued_through().max(payment_date);
        if self.interest_arrears.is_zero() {
            self.last_interest_payment_date = Some(booked_through);
            self.interest_accrued_through = None;
        } else {
            self.interest_accrued_through = Some(booked_through);
        }

        if self.interest_arrears.is_zero() && self.outstanding_principal.is_zero() {
            self.status = LoanStatus::Closed;
            self.closed_at = Some(at);
            return true;
        }
        false
    }

    /// change status, returning the previous one when it actually changed
    pub fn set_status(&mut self, status: LoanStatus) -> Option<LoanStatus> {
        if self.status == status {
            return None;
        }
        let previous = self.status;
        self.status = status;
        Some(previous)
    }

    pub fn collateral_summary(&self) -> CollateralSummary {
        CollateralSummary::from_items(&self.items)
    }

    pub fn collateral_value(&self, rates: Option<&MetalRates>) -> Money {
        self.collateral_summary().market_value(rates)
    }
}

/// what the counter hands over to open a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer_id: CustomerId,
    pub principal: Money,
    /// falls back to the book default
    pub monthly_rate_percent: Option<Decimal>,
    /// falls back to today
    pub loan_date: Option<NaiveDate>,
    pub items: Vec<CollateralItem>,
}

impl LoanRequest {
    pub fn new(customer_id: CustomerId, principal: Money) -> Self {
        Self {
            customer_id,
            principal,
            monthly_rate_percent: None,
            loan_date: None,
            items: Vec::new(),
        }
    }

    pub fn monthly_rate(mut self, percent: Decimal) -> Self {
        self.monthly_rate_percent = Some(percent);
        self
    }

    pub fn dated(mut self, loan_date: NaiveDate) -> Self {
        self.loan_date = Some(loan_date);
        self
    }

    pub fn item(mut self, item: CollateralItem) -> Self {
        self.items.push(item);
        self
    }
}

/// corrections to an open loan; unset fields stay as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanAmendment {
    pub monthly_rate_percent: Option<Decimal>,
    pub loan_date: Option<NaiveDate>,
    /// replaces the whole pledge
    pub items: Option<Vec<CollateralItem>>,
}

impl LoanAmendment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monthly_rate(mut self, percent: Decimal) -> Self {
        self.monthly_rate_percent = Some(percent);
        self
    }

    pub fn dated(mut self, loan_date: NaiveDate) -> Self {
        self.loan_date = Some(loan_date);
        self
    }

    pub fn items(mut self, items: Vec<CollateralItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_rate_percent.is_none() && self.loan_date.is_none() && self.items.is_none()
    }
}

/// builder for pawn loans
#[derive(Debug, Clone, Default)]
pub struct PawnLoanBuilder {
    serial_no: Option<String>,
    customer_id: Option<CustomerId>,
    customer_name: Option<String>,
    principal: Option<Money>,
    monthly_rate_percent: Option<Decimal>,
    default_rate_percent: Option<Decimal>,
    loan_date: Option<NaiveDate>,
    items: Vec<CollateralItem>,
}

impl PawnLoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serial_no(mut self, serial_no: impl Into<String>) -> Self {
        self.serial_no = Some(serial_no.into());
        self
    }

    pub fn customer(mut self, customer_id: CustomerId, name: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id);
        self.customer_name = Some(name.into());
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn monthly_rate(mut self, percent: Decimal) -> Self {
        self.monthly_rate_percent = Some(percent);
        self
    }

    /// rate used when no explicit rate was given
    pub fn default_rate(mut self, percent: Decimal) -> Self {
        self.default_rate_percent = Some(percent);
        self
    }

    pub fn loan_date(mut self, date: NaiveDate) -> Self {
        self.loan_date = Some(date);
        self
    }

    pub fn item(mut self, item: CollateralItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: Vec<CollateralItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Build with system time
    pub fn build_now(self) -> Result<PawnLoan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// Build with explicit time provider; an unset loan date becomes today
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<PawnLoan> {
        let now = time_provider.now();

        let serial_no = self
            .serial_no
            .filter(|serial| !serial.trim().is_empty())
            .ok_or_else(|| PawnError::invalid_input("serial number required"))?;
        let customer_id = self
            .customer_id
            .ok_or_else(|| PawnError::invalid_input("customer required"))?;
        let customer_name = self.customer_name.unwrap_or_default();
        let principal = self
            .principal
            .ok_or_else(|| PawnError::invalid_input("principal required"))?;
        if !principal.is_positive() {
            return Err(PawnError::InvalidInput {
                message: format!("principal must be positive, got {principal}"),
            });
        }

        let monthly_rate_percent = self
            .monthly_rate_percent
            .or(self.default_rate_percent)
            .ok_or_else(|| PawnError::invalid_input("monthly rate required"))?;
        if monthly_rate_percent < Decimal::ZERO {
            return Err(PawnError::InvalidInput {
                message: format!("monthly rate cannot be negative, got {monthly_rate_percent}"),
            });
        }

        Ok(PawnLoan {
            id: Uuid::new_v4(),
            serial_no,
            customer_id,
            customer_name,
            principal,
            outstanding_principal: principal,
            monthly_rate_percent,
            loan_date: self.loan_date.unwrap_or_else(|| now.date_naive()),
            last_interest_payment_date: None,
            interest_arrears: Money::ZERO,
            interest_accrued_through: None,
            status: LoanStatus::Active,
            items: self.items,
            created_at: now,
            closed_at: None,
        })
    }
}
