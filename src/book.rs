use std::collections::HashMap;

use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::collateral::{LtvCalculator, MetalRates};
use crate::config::PawnConfig;
use crate::customer::Customer;
use crate::decimal::Money;
use crate::errors::{PawnError, Result};
use crate::events::{Event, EventStore};
use crate::interest::AccrualEngine;
use crate::ledger::{CashLedger, EntryKind};
use crate::loan::{LoanAmendment, LoanRequest, PawnLoan, SettlementQuote};
use crate::payments::{Payment, PaymentProcessor, PaymentRequest};
use crate::portfolio::{summarize, PortfolioInputs, PortfolioSummary, RatePolicy};
use crate::risk::{RiskAssessment, RiskClassifier};
use crate::serialization::{BookSnapshot, LoanView, SNAPSHOT_VERSION};
use crate::types::{CustomerId, LoanId, LoanStatus};

/// the pawn counter's book: customers, loans, payments and cash in hand
pub struct LoanBook {
    pub config: PawnConfig,
    engine: AccrualEngine,
    customers: HashMap<CustomerId, Customer>,
    loans: HashMap<LoanId, PawnLoan>,
    payments: Vec<Payment>,
    ledger: CashLedger,
    events: EventStore,
    next_serial: u32,
}

impl LoanBook {
    pub fn new(config: PawnConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    pub fn standard() -> Self {
        Self::with_config(PawnConfig::standard())
    }

    fn with_config(config: PawnConfig) -> Self {
        Self {
            engine: AccrualEngine::new(config.accrual),
            customers: HashMap::new(),
            loans: HashMap::new(),
            payments: Vec::new(),
            ledger: CashLedger::new(config.book.allow_cash_overdraw),
            events: EventStore::new(),
            next_serial: config.book.serial_start,
            config,
        }
    }

    pub fn engine(&self) -> &AccrualEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &CashLedger {
        &self.ledger
    }

    pub fn cash_in_hand(&self) -> Money {
        self.ledger.balance()
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// serial the next loan will get
    pub fn peek_serial(&self) -> String {
        format!("{}{}", self.config.book.serial_prefix, self.next_serial)
    }

    // ---- cash ----

    /// move cash in or out of the till outside a loan; negative amounts take cash out
    pub fn adjust_cash(
        &mut self,
        amount: Money,
        memo: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        let now = time_provider.now();
        let kind = if self.ledger.entries().is_empty() && amount.is_positive() {
            EntryKind::Opening
        } else {
            EntryKind::Adjustment
        };

        let entry = if amount.is_negative() {
            self.ledger.debit(amount.abs(), kind, memo, now)?
        } else {
            self.ledger.credit(amount, kind, memo, now)?
        };
        let (signed, balance_after) = (entry.amount, entry.balance_after);

        self.events.emit(Event::CashMoved {
            kind,
            amount: signed,
            balance_after,
            timestamp: now,
        });
        info!("cash adjusted by {} ({}), in hand {}", signed, memo, balance_after);

        Ok(balance_after)
    }

    // ---- customers ----

    pub fn register_customer(
        &mut self,
        customer: Customer,
        time_provider: &SafeTimeProvider,
    ) -> Result<CustomerId> {
        if self.customers.contains_key(&customer.id) {
            return Err(PawnError::invalid_input(format!(
                "customer {} already registered",
                customer.id
            )));
        }

        let id = customer.id;
        self.events.emit(Event::CustomerRegistered {
            customer_id: id,
            name: customer.name.clone(),
            timestamp: time_provider.now(),
        });
        info!("registered customer {} ({})", customer.name, id);
        self.customers.insert(id, customer);

        Ok(id)
    }

    pub fn customer(&self, id: CustomerId) -> Result<&Customer> {
        self.customers
            .get(&id)
            .ok_or(PawnError::CustomerNotFound { id })
    }

    /// all customers, oldest registration first
    pub fn customers(&self) -> Vec<&Customer> {
        let mut customers: Vec<&Customer> = self.customers.values().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        customers
    }

    /// remove a customer with no open loans
    pub fn delete_customer(&mut self, id: CustomerId) -> Result<Customer> {
        self.customer(id)?;

        let open_loans = self
            .loans
            .values()
            .filter(|loan| loan.customer_id == id && loan.is_open())
            .count();
        if open_loans > 0 {
            return Err(PawnError::CustomerHasActiveLoans { id, open_loans });
        }

        info!("deleted customer {}", id);
        self.customers
            .remove(&id)
            .ok_or(PawnError::CustomerNotFound { id })
    }

    // ---- loans ----

    /// open a loan: assign the next serial and pay the principal out of the till
    pub fn originate_loan(
        &mut self,
        request: LoanRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<&PawnLoan> {
        let customer = self.customer(request.customer_id)?;
        let serial_no = self.peek_serial();

        let mut builder = PawnLoan::builder()
            .serial_no(serial_no.clone())
            .customer(customer.id, customer.name.clone())
            .principal(request.principal)
            .default_rate(self.config.book.default_monthly_rate)
            .items(request.items);
        if let Some(rate) = request.monthly_rate_percent {
            builder = builder.monthly_rate(rate);
        }
        if let Some(date) = request.loan_date {
            builder = builder.loan_date(date);
        }
        let loan = builder.build_with_time(time_provider)?;
        self.check_advance(&loan)?;

        let now = time_provider.now();
        let entry = self
            .ledger
            .debit(loan.principal, EntryKind::LoanDisbursed, serial_no.as_str(), now)?;
        let (signed, balance_after) = (entry.amount, entry.balance_after);
        self.next_serial += 1;

        self.events.emit(Event::LoanOriginated {
            loan_id: loan.id,
            serial_no: serial_no.clone(),
            customer_id: loan.customer_id,
            principal: loan.principal,
            monthly_rate_percent: loan.monthly_rate_percent,
            loan_date: loan.loan_date,
            item_count: loan.items.len(),
            timestamp: now,
        });
        self.events.emit(Event::CashMoved {
            kind: EntryKind::LoanDisbursed,
            amount: signed,
            balance_after,
            timestamp: now,
        });
        info!(
            "originated {} for {}: principal {} at {}% a month",
            serial_no, loan.customer_name, loan.principal, loan.monthly_rate_percent
        );

        let id = loan.id;
        Ok(self.loans.entry(id).or_insert(loan))
    }

    /// principal may not exceed what the declared pledge supports at the warning ltv
    fn check_advance(&self, loan: &PawnLoan) -> Result<()> {
        let pledge_value = loan.collateral_value(None);
        if !pledge_value.is_positive() {
            return Ok(());
        }

        let max_advance = LtvCalculator::new(self.config.risk.ltv_thresholds).max_advance(pledge_value);
        if loan.principal > max_advance {
            return Err(PawnError::InvalidCollateral {
                message: format!(
                    "principal {} exceeds the {} a pledge worth {} supports",
                    loan.principal, max_advance, pledge_value
                ),
            });
        }
        Ok(())
    }

    /// correct the rate, loan date or pledge of an open loan
    pub fn update_loan(
        &mut self,
        id: LoanId,
        amendment: LoanAmendment,
        time_provider: &SafeTimeProvider,
    ) -> Result<&PawnLoan> {
        if amendment.is_empty() {
            return Err(PawnError::invalid_input("nothing to amend"));
        }
        let has_payments = self.payments.iter().any(|payment| payment.loan_id == id);

        let loan = self.loans.get_mut(&id).ok_or_else(|| PawnError::LoanNotFound {
            reference: id.to_string(),
        })?;
        loan.ensure_open()?;

        let loan_date = amendment.loan_date.unwrap_or(loan.loan_date);
        if loan_date != loan.loan_date && has_payments {
            return Err(PawnError::invalid_input(format!(
                "{} already has payments, its loan date cannot change",
                loan.serial_no
            )));
        }

        let checked = PawnLoan::builder()
            .serial_no(loan.serial_no.clone())
            .customer(loan.customer_id, loan.customer_name.clone())
            .principal(loan.principal)
            .monthly_rate(amendment.monthly_rate_percent.unwrap_or(loan.monthly_rate_percent))
            .loan_date(loan_date)
            .items(amendment.items.unwrap_or_else(|| loan.items.clone()))
            .build_with_time(time_provider)?;

        loan.monthly_rate_percent = checked.monthly_rate_percent;
        loan.loan_date = checked.loan_date;
        loan.items = checked.items;

        self.events.emit(Event::LoanAmended {
            loan_id: loan.id,
            serial_no: loan.serial_no.clone(),
            monthly_rate_percent: loan.monthly_rate_percent,
            loan_date: loan.loan_date,
            item_count: loan.items.len(),
            timestamp: time_provider.now(),
        });
        info!(
            "amended {}: {}% a month from {}, {} item(s)",
            loan.serial_no,
            loan.monthly_rate_percent,
            loan.loan_date,
            loan.items.len()
        );

        Ok(&*loan)
    }

    pub fn loan(&self, id: LoanId) -> Result<&PawnLoan> {
        self.loans.get(&id).ok_or_else(|| PawnError::LoanNotFound {
            reference: id.to_string(),
        })
    }

    pub fn loan_by_serial(&self, serial_no: &str) -> Result<&PawnLoan> {
        self.loans
            .values()
            .find(|loan| loan.serial_no.eq_ignore_ascii_case(serial_no.trim()))
            .ok_or_else(|| PawnError::LoanNotFound {
                reference: serial_no.to_string(),
            })
    }

    /// loans newest first, optionally only those with `status`
    pub fn loans(&self, status: Option<LoanStatus>) -> Vec<&PawnLoan> {
        let mut loans: Vec<&PawnLoan> = self
            .loans
            .values()
            .filter(|loan| status.map_or(true, |status| loan.status == status))
            .collect();
        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.serial_no.cmp(&a.serial_no)));
        loans
    }

    pub fn loans_for_customer(&self, customer_id: CustomerId) -> Vec<&PawnLoan> {
        self.loans(None)
            .into_iter()
            .filter(|loan| loan.customer_id == customer_id)
            .collect()
    }

    /// drop a loan record; payments already taken stay on file
    pub fn delete_loan(&mut self, id: LoanId, time_provider: &SafeTimeProvider) -> Result<PawnLoan> {
        let loan = self.loans.remove(&id).ok_or_else(|| PawnError::LoanNotFound {
            reference: id.to_string(),
        })?;

        if loan.is_open() {
            warn!("deleted open loan {} with {} outstanding", loan.serial_no, loan.outstanding_principal);
        }
        self.events.emit(Event::LoanDeleted {
            loan_id: loan.id,
            serial_no: loan.serial_no.clone(),
            timestamp: time_provider.now(),
        });

        Ok(loan)
    }

    // ---- pricing ----

    pub fn quote(&self, id: LoanId, time_provider: &SafeTimeProvider) -> Result<SettlementQuote> {
        self.quote_on(id, time_provider.now().date_naive())
    }

    /// quote with system time
    pub fn quote_now(&self, id: LoanId) -> Result<SettlementQuote> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.quote(id, &time)
    }

    pub fn quote_on(&self, id: LoanId, as_of: NaiveDate) -> Result<SettlementQuote> {
        let loan = self.loan(id)?;
        loan.ensure_open()?;
        loan.settlement_quote(&self.engine, as_of)
    }

    pub fn loan_view(&self, id: LoanId, time_provider: &SafeTimeProvider) -> Result<LoanView> {
        LoanView::from_loan(self.loan(id)?, &self.engine, time_provider.now().date_naive())
    }

    /// listing rows, newest first
    pub fn listing(
        &self,
        status: Option<LoanStatus>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<LoanView>> {
        let as_of = time_provider.now().date_naive();
        self.loans(status)
            .into_iter()
            .map(|loan| LoanView::from_loan(loan, &self.engine, as_of))
            .collect()
    }

    // ---- payments ----

    /// record payment with system time
    pub fn record_payment_now(&mut self, request: PaymentRequest) -> Result<Payment> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.record_payment(request, &time)
    }

    /// price the loan on the payment date, split the payment and take the cash
    pub fn record_payment(
        &mut self,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Payment> {
        let now = time_provider.now();
        let payment_date = request.payment_date.unwrap_or_else(|| now.date_naive());

        let loan = self.loans.get_mut(&request.loan_id).ok_or_else(|| PawnError::LoanNotFound {
            reference: request.loan_id.to_string(),
        })?;
        loan.ensure_open()?;

        let balance = loan.balance(&self.engine, payment_date)?;
        let mut context = loan.payment_context(&balance);
        let application = PaymentProcessor::new().allocate(request.amount, request.kind, &mut context)?;

        let applied = application.total_applied();
        let mut cash_entry = None;
        if applied.is_positive() {
            let memo = format!("{} {:?}", loan.serial_no, request.kind);
            let entry = self
                .ledger
                .credit(applied, EntryKind::PaymentReceived, memo, now)?;
            cash_entry = Some((entry.amount, entry.balance_after));
        }

        let previous_status = loan.status;
        let closed = loan.apply_payment(&balance, &application, payment_date, now);
        if !closed {
            let days = loan.days_since_anchor(now.date_naive());
            loan.set_status(RiskClassifier::new(self.config.risk).status_for(days));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            loan_serial_no: loan.serial_no.clone(),
            customer_name: loan.customer_name.clone(),
            amount: request.amount,
            payment_date,
            payment_type: "cash".to_string(),
            kind: request.kind,
            principal_paid: application.to_principal,
            interest_paid: application.to_interest,
            excess: application.excess,
            notes: request.notes,
            created_at: now,
        };

        self.events.emit(Event::PaymentReceived {
            loan_id: loan.id,
            serial_no: loan.serial_no.clone(),
            kind: request.kind,
            amount: request.amount,
            applied_to_interest: application.to_interest,
            applied_to_principal: application.to_principal,
            excess: application.excess,
            payment_date,
            timestamp: now,
        });
        if let Some((amount, balance_after)) = cash_entry {
            self.events.emit(Event::CashMoved {
                kind: EntryKind::PaymentReceived,
                amount,
                balance_after,
                timestamp: now,
            });
        }
        if loan.status != previous_status {
            self.events.emit(Event::LoanStatusChanged {
                loan_id: loan.id,
                serial_no: loan.serial_no.clone(),
                old_status: previous_status,
                new_status: loan.status,
                reason: if closed {
                    "fully settled".to_string()
                } else {
                    "interest settled".to_string()
                },
                timestamp: now,
            });
        }
        if closed {
            self.events.emit(Event::LoanReleased {
                loan_id: loan.id,
                serial_no: loan.serial_no.clone(),
                settlement_amount: applied,
                timestamp: now,
            });
            info!("released {}: settled {}", loan.serial_no, applied);
        } else {
            info!(
                "payment on {}: interest {}, principal {}, arrears now {}",
                loan.serial_no, application.to_interest, application.to_principal, loan.interest_arrears
            );
        }
        if application.excess.is_positive() {
            debug!("returning {} change on {}", application.excess, loan.serial_no);
        }

        self.payments.push(payment.clone());
        Ok(payment)
    }

    /// payments newest first
    pub fn payments(&self) -> Vec<&Payment> {
        let mut payments: Vec<&Payment> = self.payments.iter().collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments
    }

    pub fn payments_for(&self, loan_id: LoanId) -> Vec<&Payment> {
        self.payments()
            .into_iter()
            .filter(|payment| payment.loan_id == loan_id)
            .collect()
    }

    // ---- monitoring ----

    /// flip open loans between active and overdue; returns how many changed
    pub fn refresh_statuses(&mut self, time_provider: &SafeTimeProvider) -> usize {
        let now = time_provider.now();
        let today = now.date_naive();
        let classifier = RiskClassifier::new(self.config.risk);
        let mut changed = 0;

        for loan in self.loans.values_mut().filter(|loan| loan.is_open()) {
            let days = loan.days_since_anchor(today);
            let status = classifier.status_for(days);

            if let Some(old_status) = loan.set_status(status) {
                changed += 1;
                debug!("{} moved {:?} -> {:?}", loan.serial_no, old_status, status);
                self.events.emit(Event::LoanStatusChanged {
                    loan_id: loan.id,
                    serial_no: loan.serial_no.clone(),
                    old_status,
                    new_status: status,
                    reason: format!("{} days since interest was settled", days),
                    timestamp: now,
                });
            }
        }

        if changed > 0 {
            info!("refreshed statuses: {} loan(s) changed", changed);
        }
        changed
    }

    /// open loans needing follow-up, worst first
    pub fn risk_report(
        &self,
        time_provider: &SafeTimeProvider,
        rates: Option<&MetalRates>,
    ) -> Result<Vec<RiskAssessment>> {
        let as_of = time_provider.now().date_naive();
        let classifier = RiskClassifier::new(self.config.risk);

        let mut report = self
            .loans
            .values()
            .filter(|loan| loan.is_open())
            .map(|loan| classifier.assess(loan, &self.engine, as_of, rates))
            .collect::<Result<Vec<_>>>()?;

        report.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| b.days_overdue.cmp(&a.days_overdue))
                .then_with(|| a.serial_no.cmp(&b.serial_no))
        });
        Ok(report)
    }

    pub fn dashboard(
        &self,
        time_provider: &SafeTimeProvider,
        policy: RatePolicy,
    ) -> Result<PortfolioSummary> {
        let loans: Vec<PawnLoan> = self.loans.values().cloned().collect();

        summarize(
            PortfolioInputs {
                loans: &loans,
                payments: &self.payments,
                total_customers: self.customers.len(),
                cash_in_hand: self.ledger.balance(),
            },
            &self.engine,
            policy,
            time_provider.now().date_naive(),
            self.config.book.recent_window,
        )
    }

    /// interest the book would earn at the configured potential rate
    pub fn interest_potential(&self, time_provider: &SafeTimeProvider) -> Result<Money> {
        let summary = self.dashboard(
            time_provider,
            RatePolicy::Fixed(self.config.book.potential_monthly_rate),
        )?;
        Ok(summary.total_interest)
    }

    // ---- admin ----

    /// wipe customers, loans, payments, cash and events; serials restart
    pub fn clear_all(&mut self) {
        warn!(
            "clearing book: {} customers, {} loans, {} payments",
            self.customers.len(),
            self.loans.len(),
            self.payments.len()
        );
        self.customers.clear();
        self.loans.clear();
        self.payments.clear();
        self.ledger.reset();
        self.events.clear();
        self.next_serial = self.config.book.serial_start;
    }

    pub fn snapshot(&self, time_provider: &SafeTimeProvider) -> BookSnapshot {
        let mut customers: Vec<Customer> = self.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut loans: Vec<PawnLoan> = self.loans.values().cloned().collect();
        loans.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        BookSnapshot {
            version: SNAPSHOT_VERSION,
            exported_at: time_provider.now(),
            config: self.config.clone(),
            next_serial: self.next_serial,
            customers,
            loans,
            payments: self.payments.clone(),
            ledger: self.ledger.clone(),
        }
    }

    /// backup as pretty json
    pub fn to_json(&self, time_provider: &SafeTimeProvider) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot(time_provider))?)
    }

    /// restore from a backup; the event log starts empty
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: BookSnapshot = serde_json::from_str(json)?;
        Self::restore(snapshot)
    }

    pub fn restore(snapshot: BookSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PawnError::invalid_input(format!(
                "unsupported backup version {}",
                snapshot.version
            )));
        }

        let mut book = Self::new(snapshot.config)?;
        book.customers = snapshot
            .customers
            .into_iter()
            .map(|customer| (customer.id, customer))
            .collect();
        book.loans = snapshot.loans.into_iter().map(|loan| (loan.id, loan)).collect();
        book.payments = snapshot.payments;
        book.ledger = snapshot.ledger;
        book.ledger.set_allow_overdraw(book.config.book.allow_cash_overdraw);

        let prefix = book.config.book.serial_prefix.as_str();
        let after_highest = book
            .loans
            .values()
            .filter_map(|loan| loan.serial_no.strip_prefix(prefix)?.parse::<u32>().ok())
            .max()
            .map(|highest| highest.saturating_add(1));
        book.next_serial = match after_highest {
            Some(next) if next > snapshot.next_serial => {
                warn!(
                    "backup serial counter {} is behind loans on file, continuing at {}",
                    snapshot.next_serial, next
                );
                next
            }
            _ => snapshot.next_serial,
        };

        info!(
            "restored book: {} customers, {} loans, {} payments",
            book.customers.len(),
            book.loans.len(),
            book.payments.len()
        );
        Ok(book)
    }
}

impl Default for LoanBook {
    fn default() -> Self {
        Self::standard()
    }
}
