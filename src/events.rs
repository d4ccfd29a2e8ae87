use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::EntryKind;
use crate::types::{CustomerId, LoanId, LoanStatus, PaymentKind};
use rust_decimal::Decimal;

/// all events that can be emitted by the loan book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // customer events
    CustomerRegistered {
        customer_id: CustomerId,
        name: String,
        timestamp: DateTime<Utc>,
    },

    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        serial_no: String,
        customer_id: CustomerId,
        principal: Money,
        monthly_rate_percent: Decimal,
        loan_date: NaiveDate,
        item_count: usize,
        timestamp: DateTime<Utc>,
    },
    LoanReleased {
        loan_id: LoanId,
        serial_no: String,
        settlement_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDeleted {
        loan_id: LoanId,
        serial_no: String,
        timestamp: DateTime<Utc>,
    },
    LoanAmended {
        loan_id: LoanId,
        serial_no: String,
        monthly_rate_percent: Decimal,
        loan_date: NaiveDate,
        item_count: usize,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        serial_no: String,
        kind: PaymentKind,
        amount: Money,
        applied_to_interest: Money,
        applied_to_principal: Money,
        excess: Money,
        payment_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    // status change events
    LoanStatusChanged {
        loan_id: LoanId,
        serial_no: String,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // cash events
    CashMoved {
        kind: EntryKind,
        /// signed: positive into the till, negative out
        amount: Money,
        balance_after: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// loan the event concerns, if any
    pub fn loan_id(&self) -> Option<LoanId> {
        match self {
            Event::LoanOriginated { loan_id, .. }
            | Event::LoanReleased { loan_id, .. }
            | Event::LoanDeleted { loan_id, .. }
            | Event::LoanAmended { loan_id, .. }
            | Event::PaymentReceived { loan_id, .. }
            | Event::LoanStatusChanged { loan_id, .. } => Some(*loan_id),
            Event::CustomerRegistered { .. } | Event::CashMoved { .. } => None,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// events touching one loan, oldest first
    pub fn for_loan(&self, loan_id: LoanId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.loan_id() == Some(loan_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
