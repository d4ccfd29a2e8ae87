use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{PawnError, Result};

/// why cash moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Opening,
    LoanDisbursed,
    PaymentReceived,
    Adjustment,
}

/// one movement of cash in hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    /// positive into the till, negative out
    pub amount: Money,
    pub balance_after: Money,
    pub memo: String,
    pub at: DateTime<Utc>,
}

/// cash in hand at the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CashLedger {
    balance: Money,
    entries: Vec<LedgerEntry>,
    allow_overdraw: bool,
}

impl CashLedger {
    pub fn new(allow_overdraw: bool) -> Self {
        Self {
            balance: Money::ZERO,
            entries: Vec::new(),
            allow_overdraw,
        }
    }

    /// start the till with an opening float
    pub fn with_opening(opening: Money, at: DateTime<Utc>, allow_overdraw: bool) -> Result<Self> {
        let mut ledger = Self::new(allow_overdraw);
        if opening.is_positive() {
            ledger.credit(opening, EntryKind::Opening, "opening balance", at)?;
        }
        Ok(ledger)
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn allows_overdraw(&self) -> bool {
        self.allow_overdraw
    }

    pub fn set_allow_overdraw(&mut self, allow: bool) {
        self.allow_overdraw = allow;
    }

    pub fn credit(
        &mut self,
        amount: Money,
        kind: EntryKind,
        memo: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<&LedgerEntry> {
        Self::check_amount(amount)?;
        Ok(self.post(amount, kind, memo.into(), at))
    }

    /// take cash out; fails without touching the balance when the till would go negative
    pub fn debit(
        &mut self,
        amount: Money,
        kind: EntryKind,
        memo: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<&LedgerEntry> {
        Self::check_amount(amount)?;

        if amount > self.balance {
            if !self.allow_overdraw {
                return Err(PawnError::InsufficientCash {
                    available: self.balance,
                    requested: amount,
                });
            }
            warn!(
                "cash overdrawn: balance {} debited {}",
                self.balance, amount
            );
        }

        Ok(self.post(Money::ZERO - amount, kind, memo.into(), at))
    }

    /// wipe every entry, keeping the overdraw policy
    pub fn reset(&mut self) {
        self.balance = Money::ZERO;
        self.entries.clear();
    }

    fn check_amount(amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(PawnError::invalid_input(format!(
                "cash movement must be positive, got {amount}"
            )));
        }
        Ok(())
    }

    fn post(&mut self, signed: Money, kind: EntryKind, memo: String, at: DateTime<Utc>) -> &LedgerEntry {
        self.balance += signed;
        debug!("cash {:?} {} -> balance {}", kind, signed, self.balance);

        self.entries.push(LedgerEntry {
            id: Uuid::new_v4(),
            kind,
            amount: signed,
            balance_after: self.balance,
            memo,
            at,
        });
        &self.entries[self.entries.len() - 1]
    }
}
