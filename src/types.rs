use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a customer
pub type CustomerId = Uuid;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// disbursed and within the grace period
    Active,
    /// past the grace period without the interest being settled
    Overdue,
    /// released, principal and interest fully paid
    Closed,
}

impl LoanStatus {
    /// loan still carries a balance
    pub fn is_open(&self) -> bool {
        !matches!(self, LoanStatus::Closed)
    }
}

/// which branch of the accrual policy produced an interest figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    Simple,
    Compound,
}

impl fmt::Display for InterestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestType::Simple => write!(f, "simple"),
            InterestType::Compound => write!(f, "compound"),
        }
    }
}

/// pledged metal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metal {
    Gold,
    Silver,
}

/// what a payment is meant to settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// interest only, principal untouched
    Interest,
    /// principal reduction only
    Principal,
    /// interest first, remainder to principal
    Both,
    /// settle everything and return the pledge
    FullRelease,
}

/// loan-to-value thresholds, as fractions of collateral value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LtvThresholds {
    pub warning_ltv: Rate,
    pub critical_ltv: Rate,
}

/// ltv status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LtvStatus {
    Healthy,
    Warning,
    /// amount due has reached the pledge value
    Critical,
}

/// risk level for follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Current,
    Overdue,
    HighRisk,
}

/// how a payment was split across balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentApplication {
    pub to_interest: Money,
    pub to_principal: Money,
    /// returned to the customer
    pub excess: Money,
}

impl PaymentApplication {
    pub fn total_applied(&self) -> Money {
        self.to_interest + self.to_principal
    }
}
