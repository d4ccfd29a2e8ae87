use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::LoanStatus;

#[derive(Error, Debug)]
pub enum PawnError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid collateral: {message}")]
    InvalidCollateral {
        message: String,
    },

    #[error("customer not found: {id}")]
    CustomerNotFound {
        id: Uuid,
    },

    #[error("customer {id} still has {open_loans} open loan(s)")]
    CustomerHasActiveLoans {
        id: Uuid,
        open_loans: usize,
    },

    #[error("loan not found: {reference}")]
    LoanNotFound {
        reference: String,
    },

    #[error("loan {serial_no} is not open: current status is {status:?}")]
    LoanClosed {
        serial_no: String,
        status: LoanStatus,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment below release amount: required {required}, provided {provided}")]
    PaymentBelowRelease {
        required: Money,
        provided: Money,
    },

    #[error("insufficient cash in hand: available {available}, requested {requested}")]
    InsufficientCash {
        available: Money,
        requested: Money,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PawnError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        PawnError::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PawnError>;
