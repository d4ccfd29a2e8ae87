pub mod book;
pub mod collateral;
pub mod config;
pub mod customer;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod payments;
pub mod portfolio;
pub mod risk;
pub mod serialization;
pub mod types;

// re-export key types
pub use book::LoanBook;
pub use collateral::{CollateralItem, CollateralSummary, LtvCalculator, MetalRates};
pub use config::{AccrualConfig, BookConfig, PawnConfig, RiskConfig};
pub use customer::Customer;
pub use decimal::{Money, Rate};
pub use errors::{PawnError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    compute_accrual, parse_date, AccrualBreakdown, AccrualEngine, AccrualInput, AccrualResult,
    InterestCalculator,
};
pub use ledger::{CashLedger, EntryKind, LedgerEntry};
pub use loan::{
    LoanAmendment, LoanBalance, LoanRequest, PawnLoan, PawnLoanBuilder, SettlementQuote,
};
pub use payments::{Payment, PaymentProcessor, PaymentRequest};
pub use portfolio::{PortfolioSummary, RatePolicy};
pub use risk::{RiskAssessment, RiskClassifier};
pub use serialization::{BookSnapshot, LoanView};
pub use types::{
    CustomerId, InterestType, LoanId, LoanStatus, LtvStatus, LtvThresholds, Metal,
    PaymentApplication, PaymentKind, RiskLevel,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
