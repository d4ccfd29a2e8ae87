/// serialization support for loan listings and book backups
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::collateral::CollateralSummary;
use crate::config::PawnConfig;
use crate::customer::Customer;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::InterestCalculator;
use crate::ledger::CashLedger;
use crate::loan::PawnLoan;
use crate::payments::Payment;
use crate::types::{InterestType, LoanId, LoanStatus};

/// format version written into backups
pub const SNAPSHOT_VERSION: u32 = 1;

/// one row of the loan listing, priced as of a date
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub serial_no: String,
    pub customer_name: String,
    pub status: LoanStatus,
    pub loan_date: NaiveDate,
    pub as_of: NaiveDate,
    pub financial: FinancialView,
    pub accrual: AccrualView,
    pub collateral: CollateralSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinancialView {
    pub principal: Money,
    pub outstanding_principal: Money,
    pub monthly_rate: Rate,
    pub interest_arrears: Money,
    pub interest_due: Money,
    pub total_due: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccrualView {
    pub accruing_since: NaiveDate,
    pub days: u32,
    pub interest: Money,
    pub interest_type: InterestType,
}

impl LoanView {
    pub fn from_loan(loan: &PawnLoan, engine: &impl InterestCalculator, as_of: NaiveDate) -> Result<Self> {
        let balance = loan.balance(engine, as_of)?;

        Ok(LoanView {
            id: loan.id,
            serial_no: loan.serial_no.clone(),
            customer_name: loan.customer_name.clone(),
            status: loan.status,
            loan_date: loan.loan_date,
            as_of,
            financial: FinancialView {
                principal: loan.principal,
                outstanding_principal: balance.outstanding_principal,
                monthly_rate: Rate::from_percent(loan.monthly_rate_percent),
                interest_arrears: balance.interest_arrears,
                interest_due: balance.interest_due,
                total_due: balance.total_due,
            },
            accrual: AccrualView {
                accruing_since: loan.accrual_anchor(),
                days: balance.accrual.days,
                interest: balance.accrual.interest,
                interest_type: balance.accrual.interest_type,
            },
            collateral: loan.collateral_summary(),
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// full backup of a loan book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: PawnConfig,
    pub next_serial: u32,
    pub customers: Vec<Customer>,
    pub loans: Vec<PawnLoan>,
    pub payments: Vec<Payment>,
    pub ledger: CashLedger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::CollateralItem;
    use crate::interest::AccrualEngine;
    use crate::types::Metal;
    use chrono::TimeZone;
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_loan_view_prices_as_of_date() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        ));
        let loan = PawnLoan::builder()
            .serial_no("A150")
            .customer(Uuid::new_v4(), "Anand")
            .principal(Money::from_major(100_000))
            .monthly_rate(dec!(1))
            .item(CollateralItem::new(2, "Earring", Metal::Gold, dec!(6), dec!(91.6), Money::from_major(30_000)).unwrap())
            .build_with_time(&time)
            .unwrap();

        let as_of = NaiveDate::from_ymd_opt(2025, 6, 24).unwrap();
        let view = LoanView::from_loan(&loan, &AccrualEngine::standard(), as_of).unwrap();

        assert_eq!(view.accrual.days, 540);
        assert_eq!(view.accrual.interest_type, InterestType::Compound);
        assert_eq!(view.financial.interest_due, Money::from_str_exact("18890.26").unwrap());
        assert_eq!(view.collateral.gold_fine_weight, dec!(5.496));

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"serial_no\": \"A150\""));
        assert!(json.contains("\"interest_type\": \"compound\""));
    }
}
