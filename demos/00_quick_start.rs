/// quick start - price a pawn loan on a given date
use pawn_loan_rs::{compute_accrual, parse_date, Money};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let loan_date = parse_date("2024-01-01")?;

    for as_of in ["2024-03-01", "2024-12-26", "2025-06-24"] {
        let result = compute_accrual(Money::from_major(100_000), loan_date, dec!(1), parse_date(as_of)?)?;
        println!(
            "{as_of}: {} days, {} interest {}, total {}",
            result.days, result.interest_type, result.interest, result.total_amount
        );
    }

    Ok(())
}
