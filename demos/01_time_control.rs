/// time control - watch one loan cross from simple to compound interest
use chrono::{Duration, TimeZone, Utc};
use pawn_loan_rs::{AccrualEngine, Money, SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== time control example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let loan_date = time.now().date_naive();
    let engine = AccrualEngine::standard();

    println!("loan of 50000 at 2% a month on {}", loan_date);

    for step in [30, 150, 180, 1, 29, 150] {
        controller.advance(Duration::days(step));
        let result = engine.compute_at(Money::from_major(50_000), loan_date, dec!(2), &time)?;
        println!(
            "{}: day {:>3} {:>8} interest {:>10}  total {}",
            time.now().format("%Y-%m-%d"),
            result.days,
            result.interest_type,
            result.interest,
            result.total_amount
        );
    }

    Ok(())
}
