/// backup and restore - export the book to json and load it back
use chrono::{Duration, TimeZone, Utc};
use pawn_loan_rs::{
    Customer, LoanBook, LoanRequest, Money, PawnConfig, PaymentKind, PaymentRequest,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== backup and restore ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut book = LoanBook::new(PawnConfig::silver_counter())?;
    book.adjust_cash(Money::from_major(50_000), "opening float", &time)?;
    let customer_id = book.register_customer(Customer::new("Imran", "99001 22334", time.now())?, &time)?;
    let loan_id = book.originate_loan(LoanRequest::new(customer_id, Money::from_major(8_000)), &time)?.id;

    controller.advance(Duration::days(40));
    book.record_payment(PaymentRequest::new(loan_id, Money::from_major(300), PaymentKind::Interest), &time)?;

    let backup = book.to_json(&time)?;
    println!("backup is {} bytes", backup.len());

    book.clear_all();
    println!("after clear: {} loans, cash {}", book.loans(None).len(), book.cash_in_hand());

    let restored = LoanBook::from_json(&backup)?;
    let quote = restored.quote(loan_id, &time)?;
    println!(
        "restored {}: interest due {}, release {}, cash {}",
        quote.serial_no,
        quote.interest_only,
        quote.full_release,
        restored.cash_in_hand()
    );

    Ok(())
}
