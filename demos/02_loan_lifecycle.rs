/// loan lifecycle - pledge, pay interest, part-pay principal, release
use chrono::{Duration, TimeZone, Utc};
use pawn_loan_rs::{
    CollateralItem, Customer, LoanBook, LoanRequest, Metal, Money, PaymentKind, PaymentRequest,
    SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut book = LoanBook::standard();
    book.adjust_cash(Money::from_major(300_000), "opening float", &time)?;

    let customer = Customer::new("Kavitha", "98450 77001", time.now())?
        .with_address("7 Market Road")
        .with_id_proof("voter id TN-4411");
    let customer_id = book.register_customer(customer, &time)?;

    let request = LoanRequest::new(customer_id, Money::from_major(120_000))
        .item(CollateralItem::new(1, "Necklace", Metal::Gold, dec!(32.5), dec!(91.6), Money::from_major(170_000))?)
        .item(CollateralItem::new(2, "Anklet", Metal::Silver, dec!(60), dec!(80), Money::from_major(3_500))?);
    let loan = book.originate_loan(request, &time)?;
    let loan_id = loan.id;
    println!("opened {} for {} at {}% a month", loan.serial_no, loan.customer_name, loan.monthly_rate_percent);
    println!("cash in hand: {}\n", book.cash_in_hand());

    controller.advance(Duration::days(90));
    let quote = book.quote(loan_id, &time)?;
    println!("after {} days: interest only {}, full release {}", quote.days, quote.interest_only, quote.full_release);

    let paid = book.record_payment(
        PaymentRequest::new(loan_id, Money::from_major(5_000), PaymentKind::Interest).with_notes("part interest"),
        &time,
    )?;
    println!("paid {} towards interest, arrears now {}", paid.interest_paid, book.loan(loan_id)?.interest_arrears);

    controller.advance(Duration::days(45));
    let paid = book.record_payment(PaymentRequest::new(loan_id, Money::from_major(40_000), PaymentKind::Both), &time)?;
    println!("paid {}: {} interest, {} principal", paid.amount, paid.interest_paid, paid.principal_paid);

    controller.advance(Duration::days(60));
    let quote = book.quote(loan_id, &time)?;
    println!("\nrelease quote: {}", quote.full_release);

    let tendered = quote.full_release.round_dp(0) + Money::from_major(100);
    let release = book.record_payment(PaymentRequest::new(loan_id, tendered, PaymentKind::FullRelease), &time)?;
    println!("released with {} tendered, change {}", release.amount, release.excess);
    println!("status: {:?}, cash in hand: {}", book.loan(loan_id)?.status, book.cash_in_hand());

    println!("\nevents:");
    for event in book.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
