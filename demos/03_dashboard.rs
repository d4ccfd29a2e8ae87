/// dashboard - portfolio figures, status refresh and risk follow-up
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pawn_loan_rs::{
    CollateralItem, Customer, LoanBook, LoanRequest, Metal, MetalRates, Money, RatePolicy,
    SafeTimeProvider, TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== dashboard ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut book = LoanBook::standard();
    book.adjust_cash(Money::from_major(1_000_000), "opening float", &time)?;

    let pledges = [
        ("Arun", "2023-02-10", 80_000, dec!(2), dec!(18)),
        ("Bhavani", "2024-03-15", 150_000, dec!(1.5), dec!(40)),
        ("Chitra", "2024-05-28", 45_000, dec!(2), dec!(9)),
    ];

    for (name, date, principal, rate, grams) in pledges {
        let customer = Customer::new(name, "90000 00000", time.now())?;
        let customer_id = book.register_customer(customer, &time)?;
        let request = LoanRequest::new(customer_id, Money::from_major(principal))
            .monthly_rate(rate)
            .dated(NaiveDate::parse_from_str(date, "%Y-%m-%d")?)
            .item(CollateralItem::new(1, "Ornament", Metal::Gold, grams, dec!(91.6), Money::ZERO)?);
        book.originate_loan(request, &time)?;
        controller.advance(Duration::minutes(1));
    }

    let changed = book.refresh_statuses(&time);
    println!("{} loan(s) changed status\n", changed);

    let summary = book.dashboard(&time, RatePolicy::LoanRate)?;
    println!("active loans:   {}", summary.total_active_loans);
    println!("overdue loans:  {}", summary.overdue_loans);
    println!("principal out:  {}", summary.total_loan_amount);
    println!("interest due:   {}", summary.total_interest);
    println!("customers:      {}", summary.total_customers);
    println!("cash in hand:   {}", summary.cash_in_hand);
    println!("potential @2%:  {}", book.interest_potential(&time)?);

    let rates = MetalRates {
        gold_per_gram: Money::from_major(6_800),
        silver_per_gram: Money::from_major(85),
    };
    println!("\nfollow-up list:");
    for row in book.risk_report(&time, Some(&rates))? {
        println!(
            "  {} {:<8} {:>4} days overdue  {:?}  ltv {}",
            row.serial_no,
            row.customer_name,
            row.days_overdue,
            row.level,
            row.ltv.map(|ltv| ltv.to_string()).unwrap_or_else(|| "-".to_string())
        );
    }

    println!("\nlisting:");
    for view in book.listing(None, &time)? {
        println!("{}", view.to_json_pretty()?);
    }

    Ok(())
}
