/// time control - deterministic accrual with a controlled clock
use chrono::{Duration, TimeZone, Utc};
use credit_ledger_rs::{
    AccountLedger, EntityStore, LedgerConfig, MemoryStore, Money, SafeTimeProvider, TimeSource,
    User,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    // create controlled time for testing
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let store = MemoryStore::new();
    let config = LedgerConfig::default();

    let user = User::onboard(
        "Ada Lovelace".to_string(),
        "ada@example.com".to_string(),
        None,
        config.default_apr,
        time.now(),
    );
    store.insert_user(user.clone())?;

    let mut ledger = AccountLedger::new(&store, &config, &time);
    let account = ledger.open_account(user.id, Money::from_major(5_000), None)?;
    ledger.record_purchase(account.id, Money::from_major(1_000), "sofa")?;
    println!("purchased £1,000 on {}", time.now().format("%Y-%m-%d"));

    // accrue a month of daily interest
    for _ in 0..30 {
        controller.advance(Duration::days(1));
        ledger.apply_daily_interest(account.id)?;
    }
    let balance = store.account(account.id)?.balance;
    println!("balance after 30 daily accruals: £{}", balance);

    // late fees cap out inside the trailing 90-day window
    println!();
    for attempt in 1..=4 {
        let outcome = ledger.apply_late_fee(account.id)?;
        match outcome.reason {
            None => println!("late fee {}: charged £{}", attempt, outcome.fee_applied),
            Some(reason) => println!("late fee {}: skipped ({})", attempt, reason),
        }
    }

    // the window slides, so charging resumes once the old fees age out
    controller.advance(Duration::days(91));
    let outcome = ledger.apply_late_fee(account.id)?;
    println!("\n91 days later: charged £{}", outcome.fee_applied);

    // the trailing 30-day statement
    let statement = ledger.statement(account.id)?;
    println!(
        "\nstatement {} to {}",
        statement.period_start.format("%Y-%m-%d"),
        statement.period_end.format("%Y-%m-%d")
    );
    println!("  entries: {}", statement.transactions.len());
    println!("  interest: £{}", statement.summary.total_interest);
    println!("  late fees: £{}", statement.summary.total_late_fees);
    println!("  closing balance: £{}", statement.summary.closing_balance);

    Ok(())
}
