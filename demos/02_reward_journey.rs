/// reward journey - qualifying repayments lower the rate on every account
use chrono::{Duration, TimeZone, Utc};
use credit_ledger_rs::{
    AccountLedger, EntityStore, LedgerConfig, MemoryStore, Money, RepaymentMethod,
    RepaymentProcessor, RewardEngine, SafeTimeProvider, TimeSource, User,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== reward journey ===\n");

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
    println!("onboarded at {} APR", store.user(user.id)?.apr);

    // two credit lines, both carrying a balance
    let mut ledger = AccountLedger::new(&store, &config, &time);
    let card = ledger.open_account(user.id, Money::from_major(3_000), None)?;
    let loan = ledger.open_account(user.id, Money::from_major(8_000), None)?;
    ledger.record_purchase(card.id, Money::from_major(1_200), "laptop")?;
    ledger.record_purchase(loan.id, Money::from_major(4_000), "kitchen refit")?;

    // three monthly repayments, each at least 10% of the balance
    let mut processor = RepaymentProcessor::new(&store, &config, &time);
    let mut engine = RewardEngine::new(&store, &config, &time);

    for month in 1..=3 {
        controller.advance(Duration::days(30));
        let outcome = processor.process(card.id, Money::from_major(200), RepaymentMethod::Auto)?;
        println!(
            "month {}: repaid £{} ({}% of balance), qualifies: {}",
            month,
            outcome.amount,
            outcome.percentage_of_balance.round_dp(1),
            outcome.eligible_for_reward
        );

        let decision = engine.check_and_apply(user.id)?;
        match decision.reason {
            Some(reason) => println!("  reward check: {}", reason),
            None => println!(
                "  reward granted: {} -> {}",
                decision.old_apr, decision.new_apr
            ),
        }
    }

    // the cut lands on the user and on both accounts together
    println!("\nuser APR: {}", store.user(user.id)?.apr);
    println!("card APR: {}", store.account(card.id)?.apr);
    println!("loan APR: {}", store.account(loan.id)?.apr);

    // a token repayment breaks the streak for the next check
    controller.advance(Duration::days(30));
    processor.process(card.id, Money::from_major(10), RepaymentMethod::Manual)?;
    let decision = engine.check_and_apply(user.id)?;
    println!("\nafter a token repayment: {}", decision.reason.unwrap());

    println!("\nadjustment history:");
    for adjustment in engine.history(user.id)? {
        println!(
            "  {}: {} -> {} ({})",
            adjustment.adjusted_at.format("%Y-%m-%d"),
            adjustment.old_apr,
            adjustment.new_apr,
            adjustment.reason
        );
    }

    Ok(())
}
