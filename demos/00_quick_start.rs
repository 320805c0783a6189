/// quick start - minimal example to get started
use credit_ledger_rs::{
    AccountLedger, EntityStore, LedgerConfig, MemoryStore, Money, RepaymentMethod,
    RepaymentProcessor, SafeTimeProvider, TimeSource, User,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    let config = LedgerConfig::default();
    let time = SafeTimeProvider::new(TimeSource::System);

    // onboard a user at the default rate
    let user = User::onboard(
        "Ada Lovelace".to_string(),
        "ada@example.com".to_string(),
        None,
        config.default_apr,
        time.now(),
    );
    store.insert_user(user.clone())?;

    // open a £2,000 credit line and spend on it
    let mut ledger = AccountLedger::new(&store, &config, &time);
    let account = ledger.open_account(user.id, Money::from_major(2_000), None)?;
    ledger.record_purchase(account.id, Money::from_decimal(dec!(149.99)), "headphones")?;
    ledger.record_purchase(account.id, Money::from_major(850), "flights")?;

    // look at the repayment menu
    let mut processor = RepaymentProcessor::new(&store, &config, &time);
    let menu = processor.options(account.id)?;
    for option in &menu.options {
        println!(
            "repay {}% = £{} (saves £{} interest)",
            option.percentage, option.amount, option.interest_saved
        );
    }

    // take the 25% option
    let outcome = processor.process(account.id, menu.options[1].amount, RepaymentMethod::Manual)?;
    println!(
        "\nrepaid £{} ({}% of balance)",
        outcome.amount,
        outcome.percentage_of_balance.round_dp(1)
    );
    println!("new balance: £{}", outcome.new_balance);
    println!("eligible for reward: {}", outcome.eligible_for_reward);

    Ok(())
}
