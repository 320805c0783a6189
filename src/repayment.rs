use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::entities::{Repayment, Transaction};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{InterestEngine, RepaymentOption};
use crate::store::EntityStore;
use crate::types::{AccountId, RepaymentId, RepaymentMethod, TransactionType};

/// a repayment at or above this share of the pre-deduction balance
/// counts toward a reward
pub const REWARD_ELIGIBLE_PERCENTAGE: Decimal = dec!(10);

/// result of processing a repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    pub repayment_id: RepaymentId,
    /// the applied amount, after clamping to the balance
    pub amount: Money,
    /// share of the balance before deduction
    pub percentage_of_balance: Decimal,
    pub interest_saved: Money,
    pub new_balance: Money,
    pub eligible_for_reward: bool,
}

/// the repayment menu for an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentMenu {
    pub balance: Money,
    pub apr: Rate,
    pub options: Vec<RepaymentOption>,
}

/// repayment processor
///
/// validates and caps a caller-provided amount, records the repayment
/// with its pre-deduction percentage and savings estimate, and deducts
/// the balance — all in one atomic store commit.
pub struct RepaymentProcessor<'a, S: EntityStore> {
    store: &'a S,
    config: &'a LedgerConfig,
    time: &'a SafeTimeProvider,
    interest: InterestEngine,
    pub events: EventStore,
}

impl<'a, S: EntityStore> RepaymentProcessor<'a, S> {
    pub fn new(store: &'a S, config: &'a LedgerConfig, time: &'a SafeTimeProvider) -> Self {
        Self {
            store,
            config,
            time,
            interest: InterestEngine::new(config.day_count_basis),
            events: EventStore::new(),
        }
    }

    /// process a repayment against an account
    ///
    /// an amount above the balance is clamped to it silently; the caller
    /// sees the applied amount in the result.
    pub fn process(
        &mut self,
        account_id: AccountId,
        amount: Money,
        method: RepaymentMethod,
    ) -> Result<RepaymentOutcome> {
        let mut account = self.store.account(account_id)?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let amount = amount.min(account.balance);

        // percentage of the balance before deduction; a zero balance
        // counts as a full repayment by convention
        let percentage_of_balance = if account.balance.is_positive() {
            amount.as_decimal() / account.balance.as_decimal() * Decimal::from(100)
        } else {
            Decimal::from(100)
        };

        let interest_saved =
            self.interest
                .interest_savings(account.balance, account.apr, amount);

        let now = self.time.now();
        let repayment = Repayment::record(
            account_id,
            amount,
            method,
            percentage_of_balance,
            interest_saved,
            now,
        );
        let repayment_id = repayment.id;

        account.balance -= amount;
        let tx = Transaction::post(
            account_id,
            TransactionType::Repayment,
            amount,
            format!(
                "Repayment of £{} ({}% of balance)",
                amount.round_dp(2),
                percentage_of_balance.round_dp(1)
            ),
            now,
        );
        self.store.commit_repayment(&account, repayment, tx)?;

        // read back the record it just wrote; eligibility always comes
        // from persisted state
        let eligible_for_reward = self.is_eligible_for_reward(repayment_id)?;

        info!(
            %account_id,
            %amount,
            new_balance = %account.balance,
            eligible_for_reward,
            "processed repayment"
        );
        self.events.emit(Event::RepaymentReceived {
            account_id,
            repayment_id,
            amount,
            new_balance: account.balance,
            eligible_for_reward,
            timestamp: now,
        });

        Ok(RepaymentOutcome {
            repayment_id,
            amount,
            percentage_of_balance,
            interest_saved,
            new_balance: account.balance,
            eligible_for_reward,
        })
    }

    /// the repayment menu for an account's current balance and rate
    pub fn options(&self, account_id: AccountId) -> Result<RepaymentMenu> {
        let account = self.store.account(account_id)?;
        Ok(RepaymentMenu {
            balance: account.balance,
            apr: account.apr,
            options: self.interest.repayment_options(
                account.balance,
                account.apr,
                &self.config.repayment_percentages,
            ),
        })
    }

    /// whether a recorded repayment counts toward a reward
    pub fn is_eligible_for_reward(&self, repayment_id: RepaymentId) -> Result<bool> {
        let repayment = self.store.repayment(repayment_id)?;
        Ok(repayment.percentage_of_balance >= REWARD_ELIGIBLE_PERCENTAGE)
    }
}
