use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::entities::{Account, Transaction};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::interest::InterestEngine;
use crate::store::EntityStore;
use crate::types::{AccountId, TransactionId, TransactionType, UserId};

/// statements cover the trailing 30 days
const STATEMENT_WINDOW_DAYS: i64 = 30;

/// result of a daily interest application
///
/// a zero balance yields a zero accrual with no transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestAccrual {
    pub interest_applied: Money,
    pub new_balance: Money,
    pub transaction_id: Option<TransactionId>,
}

/// result of a late fee application
///
/// when nothing was charged, `reason` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateFeeOutcome {
    pub fee_applied: Money,
    pub new_balance: Money,
    pub transaction_id: Option<TransactionId>,
    pub reason: Option<String>,
}

/// result of recording a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub new_balance: Money,
}

/// totals over a statement period, partitioned by entry type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub total_purchases: Money,
    pub total_repayments: Money,
    pub total_interest: Money,
    pub total_fees: Money,
    pub total_late_fees: Money,
    pub closing_balance: Money,
    pub apr: Rate,
}

/// account statement for the trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub account_id: AccountId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub summary: StatementSummary,
}

/// ledger account operations
///
/// the mutable aggregate over a single account: opening, purchases,
/// daily interest accrual and capped late fees. every mutation is one
/// atomic store commit and emits one event.
pub struct AccountLedger<'a, S: EntityStore> {
    store: &'a S,
    config: &'a LedgerConfig,
    time: &'a SafeTimeProvider,
    interest: InterestEngine,
    pub events: EventStore,
}

impl<'a, S: EntityStore> AccountLedger<'a, S> {
    pub fn new(store: &'a S, config: &'a LedgerConfig, time: &'a SafeTimeProvider) -> Self {
        Self {
            store,
            config,
            time,
            interest: InterestEngine::new(config.day_count_basis),
            events: EventStore::new(),
        }
    }

    /// open a credit account for a user
    ///
    /// the rate defaults to the user's nominal rate when not given.
    pub fn open_account(
        &mut self,
        user_id: UserId,
        credit_limit: Money,
        apr: Option<Rate>,
    ) -> Result<Account> {
        let user = self.store.user(user_id)?;
        if !credit_limit.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: credit_limit,
            });
        }

        let apr = apr.unwrap_or(user.apr);
        let now = self.time.now();
        let account = Account::open(user_id, credit_limit, apr, now);
        self.store.insert_account(account.clone())?;

        info!(account_id = %account.id, user_id = %user_id, %apr, "opened account");
        self.events.emit(Event::AccountOpened {
            account_id: account.id,
            user_id,
            credit_limit,
            apr,
            timestamp: now,
        });

        Ok(account)
    }

    /// record a purchase against the credit line
    pub fn record_purchase(
        &mut self,
        account_id: AccountId,
        amount: Money,
        description: &str,
    ) -> Result<PurchaseOutcome> {
        let mut account = self.store.account(account_id)?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let now = self.time.now();
        account.balance += amount;
        let tx = Transaction::post(
            account_id,
            TransactionType::Purchase,
            amount,
            description.to_string(),
            now,
        );
        let transaction_id = tx.id;
        self.store.commit_posting(&account, tx)?;

        debug!(%account_id, %amount, new_balance = %account.balance, "recorded purchase");
        self.events.emit(Event::PurchaseRecorded {
            account_id,
            transaction_id,
            amount,
            new_balance: account.balance,
            timestamp: now,
        });

        Ok(PurchaseOutcome {
            transaction_id,
            amount,
            new_balance: account.balance,
        })
    }

    /// apply one day of interest to an account
    ///
    /// nothing accrues on a zero or negative balance and no transaction
    /// is written.
    pub fn apply_daily_interest(&mut self, account_id: AccountId) -> Result<InterestAccrual> {
        let mut account = self.store.account(account_id)?;

        if !account.balance.is_positive() {
            return Ok(InterestAccrual {
                interest_applied: Money::ZERO,
                new_balance: account.balance,
                transaction_id: None,
            });
        }

        let interest = self
            .interest
            .daily_interest(account.balance, account.apr)
            .round_dp(2);

        let now = self.time.now();
        account.balance += interest;
        let tx = Transaction::post(
            account_id,
            TransactionType::Interest,
            interest,
            format!("Daily interest at {} APR", account.apr),
            now,
        );
        let transaction_id = tx.id;
        self.store.commit_posting(&account, tx)?;

        debug!(%account_id, %interest, new_balance = %account.balance, "accrued daily interest");
        self.events.emit(Event::InterestAccrued {
            account_id,
            transaction_id,
            amount: interest,
            new_balance: account.balance,
            apr: account.apr,
            timestamp: now,
        });

        Ok(InterestAccrual {
            interest_applied: interest,
            new_balance: account.balance,
            transaction_id: Some(transaction_id),
        })
    }

    /// apply a late fee if the account is chargeable
    ///
    /// fees are capped within the trailing window; the count comes from
    /// live transaction data on every call, never a stored counter.
    pub fn apply_late_fee(&mut self, account_id: AccountId) -> Result<LateFeeOutcome> {
        let mut account = self.store.account(account_id)?;

        if !account.balance.is_positive() {
            return Ok(LateFeeOutcome {
                fee_applied: Money::ZERO,
                new_balance: account.balance,
                transaction_id: None,
                reason: Some("no outstanding balance".to_string()),
            });
        }

        let now = self.time.now();
        let window_start = now - Duration::days(self.config.late_fee_window_days);
        let charged = self.store.late_fee_count_since(account_id, window_start)?;
        if charged >= self.config.late_fee_cap as usize {
            return Ok(LateFeeOutcome {
                fee_applied: Money::ZERO,
                new_balance: account.balance,
                transaction_id: None,
                reason: Some(format!(
                    "maximum number of late fees ({}) already applied within {} days",
                    self.config.late_fee_cap, self.config.late_fee_window_days
                )),
            });
        }

        let fee = self.config.late_fee;
        account.balance += fee;
        let tx = Transaction::post_late_fee(
            account_id,
            fee,
            "Late payment fee".to_string(),
            now,
        );
        let transaction_id = tx.id;
        self.store.commit_posting(&account, tx)?;

        debug!(%account_id, %fee, new_balance = %account.balance, "charged late fee");
        self.events.emit(Event::LateFeeCharged {
            account_id,
            transaction_id,
            amount: fee,
            new_balance: account.balance,
            timestamp: now,
        });

        Ok(LateFeeOutcome {
            fee_applied: fee,
            new_balance: account.balance,
            transaction_id: Some(transaction_id),
            reason: None,
        })
    }

    /// full transaction history, newest first
    pub fn transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        self.store.account(account_id)?;
        self.store.transactions_for_account(account_id)
    }

    /// statement for the trailing 30 days
    pub fn statement(&self, account_id: AccountId) -> Result<Statement> {
        let account = self.store.account(account_id)?;
        let period_end = self.time.now();
        let period_start = period_end - Duration::days(STATEMENT_WINDOW_DAYS);
        let transactions = self.store.transactions_since(account_id, period_start)?;

        let mut summary = StatementSummary {
            total_purchases: Money::ZERO,
            total_repayments: Money::ZERO,
            total_interest: Money::ZERO,
            total_fees: Money::ZERO,
            total_late_fees: Money::ZERO,
            closing_balance: account.balance,
            apr: account.apr,
        };
        for tx in &transactions {
            match tx.tx_type {
                TransactionType::Purchase => summary.total_purchases += tx.amount,
                TransactionType::Repayment => summary.total_repayments += tx.amount,
                TransactionType::Interest => summary.total_interest += tx.amount,
                TransactionType::Fee => {
                    summary.total_fees += tx.amount;
                    if tx.is_late_fee {
                        summary.total_late_fees += tx.amount;
                    }
                }
            }
        }

        Ok(Statement {
            account_id,
            period_start,
            period_end,
            transactions,
            summary,
        })
    }
}
