use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{Account, Card, Repayment, RewardAdjustment, Transaction, User};
use crate::errors::{LedgerError, Result};
use crate::types::{AccountId, CardId, RepaymentId, UserId};

/// persistence boundary for the ledger core
///
/// each method is one atomic unit against the backing store. the
/// composite commit methods exist so a ledger mutation (balance change
/// plus its dependent records) is a single call with no observable
/// intermediate state; two concurrent operations on the same account or
/// user serialize behind the implementation's locking.
pub trait EntityStore: Send + Sync {
    fn insert_user(&self, user: User) -> Result<()>;
    fn user(&self, id: UserId) -> Result<User>;

    fn insert_account(&self, account: Account) -> Result<()>;
    fn account(&self, id: AccountId) -> Result<Account>;
    /// active accounts for a user, oldest first
    fn active_accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>>;

    fn insert_card(&self, card: Card) -> Result<()>;
    fn card(&self, id: CardId) -> Result<Card>;
    fn update_card(&self, card: &Card) -> Result<()>;

    /// full transaction history for an account, newest first
    fn transactions_for_account(&self, account_id: AccountId) -> Result<Vec<Transaction>>;
    /// transactions posted on or after `since`, newest first
    fn transactions_since(
        &self,
        account_id: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;
    /// late-fee transactions posted on or after `since`
    fn late_fee_count_since(&self, account_id: AccountId, since: DateTime<Utc>) -> Result<usize>;

    fn repayment(&self, id: RepaymentId) -> Result<Repayment>;
    /// the most recent repayments across the given accounts, newest
    /// first, ties on date broken by insertion order (deterministic)
    fn recent_repayments(&self, account_ids: &[AccountId], limit: usize) -> Result<Vec<Repayment>>;

    /// reward adjustments for a user, newest first
    fn adjustments_for_user(&self, user_id: UserId) -> Result<Vec<RewardAdjustment>>;

    /// atomically write back a mutated account and append one ledger entry
    fn commit_posting(&self, account: &Account, tx: Transaction) -> Result<()>;
    /// atomically write back a mutated account, record the repayment, and
    /// append its ledger entry
    fn commit_repayment(
        &self,
        account: &Account,
        repayment: Repayment,
        tx: Transaction,
    ) -> Result<()>;
    /// atomically write back a rate change on the user and every listed
    /// account, and record the adjustment
    fn apply_rate_change(
        &self,
        user: &User,
        accounts: &[Account],
        adjustment: RewardAdjustment,
    ) -> Result<()>;
}

#[derive(Debug, Default, Serialize)]
struct Tables {
    users: HashMap<UserId, User>,
    accounts: HashMap<AccountId, Account>,
    cards: HashMap<CardId, Card>,
    transactions: Vec<Transaction>,
    repayments: Vec<Repayment>,
    adjustments: Vec<RewardAdjustment>,
}

/// in-memory store
///
/// all tables sit behind one mutex, so every trait call is serialized
/// and atomic. transactions, repayments and adjustments are append-only
/// logs in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// dump all tables as json, for debugging and audit export
    pub fn snapshot(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&*self.tables())
    }
}

impl EntityStore for MemoryStore {
    fn insert_user(&self, user: User) -> Result<()> {
        self.tables().users.insert(user.id, user);
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<User> {
        self.tables()
            .users
            .get(&id)
            .cloned()
            .ok_or(LedgerError::UserNotFound { id })
    }

    fn insert_account(&self, account: Account) -> Result<()> {
        self.tables().accounts.insert(account.id, account);
        Ok(())
    }

    fn account(&self, id: AccountId) -> Result<Account> {
        self.tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound { id })
    }

    fn active_accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>> {
        let tables = self.tables();
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|a| a.user_id == user_id && a.is_active)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    fn insert_card(&self, card: Card) -> Result<()> {
        self.tables().cards.insert(card.id, card);
        Ok(())
    }

    fn card(&self, id: CardId) -> Result<Card> {
        self.tables()
            .cards
            .get(&id)
            .cloned()
            .ok_or(LedgerError::CardNotFound { id })
    }

    fn update_card(&self, card: &Card) -> Result<()> {
        let mut tables = self.tables();
        if !tables.cards.contains_key(&card.id) {
            return Err(LedgerError::CardNotFound { id: card.id });
        }
        tables.cards.insert(card.id, card.clone());
        Ok(())
    }

    fn transactions_for_account(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let tables = self.tables();
        let mut txs: Vec<Transaction> = tables
            .transactions
            .iter()
            .rev()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(txs)
    }

    fn transactions_since(
        &self,
        account_id: AccountId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let mut txs = self.transactions_for_account(account_id)?;
        txs.retain(|t| t.posted_at >= since);
        Ok(txs)
    }

    fn late_fee_count_since(&self, account_id: AccountId, since: DateTime<Utc>) -> Result<usize> {
        let tables = self.tables();
        Ok(tables
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id && t.is_late_fee && t.posted_at >= since)
            .count())
    }

    fn repayment(&self, id: RepaymentId) -> Result<Repayment> {
        self.tables()
            .repayments
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(LedgerError::RepaymentNotFound { id })
    }

    fn recent_repayments(&self, account_ids: &[AccountId], limit: usize) -> Result<Vec<Repayment>> {
        let tables = self.tables();
        // walk the append log newest-insertion-first, then stable-sort by
        // date so equal timestamps keep insertion order
        let mut repayments: Vec<Repayment> = tables
            .repayments
            .iter()
            .rev()
            .filter(|r| account_ids.contains(&r.account_id))
            .cloned()
            .collect();
        repayments.sort_by(|a, b| b.repaid_at.cmp(&a.repaid_at));
        repayments.truncate(limit);
        Ok(repayments)
    }

    fn adjustments_for_user(&self, user_id: UserId) -> Result<Vec<RewardAdjustment>> {
        let tables = self.tables();
        let mut adjustments: Vec<RewardAdjustment> = tables
            .adjustments
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        adjustments.sort_by(|a, b| b.adjusted_at.cmp(&a.adjusted_at));
        Ok(adjustments)
    }

    fn commit_posting(&self, account: &Account, tx: Transaction) -> Result<()> {
        let mut tables = self.tables();
        if !tables.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountNotFound { id: account.id });
        }
        tables.accounts.insert(account.id, account.clone());
        tables.transactions.push(tx);
        Ok(())
    }

    fn commit_repayment(
        &self,
        account: &Account,
        repayment: Repayment,
        tx: Transaction,
    ) -> Result<()> {
        let mut tables = self.tables();
        if !tables.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountNotFound { id: account.id });
        }
        tables.accounts.insert(account.id, account.clone());
        tables.repayments.push(repayment);
        tables.transactions.push(tx);
        Ok(())
    }

    fn apply_rate_change(
        &self,
        user: &User,
        accounts: &[Account],
        adjustment: RewardAdjustment,
    ) -> Result<()> {
        let mut tables = self.tables();
        if !tables.users.contains_key(&user.id) {
            return Err(LedgerError::UserNotFound { id: user.id });
        }
        for account in accounts {
            if !tables.accounts.contains_key(&account.id) {
                return Err(LedgerError::AccountNotFound { id: account.id });
            }
        }
        tables.users.insert(user.id, user.clone());
        for account in accounts {
            tables.accounts.insert(account.id, account.clone());
        }
        tables.adjustments.push(adjustment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::types::{RepaymentMethod, TransactionType};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn seeded_account(store: &MemoryStore) -> Account {
        let user = User::onboard(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            None,
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );
        let account = Account::open(
            user.id,
            Money::from_major(1_000),
            user.apr,
            Utc::now(),
        );
        store.insert_user(user).unwrap();
        store.insert_account(account.clone()).unwrap();
        account
    }

    #[test]
    fn test_missing_lookups_are_not_found() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.user(Uuid::new_v4()),
            Err(LedgerError::UserNotFound { .. })
        ));
        assert!(matches!(
            store.account(Uuid::new_v4()),
            Err(LedgerError::AccountNotFound { .. })
        ));
        assert!(matches!(
            store.repayment(Uuid::new_v4()),
            Err(LedgerError::RepaymentNotFound { .. })
        ));
    }

    #[test]
    fn test_commit_posting_is_atomic() {
        let store = MemoryStore::new();
        let mut account = seeded_account(&store);

        account.balance += Money::from_major(50);
        let tx = Transaction::post(
            account.id,
            TransactionType::Purchase,
            Money::from_major(50),
            "coffee machine".to_string(),
            Utc::now(),
        );
        store.commit_posting(&account, tx).unwrap();

        assert_eq!(store.account(account.id).unwrap().balance, Money::from_major(50));
        assert_eq!(store.transactions_for_account(account.id).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_posting_unknown_account_leaves_no_trace() {
        let store = MemoryStore::new();
        let account = Account::open(
            Uuid::new_v4(),
            Money::from_major(100),
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );
        let tx = Transaction::post(
            account.id,
            TransactionType::Purchase,
            Money::from_major(10),
            "ghost".to_string(),
            Utc::now(),
        );

        assert!(store.commit_posting(&account, tx).is_err());
        assert!(store.transactions_for_account(account.id).unwrap().is_empty());
    }

    #[test]
    fn test_late_fee_count_respects_window() {
        let store = MemoryStore::new();
        let account = seeded_account(&store);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        for days_ago in [120, 60, 10] {
            let tx = Transaction::post_late_fee(
                account.id,
                Money::from_decimal(dec!(5.00)),
                "Late payment fee".to_string(),
                now - Duration::days(days_ago),
            );
            store.commit_posting(&account, tx).unwrap();
        }

        let since = now - Duration::days(90);
        assert_eq!(store.late_fee_count_since(account.id, since).unwrap(), 2);
    }

    #[test]
    fn test_recent_repayments_order_and_tie_break() {
        let store = MemoryStore::new();
        let account = seeded_account(&store);
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let mut ids = Vec::new();
        // two on the same instant, one earlier
        for (offset, label) in [(0, "first"), (0, "second"), (-5, "older")] {
            let repayment = Repayment::record(
                account.id,
                Money::from_major(100),
                RepaymentMethod::Manual,
                dec!(10),
                Money::ZERO,
                base + Duration::days(offset),
            );
            ids.push((label, repayment.id));
            let tx = Transaction::post(
                account.id,
                TransactionType::Repayment,
                Money::from_major(100),
                label.to_string(),
                base + Duration::days(offset),
            );
            store.commit_repayment(&account, repayment, tx).unwrap();
        }

        let recent = store.recent_repayments(&[account.id], 2).unwrap();
        assert_eq!(recent.len(), 2);
        // newest insertion wins the tie on equal timestamps
        assert_eq!(recent[0].id, ids[1].1);
        assert_eq!(recent[1].id, ids[0].1);
    }

    #[test]
    fn test_active_accounts_excludes_inactive() {
        let store = MemoryStore::new();
        let account = seeded_account(&store);
        let mut closed = Account::open(
            account.user_id,
            Money::from_major(500),
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );
        closed.is_active = false;
        store.insert_account(closed).unwrap();

        let active = store.active_accounts_for_user(account.user_id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, account.id);
    }

    #[test]
    fn test_snapshot_serializes_tables() {
        let store = MemoryStore::new();
        seeded_account(&store);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot["users"].as_object().unwrap().len(), 1);
        assert_eq!(snapshot["accounts"].as_object().unwrap().len(), 1);
    }
}
