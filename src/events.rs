use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{AccountId, AdjustmentId, CardId, CardStatus, RepaymentId, TransactionId, UserId};

/// all events emitted by ledger operations
///
/// every state mutation emits exactly one event; no-ops emit nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    AccountOpened {
        account_id: AccountId,
        user_id: UserId,
        credit_limit: Money,
        apr: Rate,
        timestamp: DateTime<Utc>,
    },
    PurchaseRecorded {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Money,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    InterestAccrued {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Money,
        new_balance: Money,
        apr: Rate,
        timestamp: DateTime<Utc>,
    },
    LateFeeCharged {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Money,
        new_balance: Money,
        timestamp: DateTime<Utc>,
    },
    RepaymentReceived {
        account_id: AccountId,
        repayment_id: RepaymentId,
        amount: Money,
        new_balance: Money,
        eligible_for_reward: bool,
        timestamp: DateTime<Utc>,
    },
    AprReduced {
        user_id: UserId,
        adjustment_id: AdjustmentId,
        old_apr: Rate,
        new_apr: Rate,
        accounts_updated: usize,
        timestamp: DateTime<Utc>,
    },
    CardIssued {
        card_id: CardId,
        account_id: AccountId,
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    CardStatusChanged {
        card_id: CardId,
        old_status: CardStatus,
        new_status: CardStatus,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        store.emit(Event::CardStatusChanged {
            card_id: Uuid::new_v4(),
            old_status: CardStatus::Active,
            new_status: CardStatus::Locked,
            timestamp: Utc::now(),
        });
        store.emit(Event::AccountOpened {
            account_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            credit_limit: Money::from_major(1_000),
            apr: Rate::from_percentage(dec!(25.0)),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 2);
        let drained = store.take_events();
        assert_eq!(drained.len(), 2);
        assert!(store.events().is_empty());
    }
}
