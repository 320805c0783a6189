use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::Card;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::store::EntityStore;
use crate::types::{AccountId, CardId, CardStatus, CardType, UserId};

/// result of a lock or unlock request
///
/// requests that find the card already in (or barred from) the target
/// state are no-ops with a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardStatusOutcome {
    pub card_id: CardId,
    pub changed: bool,
    pub status: CardStatus,
    pub reason: Option<String>,
}

/// mask a primary account number, keeping the last four digits
///
/// accepts 13-19 digits with optional spaces or dashes; returns `None`
/// for anything else. output is grouped in fours.
pub fn mask_pan(pan: &str) -> Option<String> {
    let clean: String = pan.chars().filter(|c| *c != ' ' && *c != '-').collect();
    if !(13..=19).contains(&clean.len()) || !clean.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let masked: String = "X"
        .repeat(clean.len() - 4)
        .chars()
        .chain(clean[clean.len() - 4..].chars())
        .collect();
    let grouped: Vec<String> = masked
        .as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();
    Some(grouped.join(" "))
}

/// mask a cvv completely
pub fn mask_cvv(cvv: &str) -> Option<String> {
    if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some("X".repeat(cvv.len()))
}

/// card issuing and controls
///
/// the store only ever sees a masked pan.
pub struct CardDesk<'a, S: EntityStore> {
    store: &'a S,
    time: &'a SafeTimeProvider,
    pub events: EventStore,
}

impl<'a, S: EntityStore> CardDesk<'a, S> {
    pub fn new(store: &'a S, time: &'a SafeTimeProvider) -> Self {
        Self {
            store,
            time,
            events: EventStore::new(),
        }
    }

    /// issue a card against a user's account
    pub fn issue(
        &mut self,
        user_id: UserId,
        account_id: AccountId,
        card_type: CardType,
        pan: &str,
    ) -> Result<Card> {
        self.store.user(user_id)?;
        let account = self.store.account(account_id)?;
        if account.user_id != user_id {
            // an account that belongs to someone else is invisible here
            return Err(LedgerError::AccountNotFound { id: account_id });
        }

        let masked_pan = mask_pan(pan).unwrap_or_default();
        let now = self.time.now();
        let card = Card::issue(user_id, account_id, card_type, masked_pan, now);
        self.store.insert_card(card.clone())?;

        info!(card_id = %card.id, %account_id, "issued card");
        self.events.emit(Event::CardIssued {
            card_id: card.id,
            account_id,
            user_id,
            timestamp: now,
        });

        Ok(card)
    }

    /// lock a card
    pub fn lock(&mut self, card_id: CardId) -> Result<CardStatusOutcome> {
        let mut card = self.store.card(card_id)?;

        if card.status == CardStatus::Locked {
            return Ok(CardStatusOutcome {
                card_id,
                changed: false,
                status: card.status,
                reason: Some("card is already locked".to_string()),
            });
        }

        let old_status = card.status;
        card.status = CardStatus::Locked;
        self.store.update_card(&card)?;

        info!(%card_id, "locked card");
        self.events.emit(Event::CardStatusChanged {
            card_id,
            old_status,
            new_status: CardStatus::Locked,
            timestamp: self.time.now(),
        });

        Ok(CardStatusOutcome {
            card_id,
            changed: true,
            status: CardStatus::Locked,
            reason: None,
        })
    }

    /// unlock a card
    ///
    /// expired and cancelled cards stay where they are.
    pub fn unlock(&mut self, card_id: CardId) -> Result<CardStatusOutcome> {
        let mut card = self.store.card(card_id)?;

        if card.status == CardStatus::Active {
            return Ok(CardStatusOutcome {
                card_id,
                changed: false,
                status: card.status,
                reason: Some("card is already active".to_string()),
            });
        }
        if matches!(card.status, CardStatus::Expired | CardStatus::Cancelled) {
            return Ok(CardStatusOutcome {
                card_id,
                changed: false,
                status: card.status,
                reason: Some(format!(
                    "card cannot be unlocked because it is {:?}",
                    card.status
                )),
            });
        }

        let old_status = card.status;
        card.status = CardStatus::Active;
        self.store.update_card(&card)?;

        info!(%card_id, "unlocked card");
        self.events.emit(Event::CardStatusChanged {
            card_id,
            old_status,
            new_status: CardStatus::Active,
            timestamp: self.time.now(),
        });

        Ok(CardStatusOutcome {
            card_id,
            changed: true,
            status: CardStatus::Active,
            reason: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::entities::{Account, User};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn seed(store: &MemoryStore) -> (User, Account) {
        let user = User::onboard(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            None,
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );
        let account = Account::open(user.id, Money::from_major(1_000), user.apr, Utc::now());
        store.insert_user(user.clone()).unwrap();
        store.insert_account(account.clone()).unwrap();
        (user, account)
    }

    #[test]
    fn test_mask_pan() {
        assert_eq!(
            mask_pan("4242 4242 4242 4242").as_deref(),
            Some("XXXX XXXX XXXX 4242")
        );
        assert_eq!(
            mask_pan("4242-4242-4242-4242").as_deref(),
            Some("XXXX XXXX XXXX 4242")
        );
        assert!(mask_pan("12345").is_none());
        assert!(mask_pan("not a pan number").is_none());
    }

    #[test]
    fn test_mask_cvv() {
        assert_eq!(mask_cvv("123").as_deref(), Some("XXX"));
        assert_eq!(mask_cvv("1234").as_deref(), Some("XXXX"));
        assert!(mask_cvv("12").is_none());
        assert!(mask_cvv("abc").is_none());
    }

    #[test]
    fn test_issue_stores_masked_pan_only() {
        let store = MemoryStore::new();
        let time = test_time();
        let (user, account) = seed(&store);
        let mut desk = CardDesk::new(&store, &time);

        let card = desk
            .issue(user.id, account.id, CardType::Physical, "4242424242424242")
            .unwrap();

        assert_eq!(card.masked_pan, "XXXX XXXX XXXX 4242");
        assert!(!card.masked_pan.contains("42424242"));
        assert_eq!(card.status, CardStatus::Active);
        assert_eq!(store.card(card.id).unwrap(), card);
    }

    #[test]
    fn test_issue_checks_ownership() {
        let store = MemoryStore::new();
        let time = test_time();
        let (_, account) = seed(&store);
        let (other_user, _) = seed(&store);
        let mut desk = CardDesk::new(&store, &time);

        let result = desk.issue(other_user.id, account.id, CardType::Virtual, "4242424242424242");
        assert!(matches!(result, Err(LedgerError::AccountNotFound { .. })));
    }

    #[test]
    fn test_lock_and_unlock_round_trip() {
        let store = MemoryStore::new();
        let time = test_time();
        let (user, account) = seed(&store);
        let mut desk = CardDesk::new(&store, &time);
        let card = desk
            .issue(user.id, account.id, CardType::Virtual, "4242424242424242")
            .unwrap();

        let locked = desk.lock(card.id).unwrap();
        assert!(locked.changed);
        assert_eq!(locked.status, CardStatus::Locked);

        let unlocked = desk.unlock(card.id).unwrap();
        assert!(unlocked.changed);
        assert_eq!(store.card(card.id).unwrap().status, CardStatus::Active);
    }

    #[test]
    fn test_lock_already_locked_is_noop() {
        let store = MemoryStore::new();
        let time = test_time();
        let (user, account) = seed(&store);
        let mut desk = CardDesk::new(&store, &time);
        let card = desk
            .issue(user.id, account.id, CardType::Virtual, "4242424242424242")
            .unwrap();

        desk.lock(card.id).unwrap();
        let again = desk.lock(card.id).unwrap();

        assert!(!again.changed);
        assert!(again.reason.unwrap().contains("already locked"));
    }

    #[test]
    fn test_unlock_cancelled_card_is_refused() {
        let store = MemoryStore::new();
        let time = test_time();
        let (user, account) = seed(&store);
        let mut desk = CardDesk::new(&store, &time);
        let mut card = desk
            .issue(user.id, account.id, CardType::Virtual, "4242424242424242")
            .unwrap();
        card.status = CardStatus::Cancelled;
        store.update_card(&card).unwrap();

        let outcome = desk.unlock(card.id).unwrap();

        assert!(!outcome.changed);
        assert!(outcome.reason.unwrap().contains("cannot be unlocked"));
        assert_eq!(store.card(card.id).unwrap().status, CardStatus::Cancelled);
    }

    #[test]
    fn test_unknown_card() {
        let store = MemoryStore::new();
        let time = test_time();
        let mut desk = CardDesk::new(&store, &time);

        assert!(matches!(
            desk.lock(Uuid::new_v4()),
            Err(LedgerError::CardNotFound { .. })
        ));
    }
}
