use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LedgerConfig;
use crate::decimal::Rate;
use crate::entities::RewardAdjustment;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::repayment::REWARD_ELIGIBLE_PERCENTAGE;
use crate::store::EntityStore;
use crate::types::{AdjustmentId, UserId};

/// outcome of a reward check
///
/// when ineligible, `reason` says why and the rates are unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDecision {
    pub eligible: bool,
    pub reason: Option<String>,
    pub old_apr: Rate,
    pub new_apr: Rate,
    pub adjustment_id: Option<AdjustmentId>,
}

impl RewardDecision {
    fn ineligible(apr: Rate, reason: String) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
            old_apr: apr,
            new_apr: apr,
            adjustment_id: None,
        }
    }

    /// rate cut granted by this decision
    pub fn reduction(&self) -> Rate {
        self.old_apr - self.new_apr
    }
}

/// reward engine
///
/// inspects a user's recent repayments across all active accounts and
/// lowers the rate when every one of them qualifies. the user's rate,
/// every active account's rate and the audit record change in one
/// atomic store call.
pub struct RewardEngine<'a, S: EntityStore> {
    store: &'a S,
    config: &'a LedgerConfig,
    time: &'a SafeTimeProvider,
    pub events: EventStore,
}

impl<'a, S: EntityStore> RewardEngine<'a, S> {
    pub fn new(store: &'a S, config: &'a LedgerConfig, time: &'a SafeTimeProvider) -> Self {
        Self {
            store,
            config,
            time,
            events: EventStore::new(),
        }
    }

    /// check a user's recent repayment record and apply a rate cut if it
    /// qualifies
    pub fn check_and_apply(&mut self, user_id: UserId) -> Result<RewardDecision> {
        let mut user = self.store.user(user_id)?;

        let mut accounts = self.store.active_accounts_for_user(user_id)?;
        if accounts.is_empty() {
            return Ok(RewardDecision::ineligible(
                user.apr,
                "no active loan accounts".to_string(),
            ));
        }

        let account_ids: Vec<_> = accounts.iter().map(|a| a.id).collect();
        let threshold = self.config.reward_threshold;
        let recent = self.store.recent_repayments(&account_ids, threshold)?;

        if recent.len() < threshold {
            return Ok(RewardDecision::ineligible(
                user.apr,
                format!(
                    "not enough repayments: need {}, have {}",
                    threshold,
                    recent.len()
                ),
            ));
        }

        // every one of the recent repayments must qualify on its own
        if recent
            .iter()
            .any(|r| r.percentage_of_balance < REWARD_ELIGIBLE_PERCENTAGE)
        {
            return Ok(RewardDecision::ineligible(
                user.apr,
                format!(
                    "a recent repayment fell below {}% of balance",
                    REWARD_ELIGIBLE_PERCENTAGE
                ),
            ));
        }

        // checked before applying so a zero-delta adjustment is never recorded
        if user.apr <= self.config.min_apr {
            return Ok(RewardDecision::ineligible(
                user.apr,
                "apr already at minimum threshold".to_string(),
            ));
        }

        let old_apr = user.apr;
        let new_apr = (old_apr - self.config.apr_reduction).max(self.config.min_apr);

        user.apr = new_apr;
        for account in &mut accounts {
            account.apr = new_apr;
        }

        let now = self.time.now();
        let adjustment = RewardAdjustment::record(
            user_id,
            old_apr,
            new_apr,
            format!("reward for {} consecutive qualifying repayments", threshold),
            now,
        );
        let adjustment_id = adjustment.id;
        self.store.apply_rate_change(&user, &accounts, adjustment)?;

        info!(%user_id, %old_apr, %new_apr, accounts = accounts.len(), "reduced apr");
        self.events.emit(Event::AprReduced {
            user_id,
            adjustment_id,
            old_apr,
            new_apr,
            accounts_updated: accounts.len(),
            timestamp: now,
        });

        Ok(RewardDecision {
            eligible: true,
            reason: None,
            old_apr,
            new_apr,
            adjustment_id: Some(adjustment_id),
        })
    }

    /// all rate adjustments for a user, newest first
    pub fn history(&self, user_id: UserId) -> Result<Vec<RewardAdjustment>> {
        self.store.user(user_id)?;
        self.store.adjustments_for_user(user_id)
    }
}
