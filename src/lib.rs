pub mod accounts;
pub mod cards;
pub mod config;
pub mod decimal;
pub mod entities;
pub mod errors;
pub mod events;
pub mod interest;
pub mod repayment;
pub mod reward;
pub mod store;
pub mod types;

// re-export key types
pub use accounts::{
    AccountLedger, InterestAccrual, LateFeeOutcome, PurchaseOutcome, Statement, StatementSummary,
};
pub use cards::{mask_cvv, mask_pan, CardDesk, CardStatusOutcome};
pub use config::LedgerConfig;
pub use decimal::{Money, Rate};
pub use entities::{Account, Card, Repayment, RewardAdjustment, Transaction, User};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use interest::{InterestEngine, RepaymentOption, PROJECTION_DAYS};
pub use repayment::{
    RepaymentMenu, RepaymentOutcome, RepaymentProcessor, REWARD_ELIGIBLE_PERCENTAGE,
};
pub use reward::{RewardDecision, RewardEngine};
pub use store::{EntityStore, MemoryStore};
pub use types::{
    AccountId, AdjustmentId, CardId, CardStatus, CardType, KycStatus, RepaymentId,
    RepaymentMethod, TransactionId, TransactionType, UserId, UserStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
