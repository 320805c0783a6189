use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a user
pub type UserId = Uuid;

/// unique identifier for a credit account
pub type AccountId = Uuid;

/// unique identifier for a ledger transaction
pub type TransactionId = Uuid;

/// unique identifier for a repayment record
pub type RepaymentId = Uuid;

/// unique identifier for a reward adjustment
pub type AdjustmentId = Uuid;

/// unique identifier for a payment card
pub type CardId = Uuid;

/// user kyc status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

/// user account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Suspended,
    Closed,
}

/// ledger transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// spend drawn against the credit line
    Purchase,
    /// caller-driven balance reduction
    Repayment,
    /// charge added to the balance (late fees flagged separately)
    Fee,
    /// daily interest accrual
    Interest,
}

/// how a repayment was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentMethod {
    Auto,
    Manual,
}

/// payment card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Virtual,
    Physical,
}

/// payment card status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    Active,
    Locked,
    Expired,
    Cancelled,
}
