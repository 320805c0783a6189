use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::{
    AccountId, AdjustmentId, CardId, CardStatus, CardType, KycStatus, RepaymentId,
    RepaymentMethod, TransactionId, TransactionType, UserId, UserStatus,
};

/// a borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub kyc_status: KycStatus,
    /// nominal rate, propagated to accounts opened without an explicit rate
    pub apr: Rate,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// onboard a new user at the given nominal rate
    pub fn onboard(
        name: String,
        email: String,
        phone: Option<String>,
        apr: Rate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            kyc_status: KycStatus::Pending,
            apr,
            status: UserStatus::Active,
            created_at,
        }
    }
}

/// a revolving credit account
///
/// balance only moves through the ledger operations; the account is
/// never deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub opened_at: DateTime<Utc>,
    pub balance: Money,
    pub credit_limit: Money,
    pub apr: Rate,
    pub is_active: bool,
}

impl Account {
    /// open a new account with a zero balance
    pub fn open(
        user_id: UserId,
        credit_limit: Money,
        apr: Rate,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            opened_at,
            balance: Money::ZERO,
            credit_limit,
            apr,
            is_active: true,
        }
    }

    /// credit remaining before the limit is reached
    pub fn available_credit(&self) -> Money {
        (self.credit_limit - self.balance).max(Money::ZERO)
    }
}

/// a payment card linked to an account
///
/// only a masked pan is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub card_type: CardType,
    pub status: CardStatus,
    pub masked_pan: String,
    pub issued_at: DateTime<Utc>,
}

impl Card {
    pub fn issue(
        user_id: UserId,
        account_id: AccountId,
        card_type: CardType,
        masked_pan: String,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            card_type,
            status: CardStatus::Active,
            masked_pan,
            issued_at,
        }
    }
}

/// immutable ledger entry
///
/// created once and never mutated; balance changes are recorded
/// alongside each entry, not recomputed from the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub tx_type: TransactionType,
    pub amount: Money,
    pub is_late_fee: bool,
    pub description: String,
    pub posted_at: DateTime<Utc>,
}

impl Transaction {
    pub fn post(
        account_id: AccountId,
        tx_type: TransactionType,
        amount: Money,
        description: String,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            tx_type,
            amount,
            is_late_fee: false,
            description,
            posted_at,
        }
    }

    /// post a fee entry flagged as a late fee
    pub fn post_late_fee(
        account_id: AccountId,
        amount: Money,
        description: String,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_late_fee: true,
            ..Self::post(account_id, TransactionType::Fee, amount, description, posted_at)
        }
    }
}

/// immutable record of a repayment event
///
/// `percentage_of_balance` is relative to the balance before deduction;
/// it is the eligibility signal for rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: RepaymentId,
    pub account_id: AccountId,
    pub amount: Money,
    pub method: RepaymentMethod,
    pub percentage_of_balance: Decimal,
    pub interest_saved: Money,
    pub repaid_at: DateTime<Utc>,
}

impl Repayment {
    pub fn record(
        account_id: AccountId,
        amount: Money,
        method: RepaymentMethod,
        percentage_of_balance: Decimal,
        interest_saved: Money,
        repaid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            method,
            percentage_of_balance,
            interest_saved,
            repaid_at,
        }
    }
}

/// immutable audit record of a rate change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardAdjustment {
    pub id: AdjustmentId,
    pub user_id: UserId,
    pub old_apr: Rate,
    pub new_apr: Rate,
    pub reason: String,
    pub adjusted_at: DateTime<Utc>,
}

impl RewardAdjustment {
    pub fn record(
        user_id: UserId,
        old_apr: Rate,
        new_apr: Rate,
        reason: String,
        adjusted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            old_apr,
            new_apr,
            reason,
            adjusted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_opens_with_zero_balance() {
        let account = Account::open(
            Uuid::new_v4(),
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );

        assert!(account.balance.is_zero());
        assert!(account.is_active);
        assert_eq!(account.available_credit(), Money::from_major(1_000));
    }

    #[test]
    fn test_available_credit_floors_at_zero() {
        let mut account = Account::open(
            Uuid::new_v4(),
            Money::from_major(100),
            Rate::from_percentage(dec!(25.0)),
            Utc::now(),
        );
        account.balance = Money::from_major(150);

        assert_eq!(account.available_credit(), Money::ZERO);
    }

    #[test]
    fn test_late_fee_entry_is_flagged() {
        let tx = Transaction::post_late_fee(
            Uuid::new_v4(),
            Money::from_decimal(dec!(5.00)),
            "Late payment fee".to_string(),
            Utc::now(),
        );

        assert!(tx.is_late_fee);
        assert_eq!(tx.tx_type, TransactionType::Fee);
    }
}
