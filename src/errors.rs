use thiserror::Error;

use crate::decimal::Money;
use crate::types::{AccountId, CardId, RepaymentId, UserId};

/// errors raised by ledger operations
///
/// only two kinds exist: a referenced entity does not exist, or a
/// caller-provided amount is not positive. every other "nothing to do"
/// outcome is a successful result carrying a reason, not an error.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("user not found: {id}")]
    UserNotFound {
        id: UserId,
    },

    #[error("account not found: {id}")]
    AccountNotFound {
        id: AccountId,
    },

    #[error("repayment not found: {id}")]
    RepaymentNotFound {
        id: RepaymentId,
    },

    #[error("card not found: {id}")]
    CardNotFound {
        id: CardId,
    },

    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },
}

impl LedgerError {
    /// whether this error is a missing-entity error (HTTP 404 at the edge)
    pub fn is_not_found(&self) -> bool {
        !matches!(self, LedgerError::InvalidAmount { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_kinds() {
        let missing = LedgerError::AccountNotFound { id: Uuid::new_v4() };
        assert!(missing.is_not_found());

        let invalid = LedgerError::InvalidAmount { amount: Money::ZERO };
        assert!(!invalid.is_not_found());
    }

    #[test]
    fn test_error_display_carries_id() {
        let id = Uuid::new_v4();
        let err = LedgerError::UserNotFound { id };
        assert!(err.to_string().contains(&id.to_string()));
    }
}
