use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// ledger configuration
///
/// every tunable of the accrual and reward engine lives here and is
/// passed into each component at construction. nothing reads ambient
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// day-count basis for converting an annual rate to a daily rate
    pub day_count_basis: u32,
    /// nominal rate assigned to users at onboarding and inherited by
    /// accounts opened without an explicit rate
    pub default_apr: Rate,
    /// flat fee charged per late payment
    pub late_fee: Money,
    /// maximum number of late fees chargeable within the window
    pub late_fee_cap: u32,
    /// trailing window, in days, over which late fees are counted
    pub late_fee_window_days: i64,
    /// percentage menu offered by the repayment options calculator
    pub repayment_percentages: Vec<Decimal>,
    /// number of recent repayments inspected for a reward decision
    pub reward_threshold: usize,
    /// rate reduction granted per reward
    pub apr_reduction: Rate,
    /// floor below which rewards never take a rate
    pub min_apr: Rate,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            day_count_basis: 365,
            default_apr: Rate::from_percentage(dec!(25.0)),
            late_fee: Money::from_decimal(dec!(5.00)),
            late_fee_cap: 3,
            late_fee_window_days: 90,
            repayment_percentages: vec![
                dec!(10),
                dec!(25),
                dec!(50),
                dec!(75),
                dec!(100),
            ],
            reward_threshold: 3,
            apr_reduction: Rate::from_percentage(dec!(2.0)),
            min_apr: Rate::from_percentage(dec!(10.0)),
        }
    }
}
