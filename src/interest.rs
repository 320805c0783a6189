use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// repayment menus and savings estimates project interest over a fixed
/// 30-day horizon
pub const PROJECTION_DAYS: u32 = 30;

/// one entry of the repayment options menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentOption {
    pub percentage: Decimal,
    pub amount: Money,
    pub interest_to_pay: Money,
    pub interest_saved: Money,
}

/// pure interest calculator
///
/// no state beyond the day-count basis and no error conditions:
/// `Decimal` inputs are always finite.
#[derive(Debug, Clone, Copy)]
pub struct InterestEngine {
    basis: u32,
}

impl InterestEngine {
    pub fn new(basis: u32) -> Self {
        Self { basis }
    }

    /// daily rate from an annual rate (apr / basis)
    pub fn daily_rate(&self, apr: Rate) -> Rate {
        Rate::from_decimal(apr.as_decimal() / Decimal::from(self.basis))
    }

    // unrounded, so period projections never compound a rounding step
    fn raw_daily_interest(&self, balance: Money, apr: Rate) -> Decimal {
        balance.as_decimal() * apr.as_decimal() / Decimal::from(self.basis)
    }

    /// interest accruing on a balance over one day
    pub fn daily_interest(&self, balance: Money, apr: Rate) -> Money {
        Money::from_decimal(self.raw_daily_interest(balance, apr))
    }

    /// interest accruing on a balance over a period of days
    pub fn period_interest(&self, balance: Money, apr: Rate, days: u32) -> Money {
        Money::from_decimal(self.raw_daily_interest(balance, apr) * Decimal::from(days))
    }

    /// interest saved over the projection window by repaying now
    ///
    /// the estimate keys off the repaid amount; the current balance does
    /// not enter the calculation.
    pub fn interest_savings(&self, _balance: Money, apr: Rate, repayment_amount: Money) -> Money {
        self.period_interest(repayment_amount, apr, PROJECTION_DAYS)
    }

    /// the repayment menu for a balance, one option per configured
    /// percentage, ascending
    ///
    /// for a positive balance, `interest_to_pay` strictly decreases and
    /// `interest_saved` strictly increases down the menu.
    pub fn repayment_options(
        &self,
        balance: Money,
        apr: Rate,
        percentages: &[Decimal],
    ) -> Vec<RepaymentOption> {
        percentages
            .iter()
            .map(|&percentage| {
                let amount = balance.as_decimal() * percentage / Decimal::from(100);
                let remaining = Money::from_decimal(balance.as_decimal() - amount);
                let interest_to_pay = self
                    .period_interest(remaining, apr, PROJECTION_DAYS)
                    .round_dp(2);
                let interest_saved = self
                    .interest_savings(balance, apr, Money::from_decimal(amount))
                    .round_dp(2);

                RepaymentOption {
                    percentage,
                    amount: Money::from_decimal(amount).round_dp(2),
                    interest_to_pay,
                    interest_saved,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> InterestEngine {
        InterestEngine::new(365)
    }

    #[test]
    fn test_daily_rate() {
        let apr = Rate::from_percentage(dec!(25.0));
        assert_eq!(engine().daily_rate(apr).as_decimal(), dec!(0.25) / dec!(365));
        assert_eq!(engine().daily_rate(Rate::ZERO), Rate::ZERO);
    }

    #[test]
    fn test_daily_interest() {
        let interest = engine().daily_interest(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
        );
        assert_eq!(interest.round_dp(2), Money::from_decimal(dec!(0.68)));
    }

    #[test]
    fn test_period_interest_zero_days() {
        let interest = engine().period_interest(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
            0,
        );
        assert!(interest.is_zero());
    }

    #[test]
    fn test_period_interest_thirty_days() {
        let interest = engine().period_interest(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
            30,
        );
        assert_eq!(interest.round_dp(2), Money::from_decimal(dec!(20.55)));
    }

    #[test]
    fn test_savings_key_off_repaid_amount() {
        let e = engine();
        let apr = Rate::from_percentage(dec!(25.0));
        let saved = e.interest_savings(Money::from_major(1_000), apr, Money::from_major(100));

        // the balance argument is irrelevant to the estimate
        assert_eq!(
            saved,
            e.interest_savings(Money::from_major(9_999), apr, Money::from_major(100))
        );
        assert_eq!(saved, e.period_interest(Money::from_major(100), apr, 30));
        assert_eq!(saved.round_dp(2), Money::from_decimal(dec!(2.05)));
    }

    #[test]
    fn test_repayment_options_shape() {
        let percentages = [dec!(10), dec!(25), dec!(50), dec!(75), dec!(100)];
        let options = engine().repayment_options(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
            &percentages,
        );

        assert_eq!(options.len(), 5);
        for (option, expected) in options.iter().zip(percentages) {
            assert_eq!(option.percentage, expected);
        }
        assert_eq!(options[0].amount, Money::from_major(100));
        // the full-balance option clears the balance and pays no interest
        assert_eq!(options[4].amount, Money::from_major(1_000));
        assert_eq!(options[4].interest_to_pay, Money::ZERO);
    }

    #[test]
    fn test_repayment_options_literal_values() {
        let percentages = [dec!(10), dec!(25), dec!(50), dec!(75), dec!(100)];
        let options = engine().repayment_options(
            Money::from_major(1_000),
            Rate::from_percentage(dec!(25.0)),
            &percentages,
        );

        assert_eq!(options[0].interest_to_pay, Money::from_decimal(dec!(18.49)));
        assert_eq!(options[0].interest_saved, Money::from_decimal(dec!(2.05)));
        assert_eq!(options[2].interest_to_pay, Money::from_decimal(dec!(10.27)));
        assert_eq!(options[2].interest_saved, Money::from_decimal(dec!(10.27)));
        assert_eq!(options[4].interest_saved, Money::from_decimal(dec!(20.55)));
    }

    #[test]
    fn test_repayment_options_monotonicity() {
        let percentages = [dec!(10), dec!(25), dec!(50), dec!(75), dec!(100)];
        let options = engine().repayment_options(
            Money::from_decimal(dec!(873.21)),
            Rate::from_percentage(dec!(31.9)),
            &percentages,
        );

        for pair in options.windows(2) {
            assert!(pair[1].interest_to_pay < pair[0].interest_to_pay);
            assert!(pair[1].interest_saved > pair[0].interest_saved);
        }
    }
}
