//! Balance arithmetic shared by the branch snapshot and its monthly rows.
//!
//! Both rows carry the same five figures and must satisfy
//! `closing = opening + inflow - voucher_used - advance_used` after every
//! mutation, with `closing >= 0`.

use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// The running figures of a balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceFigures {
    /// Balance carried in at the start of the period.
    pub opening: i64,
    /// Funds received (withdrawals, invoice refunds).
    pub inflow: i64,
    /// Spent through vouchers.
    pub voucher_used: i64,
    /// Spent through cash advances.
    pub advance_used: i64,
    /// What is left to spend.
    pub closing: i64,
}

fn checked(value: Option<i64>) -> Result<i64, LedgerError> {
    value.ok_or_else(|| LedgerError::Validation("amount overflow".to_string()))
}

fn non_negative(name: &str, amount: i64) -> Result<(), LedgerError> {
    if amount < 0 {
        return Err(LedgerError::Validation(format!(
            "{name} must not be negative: {amount}"
        )));
    }
    Ok(())
}

impl BalanceFigures {
    /// A fresh row with nothing moved yet.
    #[must_use]
    pub const fn starting_at(opening: i64) -> Self {
        Self {
            opening,
            inflow: 0,
            voucher_used: 0,
            advance_used: 0,
            closing: opening,
        }
    }

    /// `opening + inflow - voucher_used - advance_used`, or `None` on overflow.
    #[must_use]
    pub fn expected_closing(&self) -> Option<i64> {
        self.opening
            .checked_add(self.inflow)?
            .checked_sub(self.voucher_used)?
            .checked_sub(self.advance_used)
    }

    /// True when the closing figure agrees with the movements.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.expected_closing() == Some(self.closing)
    }

    /// Debits `out` and credits `inflow` in one step.
    ///
    /// # Errors
    ///
    /// `InsufficientBalance` when the new closing figure would be negative;
    /// `Validation` on negative inputs or overflow. `self` is never changed.
    pub fn apply_delta(&self, out: i64, inflow: i64) -> Result<Self, LedgerError> {
        non_negative("out amount", out)?;
        non_negative("in amount", inflow)?;

        let closing = checked(
            self.closing
                .checked_sub(out)
                .and_then(|c| c.checked_add(inflow)),
        )?;
        if closing < 0 {
            return Err(LedgerError::InsufficientBalance {
                available: checked(self.closing.checked_add(inflow))?,
                requested: out,
            });
        }

        Ok(Self {
            voucher_used: checked(self.voucher_used.checked_add(out))?,
            inflow: checked(self.inflow.checked_add(inflow))?,
            closing,
            ..*self
        })
    }

    /// Undoes a voucher debit of `amount` booked against this row.
    pub fn release_debit(&self, amount: i64) -> Result<Self, LedgerError> {
        non_negative("released amount", amount)?;
        if amount > self.voucher_used {
            return Err(LedgerError::Validation(format!(
                "cannot release {amount}, only {} was spent",
                self.voucher_used
            )));
        }

        Ok(Self {
            voucher_used: self.voucher_used - amount,
            closing: checked(self.closing.checked_add(amount))?,
            ..*self
        })
    }

    /// Moves the carried-in balance of a later month by `amount`.
    pub fn shift_opening(&self, amount: i64) -> Result<Self, LedgerError> {
        Ok(Self {
            opening: checked(self.opening.checked_add(amount))?,
            closing: checked(self.closing.checked_add(amount))?,
            ..*self
        })
    }
}

/// Per-branch spending ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimits {
    /// Maximum total of a single voucher.
    pub voucher_limit: i64,
    /// Maximum single cash advance.
    pub advance_limit: i64,
}

impl SpendingLimits {
    /// Rejects negative limits.
    pub fn validate(&self) -> Result<(), LedgerError> {
        non_negative("voucher limit", self.voucher_limit)?;
        non_negative("advance limit", self.advance_limit)
    }

    /// Checks a voucher total against the limit, then against what is left.
    ///
    /// # Errors
    ///
    /// `LimitExceeded` first, `InsufficientBalance` second.
    pub fn check_voucher(&self, total: i64, closing: i64) -> Result<(), LedgerError> {
        if total > self.voucher_limit {
            return Err(LedgerError::LimitExceeded {
                total,
                limit: self.voucher_limit,
            });
        }
        if total > closing {
            return Err(LedgerError::InsufficientBalance {
                available: closing,
                requested: total,
            });
        }
        Ok(())
    }
}

/// Opening figure of the month plus the net of `(in, out)` movements.
pub fn opening_balance(
    month_opening: i64,
    movements: impl IntoIterator<Item = (i64, i64)>,
) -> Result<i64, LedgerError> {
    movements
        .into_iter()
        .try_fold(month_opening, |acc, (inflow, out)| {
            checked(acc.checked_add(inflow).and_then(|v| v.checked_sub(out)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_row_is_consistent() {
        let row = BalanceFigures::starting_at(10_000);
        assert_eq!(row.closing, 10_000);
        assert!(row.is_consistent());
    }

    #[test]
    fn test_apply_delta_debit() {
        let row = BalanceFigures::starting_at(10_000).apply_delta(5000, 0).unwrap();
        assert_eq!(row.voucher_used, 5000);
        assert_eq!(row.closing, 5000);
        assert!(row.is_consistent());
    }

    #[test]
    fn test_apply_delta_credit() {
        let row = BalanceFigures::starting_at(5000).apply_delta(0, 1200).unwrap();
        assert_eq!(row.inflow, 1200);
        assert_eq!(row.closing, 6200);
    }

    #[test]
    fn test_apply_delta_exact_balance_allowed() {
        let row = BalanceFigures::starting_at(8000).apply_delta(8000, 0).unwrap();
        assert_eq!(row.closing, 0);
    }

    #[test]
    fn test_apply_delta_insufficient() {
        let row = BalanceFigures::starting_at(8000);
        let err = row.apply_delta(9000, 0).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                available: 8000,
                requested: 9000
            }
        );
    }

    #[test]
    fn test_apply_delta_negative_input() {
        let row = BalanceFigures::starting_at(8000);
        assert!(matches!(
            row.apply_delta(-1, 0),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            row.apply_delta(0, -1),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_release_restores_closing() {
        let start = BalanceFigures::starting_at(10_000);
        let spent = start.apply_delta(3000, 0).unwrap();
        let released = spent.release_debit(3000).unwrap();
        assert_eq!(released, start);
    }

    #[test]
    fn test_release_more_than_spent() {
        let spent = BalanceFigures::starting_at(10_000).apply_delta(100, 0).unwrap();
        assert!(spent.release_debit(101).is_err());
    }

    #[test]
    fn test_shift_opening_keeps_invariant() {
        let row = BalanceFigures::starting_at(500)
            .apply_delta(200, 50)
            .unwrap()
            .shift_opening(300)
            .unwrap();
        assert_eq!(row.opening, 800);
        assert_eq!(row.closing, 650);
        assert!(row.is_consistent());
    }

    #[test]
    fn test_check_voucher_order() {
        let limits = SpendingLimits {
            voucher_limit: 8000,
            advance_limit: 0,
        };
        assert!(limits.check_voucher(5000, 10_000).is_ok());
        assert!(matches!(
            limits.check_voucher(9000, 10_000),
            Err(LedgerError::LimitExceeded {
                total: 9000,
                limit: 8000
            })
        ));
        // Over the limit and over the balance: the limit is reported.
        assert!(matches!(
            limits.check_voucher(9000, 100),
            Err(LedgerError::LimitExceeded { .. })
        ));

        let generous = SpendingLimits {
            voucher_limit: 10_000,
            advance_limit: 0,
        };
        assert!(matches!(
            generous.check_voucher(9000, 8000),
            Err(LedgerError::InsufficientBalance {
                available: 8000,
                requested: 9000
            })
        ));
    }

    #[test]
    fn test_negative_limits_rejected() {
        let limits = SpendingLimits {
            voucher_limit: -1,
            advance_limit: 0,
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_opening_balance() {
        assert_eq!(opening_balance(1000, []).unwrap(), 1000);
        assert_eq!(
            opening_balance(1000, [(500, 0), (0, 300), (100, 100)]).unwrap(),
            1200
        );
    }
}
