//! Balance history entries as the ledger sees them.

use serde::{Deserialize, Serialize};

use super::balance::BalanceFigures;

/// Tag of the entry written when a withdrawal credits the branch.
pub const FUND_RECEIPT_TAG: &str = "Penerimaan Dana";

/// Prefix of the entry written when an invoice returns unspent funds.
pub const INVOICE_REFUND_PREFIX: &str = "Pengembalian Dana Invoice: ";

/// Tag for the refund of invoice `num`.
#[must_use]
pub fn invoice_refund_tag(num: &str) -> String {
    format!("{INVOICE_REFUND_PREFIX}{num}")
}

/// One movement as recorded in history: balances around it and its amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Closing balance before the movement.
    pub opening: i64,
    /// Credited amount.
    pub inflow: i64,
    /// Debited amount.
    pub out: i64,
    /// Closing balance after the movement.
    pub closing: i64,
}

impl Movement {
    /// Describes the step from `before` to `after`.
    #[must_use]
    pub const fn between(before: &BalanceFigures, after: &BalanceFigures, inflow: i64, out: i64) -> Self {
        Self {
            opening: before.closing,
            inflow,
            out,
            closing: after.closing,
        }
    }

    /// `closing == opening + in - out`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.opening
            .checked_add(self.inflow)
            .and_then(|v| v.checked_sub(self.out))
            == Some(self.closing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refund_tag() {
        assert_eq!(
            invoice_refund_tag("INVJKT0003"),
            "Pengembalian Dana Invoice: INVJKT0003"
        );
    }

    #[test]
    fn test_movement_between() {
        let before = BalanceFigures::starting_at(5000);
        let after = before.apply_delta(0, 1200).unwrap();
        let movement = Movement::between(&before, &after, 1200, 0);
        assert_eq!(movement.opening, 5000);
        assert_eq!(movement.closing, 6200);
        assert!(movement.is_consistent());
    }
}
