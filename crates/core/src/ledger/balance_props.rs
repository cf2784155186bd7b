//! Property-based tests for balance arithmetic.

use proptest::prelude::*;

use super::balance::{BalanceFigures, SpendingLimits, opening_balance};
use super::error::LedgerError;
use super::history::Movement;

/// Amounts up to one billion minor units.
fn amount() -> impl Strategy<Value = i64> {
    0i64..1_000_000_000
}

/// A reachable row: a fresh opening followed by some credits and debits.
fn arb_row() -> impl Strategy<Value = BalanceFigures> {
    (amount(), prop::collection::vec((amount(), amount()), 0..10)).prop_map(|(opening, steps)| {
        steps
            .into_iter()
            .fold(BalanceFigures::starting_at(opening), |row, (out, inflow)| {
                row.apply_delta(out, inflow).unwrap_or(row)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every successful delta keeps the closing identity.
    #[test]
    fn prop_apply_delta_keeps_invariant(row in arb_row(), out in amount(), inflow in amount()) {
        prop_assert!(row.is_consistent());
        if let Ok(next) = row.apply_delta(out, inflow) {
            prop_assert!(next.is_consistent());
            prop_assert_eq!(next.closing, row.closing - out + inflow);
        }
    }

    /// Closing never goes negative; a refused delta reports the shortfall.
    #[test]
    fn prop_apply_delta_never_negative(row in arb_row(), out in amount(), inflow in amount()) {
        match row.apply_delta(out, inflow) {
            Ok(next) => prop_assert!(next.closing >= 0),
            Err(LedgerError::InsufficientBalance { available, requested }) => {
                prop_assert_eq!(available, row.closing + inflow);
                prop_assert_eq!(requested, out);
                prop_assert!(requested > available);
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Releasing a debit lands exactly where the row started.
    #[test]
    fn prop_release_inverts_debit(row in arb_row(), out in amount()) {
        if let Ok(spent) = row.apply_delta(out, 0) {
            prop_assert_eq!(spent.release_debit(out).unwrap(), row);
        }
    }

    /// The history movement of a delta is self-consistent.
    #[test]
    fn prop_movement_consistent(row in arb_row(), out in amount(), inflow in amount()) {
        if let Ok(next) = row.apply_delta(out, inflow) {
            prop_assert!(Movement::between(&row, &next, inflow, out).is_consistent());
        }
    }

    /// Voucher checks agree with what the delta would do.
    #[test]
    fn prop_check_voucher_matches_delta(row in arb_row(), total in 1i64..1_000_000_000, limit in amount()) {
        let limits = SpendingLimits { voucher_limit: limit, advance_limit: 0 };
        match limits.check_voucher(total, row.closing) {
            Ok(()) => prop_assert!(row.apply_delta(total, 0).is_ok()),
            Err(LedgerError::LimitExceeded { .. }) => prop_assert!(total > limit),
            Err(LedgerError::InsufficientBalance { .. }) => {
                prop_assert!(total <= limit);
                prop_assert!(row.apply_delta(total, 0).is_err());
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Opening balance is the month opening plus the net movements.
    #[test]
    fn prop_opening_balance_is_net(start in amount(), moves in prop::collection::vec((amount(), amount()), 0..20)) {
        let expected = moves.iter().fold(start, |acc, (i, o)| acc + i - o);
        prop_assert_eq!(opening_balance(start, moves).unwrap(), expected);
    }
}
