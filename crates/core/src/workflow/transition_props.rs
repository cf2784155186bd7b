//! Property-based tests for the voucher and invoice state machines.

use proptest::prelude::*;

use super::invoice::InvoiceApproval;
use super::voucher::{PaymentStatus, VoucherApproval, voucher_total};

fn arb_voucher_approval() -> impl Strategy<Value = VoucherApproval> {
    prop_oneof![
        Just(VoucherApproval::Pending),
        Just(VoucherApproval::Approved),
        Just(VoucherApproval::Rejected),
    ]
}

fn arb_payment() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Unpaid),
        Just(PaymentStatus::Invoiced),
        Just(PaymentStatus::Paid),
    ]
}

fn arb_invoice_approval() -> impl Strategy<Value = InvoiceApproval> {
    prop_oneof![
        Just(InvoiceApproval::Pending),
        Just(InvoiceApproval::Approved),
        Just(InvoiceApproval::Rejected),
        Just(InvoiceApproval::FinalApproved),
        Just(InvoiceApproval::FinalRejected),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Only pending vouchers can be decided.
    #[test]
    fn prop_voucher_approval_from_pending_only(from in arb_voucher_approval(), to in arb_voucher_approval()) {
        let result = from.transition_to(to);
        prop_assert_eq!(
            result.is_ok(),
            from == VoucherApproval::Pending && to != VoucherApproval::Pending
        );
    }

    /// A voucher is never paid before it is approved.
    #[test]
    fn prop_paid_implies_approved(
        from in arb_payment(),
        approval in arb_voucher_approval(),
    ) {
        if from.transition_to(PaymentStatus::Paid, approval).is_ok() {
            prop_assert_eq!(approval, VoucherApproval::Approved);
        }
    }

    /// Nothing leaves Paid.
    #[test]
    fn prop_paid_terminal(to in arb_payment(), approval in arb_voucher_approval()) {
        prop_assert!(PaymentStatus::Paid.transition_to(to, approval).is_err());
    }

    /// Stored codes survive a round trip.
    #[test]
    fn prop_invoice_code_round_trip(status in arb_invoice_approval()) {
        prop_assert_eq!(InvoiceApproval::from_code(status.code()).unwrap(), status);
    }

    /// Terminal invoice stages accept nothing.
    #[test]
    fn prop_invoice_terminal(from in arb_invoice_approval(), to in arb_invoice_approval()) {
        if !from.is_editable() {
            prop_assert!(from.transition_to(to).is_err());
        }
    }

    /// Refunds happen only on final approval and never exceed sisa.
    #[test]
    fn prop_refund_bounded(status in arb_invoice_approval(), sisa in -1000i64..1_000_000) {
        if let Some(refund) = status.refund(sisa) {
            prop_assert_eq!(status, InvoiceApproval::FinalApproved);
            prop_assert!(refund > 0);
            prop_assert_eq!(refund, sisa);
        }
    }

    /// Totals are the sum of positive lines.
    #[test]
    fn prop_total_is_sum(lines in prop::collection::vec(1i64..10_000_000, 1..30)) {
        prop_assert_eq!(voucher_total(lines.iter().copied()).unwrap(), lines.iter().sum::<i64>());
    }
}
