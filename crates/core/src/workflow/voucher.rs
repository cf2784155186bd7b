//! Voucher (BKK) state machines and line totals.
//!
//! A voucher carries two independent states:
//! - approval: Pending -> Approved | Rejected
//! - payment: Unpaid -> Invoiced -> Paid, with Unpaid -> Paid for vouchers
//!   settled without an invoice and Invoiced -> Unpaid when the invoice is
//!   rejected. Paid is terminal and needs an approved voucher.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::LedgerError;

/// Approval stage, stored as 0/1/2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoucherApproval {
    /// Waiting for a decision.
    Pending,
    /// Approved for payment.
    Approved,
    /// Rejected; its ledger debit has been reversed.
    Rejected,
}

impl VoucherApproval {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
        }
    }

    /// Parses a stored code.
    pub fn from_code(code: i16) -> Result<Self, LedgerError> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            other => Err(LedgerError::Validation(format!(
                "unknown voucher approval status: {other}"
            ))),
        }
    }

    /// Validates a move to `to`.
    pub fn transition_to(self, to: Self) -> Result<Self, LedgerError> {
        match (self, to) {
            (Self::Pending, Self::Approved | Self::Rejected) => Ok(to),
            _ => Err(LedgerError::InvalidTransition {
                entity: "voucher approval",
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for VoucherApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        })
    }
}

impl TryFrom<i16> for VoucherApproval {
    type Error = LedgerError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<VoucherApproval> for i16 {
    fn from(value: VoucherApproval) -> Self {
        value.code()
    }
}

/// Payment status, stored as `""`, `"Invoice"` or `"Paid"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentStatus {
    /// Not yet settled.
    Unpaid,
    /// Claimed on an invoice.
    Invoiced,
    /// Settled.
    Paid,
}

impl PaymentStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "",
            Self::Invoiced => "Invoice",
            Self::Paid => "Paid",
        }
    }

    /// Parses the stored representation.
    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "" => Ok(Self::Unpaid),
            "Invoice" => Ok(Self::Invoiced),
            "Paid" => Ok(Self::Paid),
            other => Err(LedgerError::Validation(format!(
                "unknown voucher payment status: {other:?}"
            ))),
        }
    }

    /// Validates a move to `to` for a voucher in approval stage `approval`.
    pub fn transition_to(self, to: Self, approval: VoucherApproval) -> Result<Self, LedgerError> {
        let allowed = matches!(
            (self, to),
            (Self::Unpaid | Self::Invoiced, Self::Invoiced | Self::Paid) | (Self::Invoiced, Self::Unpaid)
        );
        if !allowed {
            return Err(LedgerError::InvalidTransition {
                entity: "voucher payment",
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        if to != Self::Unpaid && approval != VoucherApproval::Approved {
            return Err(LedgerError::InvalidTransition {
                entity: "voucher payment",
                from: format!("{self} ({approval})"),
                to: to.to_string(),
            });
        }
        Ok(to)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unpaid => "unpaid",
            Self::Invoiced => "Invoice",
            Self::Paid => "Paid",
        })
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

/// Sums voucher line amounts.
///
/// # Errors
///
/// `Validation` when there are no lines, a line is not positive, or the sum
/// overflows.
pub fn voucher_total(amounts: impl IntoIterator<Item = i64>) -> Result<i64, LedgerError> {
    let mut lines = 0usize;
    let mut total = 0i64;
    for amount in amounts {
        if amount <= 0 {
            return Err(LedgerError::Validation(format!(
                "line amount must be positive, got {amount}"
            )));
        }
        total = total
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Validation("voucher total overflow".to_string()))?;
        lines += 1;
    }
    if lines == 0 {
        return Err(LedgerError::Validation(
            "voucher needs at least one line".to_string(),
        ));
    }
    Ok(total)
}

/// Only pending, unpaid vouchers may have their lines replaced.
pub fn ensure_editable(approval: VoucherApproval, payment: PaymentStatus) -> Result<(), LedgerError> {
    if approval == VoucherApproval::Pending && payment == PaymentStatus::Unpaid {
        return Ok(());
    }
    Err(LedgerError::InvalidTransition {
        entity: "voucher",
        from: format!("{approval}/{payment}"),
        to: "edited".to_string(),
    })
}

/// Checks that a voucher can be claimed on invoice `invoice_id`.
///
/// A voucher already on that same invoice may be re-linked (invoice update).
pub fn ensure_invoiceable(
    approval: VoucherApproval,
    payment: PaymentStatus,
    linked_invoice: Option<Uuid>,
    invoice_id: Uuid,
) -> Result<(), LedgerError> {
    if let Some(other) = linked_invoice.filter(|linked| *linked != invoice_id) {
        return Err(LedgerError::Validation(format!(
            "voucher already claimed by invoice {other}"
        )));
    }
    payment
        .transition_to(PaymentStatus::Invoiced, approval)
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_codes_round_trip() {
        for status in [
            VoucherApproval::Pending,
            VoucherApproval::Approved,
            VoucherApproval::Rejected,
        ] {
            assert_eq!(VoucherApproval::from_code(status.code()).unwrap(), status);
        }
        assert!(VoucherApproval::from_code(3).is_err());
    }

    #[test]
    fn test_approval_transitions() {
        assert_eq!(
            VoucherApproval::Pending
                .transition_to(VoucherApproval::Approved)
                .unwrap(),
            VoucherApproval::Approved
        );
        assert!(
            VoucherApproval::Pending
                .transition_to(VoucherApproval::Rejected)
                .is_ok()
        );
        assert!(
            VoucherApproval::Approved
                .transition_to(VoucherApproval::Rejected)
                .is_err()
        );
        assert!(
            VoucherApproval::Pending
                .transition_to(VoucherApproval::Pending)
                .is_err()
        );
    }

    #[test]
    fn test_payment_parse() {
        assert_eq!(PaymentStatus::parse("").unwrap(), PaymentStatus::Unpaid);
        assert_eq!(
            PaymentStatus::parse("Invoice").unwrap(),
            PaymentStatus::Invoiced
        );
        assert_eq!(PaymentStatus::parse("Paid").unwrap(), PaymentStatus::Paid);
        assert!(PaymentStatus::parse("paid").is_err());
    }

    #[test]
    fn test_paid_is_terminal() {
        for to in [
            PaymentStatus::Unpaid,
            PaymentStatus::Invoiced,
            PaymentStatus::Paid,
        ] {
            assert!(
                PaymentStatus::Paid
                    .transition_to(to, VoucherApproval::Approved)
                    .is_err()
            );
        }
    }

    #[test]
    fn test_paid_requires_approval() {
        assert!(
            PaymentStatus::Unpaid
                .transition_to(PaymentStatus::Paid, VoucherApproval::Pending)
                .is_err()
        );
        assert!(
            PaymentStatus::Invoiced
                .transition_to(PaymentStatus::Paid, VoucherApproval::Approved)
                .is_ok()
        );
    }

    #[test]
    fn test_invoice_rejection_unlinks() {
        assert_eq!(
            PaymentStatus::Invoiced
                .transition_to(PaymentStatus::Unpaid, VoucherApproval::Approved)
                .unwrap(),
            PaymentStatus::Unpaid
        );
        assert!(
            PaymentStatus::Unpaid
                .transition_to(PaymentStatus::Unpaid, VoucherApproval::Approved)
                .is_err()
        );
    }

    #[test]
    fn test_voucher_total() {
        assert_eq!(voucher_total([2000, 3000]).unwrap(), 5000);
        assert!(voucher_total([]).is_err());
        assert!(voucher_total([100, 0]).is_err());
        assert!(voucher_total([100, -5]).is_err());
        assert!(voucher_total([i64::MAX, 1]).is_err());
    }

    #[test]
    fn test_ensure_editable() {
        assert!(ensure_editable(VoucherApproval::Pending, PaymentStatus::Unpaid).is_ok());
        assert!(ensure_editable(VoucherApproval::Approved, PaymentStatus::Unpaid).is_err());
        assert!(ensure_editable(VoucherApproval::Pending, PaymentStatus::Invoiced).is_err());
    }

    #[test]
    fn test_ensure_invoiceable() {
        let invoice = Uuid::new_v4();
        assert!(
            ensure_invoiceable(
                VoucherApproval::Approved,
                PaymentStatus::Unpaid,
                None,
                invoice
            )
            .is_ok()
        );
        // Re-link on invoice update.
        assert!(
            ensure_invoiceable(
                VoucherApproval::Approved,
                PaymentStatus::Invoiced,
                Some(invoice),
                invoice
            )
            .is_ok()
        );
        assert!(
            ensure_invoiceable(
                VoucherApproval::Approved,
                PaymentStatus::Invoiced,
                Some(Uuid::new_v4()),
                invoice
            )
            .is_err()
        );
        assert!(
            ensure_invoiceable(VoucherApproval::Pending, PaymentStatus::Unpaid, None, invoice)
                .is_err()
        );
        assert!(
            ensure_invoiceable(VoucherApproval::Approved, PaymentStatus::Paid, None, invoice)
                .is_err()
        );
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(
            serde_json::to_string(&VoucherApproval::Rejected).unwrap(),
            "2"
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"Invoice\"").unwrap(),
            PaymentStatus::Invoiced
        );
    }
}
