//! Invoice two-stage approval.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Approval stage, stored as 0..=4.
///
/// `Pending -> Approved | Rejected`, then `Approved -> FinalApproved |
/// FinalRejected`. Rejected, FinalApproved and FinalRejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum InvoiceApproval {
    /// Waiting for the first decision.
    Pending,
    /// First stage passed.
    Approved,
    /// Rejected at the first stage.
    Rejected,
    /// Closed; unspent funds returned to the branch.
    FinalApproved,
    /// Rejected at the second stage.
    FinalRejected,
}

impl InvoiceApproval {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
            Self::FinalApproved => 3,
            Self::FinalRejected => 4,
        }
    }

    /// Parses a stored code.
    pub fn from_code(code: i16) -> Result<Self, LedgerError> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::FinalApproved),
            4 => Ok(Self::FinalRejected),
            other => Err(LedgerError::Validation(format!(
                "unknown invoice approval status: {other}"
            ))),
        }
    }

    /// Validates a move to `to`.
    pub fn transition_to(self, to: Self) -> Result<Self, LedgerError> {
        match (self, to) {
            (Self::Pending, Self::Approved | Self::Rejected)
            | (Self::Approved, Self::FinalApproved | Self::FinalRejected) => Ok(to),
            _ => Err(LedgerError::InvalidTransition {
                entity: "invoice approval",
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }

    /// Header and details may still be replaced.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Vouchers on the invoice go back to unpaid.
    #[must_use]
    pub const fn releases_vouchers(self) -> bool {
        matches!(self, Self::Rejected | Self::FinalRejected)
    }

    /// Amount credited back to the branch when entering this stage.
    #[must_use]
    pub const fn refund(self, sisa_amount: i64) -> Option<i64> {
        match self {
            Self::FinalApproved if sisa_amount > 0 => Some(sisa_amount),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::FinalApproved => "final approved",
            Self::FinalRejected => "final rejected",
        })
    }
}

impl TryFrom<i16> for InvoiceApproval {
    type Error = LedgerError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<InvoiceApproval> for i16 {
    fn from(value: InvoiceApproval) -> Self {
        value.code()
    }
}

/// Invoice amounts are non-negative and it must claim at least one voucher.
pub fn validate_invoice(amount: i64, sisa_amount: i64, vouchers: usize) -> Result<(), LedgerError> {
    if amount < 0 || sisa_amount < 0 {
        return Err(LedgerError::Validation(format!(
            "invoice amounts must not be negative: amount {amount}, sisa {sisa_amount}"
        )));
    }
    if vouchers == 0 {
        return Err(LedgerError::Validation(
            "invoice must reference at least one voucher".to_string(),
        ));
    }
    Ok(())
}
