//! Human-readable document numbers.
//!
//! Numbers are `prefix + branch short code + 4-digit sequence`, e.g.
//! `BKKJKT0001`. Each (prefix, short code) pair has its own counter key.

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Kinds of numbered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Cash-out voucher (BKK).
    Voucher,
    /// Reimbursement invoice.
    Invoice,
    /// Cash advance.
    Kasbon,
}

impl DocumentKind {
    /// Fixed prefix of the number.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Voucher => "BKK",
            Self::Invoice => "INV",
            Self::Kasbon => "KBS",
        }
    }

    /// Counter key for `short_code`.
    #[must_use]
    pub fn sequence_key(self, short_code: &str) -> String {
        format!("{}{short_code}", self.prefix())
    }

    /// Document number for sequence value `seq`.
    #[must_use]
    pub fn number(self, short_code: &str, seq: i64) -> String {
        format!("{}{short_code}{seq:04}", self.prefix())
    }
}

/// Branch short codes are non-empty ASCII alphanumerics.
pub fn validate_short_code(short_code: &str) -> Result<(), LedgerError> {
    if short_code.is_empty() || !short_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::Validation(format!(
            "branch short code must be alphanumeric, got {short_code:?}"
        )));
    }
    Ok(())
}
