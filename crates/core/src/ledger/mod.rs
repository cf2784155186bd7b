//! Cash balance ledger.
//!
//! - Balance figures and the debit/credit arithmetic that keeps them consistent
//! - Spending limits per branch
//! - Calendar months keying the monthly rows
//! - History movement tags
//! - The error taxonomy shared by every ledger operation

pub mod balance;
pub mod error;
pub mod history;
pub mod period;
pub mod scope;

#[cfg(test)]
mod balance_props;

pub use balance::{BalanceFigures, SpendingLimits, opening_balance};
pub use error::LedgerError;
pub use history::{FUND_RECEIPT_TAG, INVOICE_REFUND_PREFIX, Movement, invoice_refund_tag};
pub use period::{MonthYear, start_of_day};
pub use scope::BranchScope;
