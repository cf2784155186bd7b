//! Petty-cash ledger rules.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Balance arithmetic, document numbering and the voucher/invoice state
//! machines live here; `pettycash-db` applies them inside transactions.
//!
//! # Modules
//!
//! - `ledger` - balance figures, limits, months, history tags, errors
//! - `numbering` - document numbers and counter keys
//! - `workflow` - voucher and invoice state machines

pub mod ledger;
pub mod numbering;
pub mod workflow;

pub use ledger::{BranchScope, LedgerError, MonthYear};
pub use numbering::DocumentKind;
