//! `SeaORM` entity definitions.
//!
//! Reference tables (`companies`, `branches`, `employees`) are read-only for
//! the ledger. Everything else is written by the repositories.

pub mod bkk_details;
pub mod bkk_headers;
pub mod branches;
pub mod companies;
pub mod counters;
pub mod employees;
pub mod invoice_details;
pub mod invoice_headers;
pub mod kasbons;
pub mod saldo_histories;
pub mod saldo_months;
pub mod saldos;
pub mod tarik_danas;
