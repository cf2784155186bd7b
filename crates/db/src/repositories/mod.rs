//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every multi-step mutation runs in one transaction and reports failures as
//! [`LedgerError`].

pub mod counter;
mod directory;
mod ledger;
pub mod invoice;
pub mod kasbon;
pub mod saldo;
pub mod voucher;
pub mod withdrawal;

pub use counter::CounterRepository;
pub use invoice::{
    CreateInvoiceInput, InvoiceFilter, InvoiceRepository, InvoiceWithDetails, UpdateInvoiceInput,
};
pub use kasbon::{
    CreateKasbonInput, KasbonFilter, KasbonRepository, KasbonStatusInput, UpdateKasbonInput,
};
pub use saldo::{CreateSaldoInput, HistoryFilter, SaldoRepository};
pub use voucher::{
    CreateVoucherInput, UpdateVoucherInput, VoucherFilter, VoucherLineInput, VoucherRepository,
    VoucherWithLines,
};
pub use withdrawal::{
    CreateWithdrawalInput, UpdateWithdrawalInput, WithdrawalFilter, WithdrawalRepository,
};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use pettycash_core::LedgerError;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, SqlErr};

/// `DbErr` lives in another crate, so the conversion is a function.
pub(crate) fn db_err(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Maps a unique-key violation to `AlreadyExists`, anything else to `Database`.
pub(crate) fn conflict_err(entity: &'static str, key: &str) -> impl FnOnce(DbErr) -> LedgerError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::already_exists(entity, key),
        _ => db_err(err),
    }
}

pub(crate) fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

/// Today's date on a wall clock in `tz`.
pub(crate) fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Removes repeated ids, keeping first occurrences in order.
pub(crate) fn dedup_ids(ids: &[uuid::Uuid]) -> Vec<uuid::Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
