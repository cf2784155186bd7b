//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the petty-cash tables
//! - Repositories for the balance store and the document workflows
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use migration::Migrator;
pub use repositories::{
    CounterRepository, CreateInvoiceInput, CreateKasbonInput, CreateSaldoInput,
    CreateVoucherInput, CreateWithdrawalInput, HistoryFilter, InvoiceFilter, InvoiceRepository,
    InvoiceWithDetails, KasbonFilter, KasbonRepository, KasbonStatusInput, SaldoRepository,
    UpdateInvoiceInput, UpdateKasbonInput, UpdateVoucherInput, UpdateWithdrawalInput,
    VoucherFilter, VoucherLineInput, VoucherRepository, VoucherWithLines, WithdrawalFilter,
    WithdrawalRepository,
};

use std::time::Duration;

use pettycash_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
