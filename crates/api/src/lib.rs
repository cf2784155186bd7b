//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the balance store and the document workflows
//! - Authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use axum::Router;
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pettycash_db::{
    InvoiceRepository, KasbonRepository, SaldoRepository, VoucherRepository, WithdrawalRepository,
};
use pettycash_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Timezone that months and calendar days are cut in.
    pub tz: Tz,
}

impl AppState {
    /// Balance store repository.
    pub fn saldo(&self) -> SaldoRepository {
        SaldoRepository::new((*self.db).clone(), self.tz)
    }

    /// Voucher repository.
    pub fn vouchers(&self) -> VoucherRepository {
        VoucherRepository::new((*self.db).clone(), self.tz)
    }

    /// Invoice repository.
    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new((*self.db).clone(), self.tz)
    }

    /// Withdrawal repository.
    pub fn withdrawals(&self) -> WithdrawalRepository {
        WithdrawalRepository::new((*self.db).clone(), self.tz)
    }

    /// Cash advance repository.
    pub fn kasbon(&self) -> KasbonRepository {
        KasbonRepository::new((*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
