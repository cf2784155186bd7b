//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};
use pettycash_shared::types::PageRequest;

pub mod health;
pub mod invoices;
pub mod kasbon;
pub mod saldo;
pub mod vouchers;
pub mod withdrawals;

/// Builds a page request from optional query parameters.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Everything except health requires a bearer token
    let protected_routes = Router::new()
        .merge(saldo::routes())
        .merge(vouchers::routes())
        .merge(invoices::routes())
        .merge(withdrawals::routes())
        .merge(kasbon::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
