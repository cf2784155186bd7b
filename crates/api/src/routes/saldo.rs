//! Branch balance routes: snapshot, limits, month rows, opening balance and
//! movement history.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::page_request;
use crate::{
    AppState,
    error::ApiError,
    extractors::{JsonBody, PathParams, QueryParams},
    middleware::AuthUser,
};
use pettycash_core::ledger::SpendingLimits;
use pettycash_core::{BranchScope, MonthYear};
use pettycash_db::{CreateSaldoInput, HistoryFilter};
use pettycash_shared::types::{BranchId, CompanyId};

/// Creates the saldo routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/saldo", post(create_saldo))
        .route("/saldo/me", get(get_my_saldo))
        .route("/saldo/history", get(list_history))
        .route("/saldo/{company_id}/{branch_id}", get(get_saldo))
        .route("/saldo/{company_id}/{branch_id}/limits", patch(update_limits))
        .route(
            "/saldo/{company_id}/{branch_id}/months/{month_year}",
            get(get_month),
        )
        .route("/saldo/{company_id}/{branch_id}/opening", get(opening_balance))
}

/// Request body for opening a branch balance.
#[derive(Debug, Deserialize)]
pub struct CreateSaldoRequest {
    /// Owning company; must be the caller's.
    pub company_id: Uuid,
    /// Branch to open.
    pub branch_id: Uuid,
    /// Starting cash.
    pub opening_balance: i64,
    /// Single-voucher ceiling.
    pub voucher_limit: i64,
    /// Single-advance ceiling.
    pub advance_limit: i64,
}

/// Query for the opening balance as of a day.
#[derive(Debug, Deserialize)]
pub struct OpeningQuery {
    /// Day whose opening balance is wanted.
    pub as_of: NaiveDate,
    /// First day of the month the day falls in.
    pub month_start: NaiveDate,
}

/// Query for the movement history of the caller's branch.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Substring of the movement tag.
    pub description: Option<String>,
    /// First day included.
    pub from_date: Option<NaiveDate>,
    /// Last day included.
    pub to_date: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

fn scope_of(auth: &AuthUser, company_id: Uuid, branch_id: Uuid) -> Result<BranchScope, ApiError> {
    let company_id = CompanyId::from(company_id);
    auth.ensure_company(company_id)?;
    Ok(BranchScope::new(company_id, BranchId::from(branch_id)))
}

/// POST `/saldo` - Open a branch balance.
async fn create_saldo(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateSaldoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_of(&auth, body.company_id, body.branch_id)?;
    let saldo = state
        .saldo()
        .create(CreateSaldoInput {
            company_id: scope.company_id,
            branch_id: scope.branch_id,
            opening_balance: body.opening_balance,
            voucher_limit: body.voucher_limit,
            advance_limit: body.advance_limit,
            created_by: auth.username().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(saldo)))
}

/// GET `/saldo/me` - Balance of the caller's own branch.
async fn get_my_saldo(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let saldo = state.saldo().get_by_user(auth.claims()).await?;
    Ok(Json(saldo))
}

/// GET `/saldo/{company_id}/{branch_id}`
async fn get_saldo(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((company_id, branch_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_of(&auth, company_id, branch_id)?;
    let saldo = state.saldo().get_by_company_branch(scope).await?;
    Ok(Json(saldo))
}

/// PATCH `/saldo/{company_id}/{branch_id}/limits` - Replace spending limits.
async fn update_limits(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((company_id, branch_id)): PathParams<(Uuid, Uuid)>,
    JsonBody(limits): JsonBody<SpendingLimits>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_of(&auth, company_id, branch_id)?;
    let saldo = state
        .saldo()
        .update_limits(scope, limits, auth.username())
        .await?;
    Ok(Json(saldo))
}

/// GET `/saldo/{company_id}/{branch_id}/months/{month_year}`
async fn get_month(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((company_id, branch_id, month)): PathParams<(Uuid, Uuid, MonthYear)>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_of(&auth, company_id, branch_id)?;
    let row = state.saldo().get_month(scope, month).await?;
    Ok(Json(row))
}

/// GET `/saldo/{company_id}/{branch_id}/opening?as_of=&month_start=`
async fn opening_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((company_id, branch_id)): PathParams<(Uuid, Uuid)>,
    QueryParams(query): QueryParams<OpeningQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = scope_of(&auth, company_id, branch_id)?;
    let opening = state
        .saldo()
        .compute_opening_balance(scope, query.as_of, query.month_start)
        .await?;

    Ok(Json(json!({
        "as_of": query.as_of,
        "month_start": query.month_start,
        "opening_balance": opening,
    })))
}

/// GET `/saldo/history` - Movement history of the caller's branch.
async fn list_history(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let page = page_request(query.page, query.per_page);
    let history = state
        .saldo()
        .list_history(
            HistoryFilter {
                company_id: Some(scope.company_id),
                branch_id: Some(scope.branch_id),
                description: query.description,
                from_date: query.from_date,
                to_date: query.to_date,
            },
            &page,
        )
        .await?;
    Ok(Json(history))
}
