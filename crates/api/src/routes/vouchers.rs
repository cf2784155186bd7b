//! Cash-out voucher (BKK) routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::page_request;
use crate::{
    AppState,
    error::ApiError,
    extractors::{JsonBody, PathParams, QueryParams},
    middleware::AuthUser,
};
use pettycash_core::workflow::{PaymentStatus, VoucherApproval};
use pettycash_db::{CreateVoucherInput, UpdateVoucherInput, VoucherFilter, VoucherLineInput};

/// Creates the voucher routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vouchers", get(list_vouchers).post(create_voucher))
        .route("/vouchers/approval", patch(update_approval))
        .route("/vouchers/{id}", get(get_voucher).put(update_voucher))
        .route("/vouchers/{id}/status", patch(update_status))
}

/// Request body for creating or editing a voucher.
#[derive(Debug, Deserialize)]
pub struct VoucherRequest {
    /// Advance this voucher settles.
    #[serde(default)]
    pub kasbon_id: Option<Uuid>,
    /// Planned release date.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Expense lines.
    pub lines: Vec<VoucherLineInput>,
}

/// Request body for a payment status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target payment status, e.g. "Paid".
    pub status: PaymentStatus,
}

/// Request body for a batch approval decision.
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    /// Vouchers to move.
    pub ids: Vec<Uuid>,
    /// Target approval code.
    pub status_approve: VoucherApproval,
}

/// Query for listing the caller's vouchers.
#[derive(Debug, Default, Deserialize)]
pub struct ListVouchersQuery {
    /// Substring of the number.
    pub num: Option<String>,
    /// Payment status.
    pub status: Option<PaymentStatus>,
    /// Approval code.
    pub status_approve: Option<VoucherApproval>,
    /// Created on or after.
    pub from_date: Option<NaiveDate>,
    /// Created on or before.
    pub to_date: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// POST `/vouchers` - Issue a voucher and debit the branch balance.
async fn create_voucher(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<VoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let voucher = state
        .vouchers()
        .create(CreateVoucherInput {
            company_id: scope.company_id,
            branch_id: scope.branch_id,
            kasbon_id: body.kasbon_id,
            release_date: body.release_date,
            lines: body.lines,
            created_by: auth.username().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(voucher)))
}

/// GET `/vouchers`
async fn list_vouchers(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListVouchersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let page = page_request(query.page, query.per_page);
    let vouchers = state
        .vouchers()
        .list(
            VoucherFilter {
                company_id: Some(scope.company_id),
                branch_id: Some(scope.branch_id),
                num: query.num,
                payment: query.status,
                approval: query.status_approve,
                from_date: query.from_date,
                to_date: query.to_date,
            },
            &page,
        )
        .await?;
    Ok(Json(vouchers))
}

/// GET `/vouchers/{id}`
async fn get_voucher(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state.vouchers().get(auth.scope(), id).await?;
    Ok(Json(voucher))
}

/// PUT `/vouchers/{id}` - Replace the lines of a pending voucher.
async fn update_voucher(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<VoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .vouchers()
        .update(
            auth.scope(),
            id,
            UpdateVoucherInput {
                kasbon_id: body.kasbon_id,
                release_date: body.release_date,
                lines: body.lines,
                updated_by: auth.username().to_string(),
            },
        )
        .await?;
    Ok(Json(voucher))
}

/// PATCH `/vouchers/{id}/status` - Mark a voucher paid.
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .vouchers()
        .update_status(auth.scope(), id, body.status, auth.username())
        .await?;
    Ok(Json(voucher))
}

/// PATCH `/vouchers/approval` - Approve or reject a batch of vouchers.
async fn update_approval(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<ApprovalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let vouchers = state
        .vouchers()
        .update_approve(auth.scope(), &body.ids, body.status_approve, auth.username())
        .await?;
    Ok(Json(vouchers))
}
