//! Fund withdrawal (TarikDana) routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
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
use pettycash_db::{CreateWithdrawalInput, UpdateWithdrawalInput, WithdrawalFilter};

/// Creates the withdrawal routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/withdrawals", get(list_withdrawals).post(create_withdrawal))
        .route("/withdrawals/{id}", get(get_withdrawal).put(update_withdrawal))
}

/// Request body for recording a withdrawal.
#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    /// Free-text withdrawal type.
    pub withdrawal_type: String,
    /// Amount credited to the branch.
    pub amount: i64,
    /// Description, unique per branch.
    pub description: String,
    /// Withdrawal date.
    pub withdrawal_date: NaiveDate,
    /// Attachment reference.
    #[serde(default)]
    pub file: Option<String>,
}

/// Request body for editing a withdrawal. The amount cannot change.
#[derive(Debug, Deserialize)]
pub struct UpdateWithdrawalRequest {
    /// Free-text withdrawal type.
    pub withdrawal_type: String,
    /// Description, unique per branch.
    pub description: String,
    /// Withdrawal date.
    pub withdrawal_date: NaiveDate,
    /// Attachment reference.
    #[serde(default)]
    pub file: Option<String>,
}

/// Query for listing the caller's withdrawals.
#[derive(Debug, Default, Deserialize)]
pub struct ListWithdrawalsQuery {
    /// Substring of the description.
    pub description: Option<String>,
    /// Withdrawal date on or after.
    pub from_date: Option<NaiveDate>,
    /// Withdrawal date on or before.
    pub to_date: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// POST `/withdrawals` - Record a withdrawal and credit the branch.
async fn create_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateWithdrawalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let withdrawal = state
        .withdrawals()
        .create(CreateWithdrawalInput {
            company_id: scope.company_id,
            branch_id: scope.branch_id,
            withdrawal_type: body.withdrawal_type,
            amount: body.amount,
            description: body.description,
            withdrawal_date: body.withdrawal_date,
            file: body.file,
            created_by: auth.username().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// GET `/withdrawals`
async fn list_withdrawals(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListWithdrawalsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let page = page_request(query.page, query.per_page);
    let withdrawals = state
        .withdrawals()
        .list(
            WithdrawalFilter {
                company_id: Some(scope.company_id),
                branch_id: Some(scope.branch_id),
                description: query.description,
                from_date: query.from_date,
                to_date: query.to_date,
            },
            &page,
        )
        .await?;
    Ok(Json(withdrawals))
}

/// GET `/withdrawals/{id}`
async fn get_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = state.withdrawals().get(auth.scope(), id).await?;
    Ok(Json(withdrawal))
}

/// PUT `/withdrawals/{id}`
async fn update_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<UpdateWithdrawalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = state
        .withdrawals()
        .update(
            auth.scope(),
            id,
            UpdateWithdrawalInput {
                withdrawal_type: body.withdrawal_type,
                description: body.description,
                withdrawal_date: body.withdrawal_date,
                file: body.file,
                updated_by: auth.username().to_string(),
            },
        )
        .await?;
    Ok(Json(withdrawal))
}
