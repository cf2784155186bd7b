//! Employee cash advance (Kasbon) routes.

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
use pettycash_db::{CreateKasbonInput, KasbonFilter, KasbonStatusInput, UpdateKasbonInput};
use pettycash_shared::types::EmployeeId;

/// Creates the kasbon routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kasbon", get(list_kasbon).post(create_kasbon))
        .route("/kasbon/{id}", get(get_kasbon).put(update_kasbon))
        .route("/kasbon/{id}/status", patch(update_status))
}

/// Request body for filing an advance.
#[derive(Debug, Deserialize)]
pub struct CreateKasbonRequest {
    /// Employee receiving the cash.
    pub employee_id: Uuid,
    /// Free-text advance type.
    pub kasbon_type: String,
    /// Requested amount.
    pub amount: i64,
    /// Purpose.
    pub description: String,
    /// Request date.
    pub kasbon_date: NaiveDate,
    /// Attachment reference.
    #[serde(default)]
    pub file: Option<String>,
    /// Department override.
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

/// Request body for editing an advance.
#[derive(Debug, Deserialize)]
pub struct UpdateKasbonRequest {
    /// Free-text advance type.
    pub kasbon_type: String,
    /// Purpose.
    pub description: String,
    /// Request date.
    pub kasbon_date: NaiveDate,
    /// Attachment reference.
    #[serde(default)]
    pub file: Option<String>,
    /// Department.
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct KasbonStatusRequest {
    /// New status.
    pub status: String,
    /// Date the cash was handed out.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Date it was paid back.
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    /// Date it was settled.
    #[serde(default)]
    pub settled_date: Option<NaiveDate>,
    /// Settling voucher.
    #[serde(default)]
    pub bkk_header_id: Option<Uuid>,
}

/// Query for listing the caller's advances.
#[derive(Debug, Default, Deserialize)]
pub struct ListKasbonQuery {
    /// Employee filter.
    pub employee_id: Option<Uuid>,
    /// Exact status.
    pub status: Option<String>,
    /// Substring of the number.
    pub num: Option<String>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// POST `/kasbon` - File an advance for an employee.
async fn create_kasbon(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateKasbonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kasbon = state
        .kasbon()
        .create(CreateKasbonInput {
            company_id: auth.scope().company_id,
            employee_id: EmployeeId::from(body.employee_id),
            kasbon_type: body.kasbon_type,
            amount: body.amount,
            description: body.description,
            kasbon_date: body.kasbon_date,
            file: body.file,
            department_id: body.department_id,
            created_by: auth.username().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(kasbon)))
}

/// GET `/kasbon`
async fn list_kasbon(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListKasbonQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let page = page_request(query.page, query.per_page);
    let advances = state
        .kasbon()
        .list(
            KasbonFilter {
                company_id: Some(scope.company_id),
                branch_id: Some(scope.branch_id),
                employee_id: query.employee_id.map(EmployeeId::from),
                status: query.status,
                num: query.num,
            },
            &page,
        )
        .await?;
    Ok(Json(advances))
}

/// GET `/kasbon/{id}`
async fn get_kasbon(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let kasbon = state.kasbon().get(auth.scope(), id).await?;
    Ok(Json(kasbon))
}

/// PUT `/kasbon/{id}`
async fn update_kasbon(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<UpdateKasbonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kasbon = state
        .kasbon()
        .update(
            auth.scope(),
            id,
            UpdateKasbonInput {
                kasbon_type: body.kasbon_type,
                description: body.description,
                kasbon_date: body.kasbon_date,
                file: body.file,
                department_id: body.department_id,
                updated_by: auth.username().to_string(),
            },
        )
        .await?;
    Ok(Json(kasbon))
}

/// PATCH `/kasbon/{id}/status`
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<KasbonStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kasbon = state
        .kasbon()
        .update_status(
            auth.scope(),
            id,
            KasbonStatusInput {
                status: body.status,
                release_date: body.release_date,
                paid_date: body.paid_date,
                settled_date: body.settled_date,
                bkk_header_id: body.bkk_header_id,
                updated_by: auth.username().to_string(),
            },
        )
        .await?;
    Ok(Json(kasbon))
}
