//! Invoice routes.

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
use pettycash_core::workflow::InvoiceApproval;
use pettycash_db::{CreateInvoiceInput, InvoiceFilter, UpdateInvoiceInput};

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/approval", patch(update_approval))
        .route("/invoices/{id}", get(get_invoice).put(update_invoice))
}

/// Request body for creating or editing an invoice.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    /// Free-text invoice type.
    pub invoice_type: String,
    /// Invoiced amount.
    pub amount: i64,
    /// Unspent cash returned to the branch on final approval.
    #[serde(default)]
    pub sisa_amount: i64,
    /// Description.
    pub description: String,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Attachment reference.
    #[serde(default)]
    pub file: Option<String>,
    /// Free-text document status.
    #[serde(default)]
    pub status: String,
    /// Approved vouchers covered by the invoice.
    pub voucher_ids: Vec<Uuid>,
}

/// Request body for a batch approval decision.
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    /// Invoices to move.
    pub ids: Vec<Uuid>,
    /// Target approval code.
    pub status_approve: InvoiceApproval,
}

/// Query for listing the caller's invoices.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Substring of the number.
    pub num: Option<String>,
    /// Approval code.
    pub status_approve: Option<InvoiceApproval>,
    /// Invoice date on or after.
    pub from_date: Option<NaiveDate>,
    /// Invoice date on or before.
    pub to_date: Option<NaiveDate>,
    /// Page number.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// POST `/invoices` - Raise an invoice over approved vouchers.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<InvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let invoice = state
        .invoices()
        .create(CreateInvoiceInput {
            company_id: scope.company_id,
            branch_id: scope.branch_id,
            invoice_type: body.invoice_type,
            amount: body.amount,
            sisa_amount: body.sisa_amount,
            description: body.description,
            invoice_date: body.invoice_date,
            file: body.file,
            status: body.status,
            voucher_ids: body.voucher_ids,
            created_by: auth.username().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET `/invoices`
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListInvoicesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = auth.scope();
    let page = page_request(query.page, query.per_page);
    let invoices = state
        .invoices()
        .list(
            InvoiceFilter {
                company_id: Some(scope.company_id),
                branch_id: Some(scope.branch_id),
                num: query.num,
                approval: query.status_approve,
                from_date: query.from_date,
                to_date: query.to_date,
            },
            &page,
        )
        .await?;
    Ok(Json(invoices))
}

/// GET `/invoices/{id}`
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state.invoices().get(auth.scope(), id).await?;
    Ok(Json(invoice))
}

/// PUT `/invoices/{id}`
async fn update_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<InvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state
        .invoices()
        .update(
            auth.scope(),
            id,
            UpdateInvoiceInput {
                invoice_type: body.invoice_type,
                amount: body.amount,
                sisa_amount: body.sisa_amount,
                description: body.description,
                invoice_date: body.invoice_date,
                file: body.file,
                status: body.status,
                voucher_ids: body.voucher_ids,
                updated_by: auth.username().to_string(),
            },
        )
        .await?;
    Ok(Json(invoice))
}

/// PATCH `/invoices/approval` - Move a batch of invoices through approval.
async fn update_approval(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<ApprovalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = state
        .invoices()
        .update_approve(auth.scope(), &body.ids, body.status_approve, auth.username())
        .await?;
    Ok(Json(invoices))
}
