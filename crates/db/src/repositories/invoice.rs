//! Reimbursement invoice repository.

use std::collections::HashSet;

use chrono::NaiveDate;
use chrono_tz::Tz;
use pettycash_core::ledger::invoice_refund_tag;
use pettycash_core::workflow::{
    InvoiceApproval, PaymentStatus, ensure_invoiceable, validate_invoice,
};
use pettycash_core::{BranchScope, DocumentKind, LedgerError};
use pettycash_shared::types::{BranchId, CompanyId, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::entities::{bkk_headers, invoice_details, invoice_headers};

use super::counter::next_value;
use super::directory::branch_short_code;
use super::ledger::{append_history, apply_delta_in, lock_saldo};
use super::voucher::{lock_vouchers, set_payment_in};
use super::{db_err, dedup_ids, now};

/// Input for raising an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Raising branch.
    pub branch_id: BranchId,
    /// Free-text invoice type.
    pub invoice_type: String,
    /// Claimed amount.
    pub amount: i64,
    /// Unspent amount returned to the branch on final approval.
    pub sisa_amount: i64,
    /// Description.
    pub description: String,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Free-text status.
    pub status: String,
    /// Vouchers claimed by this invoice.
    pub voucher_ids: Vec<Uuid>,
    /// Operator raising the invoice.
    pub created_by: String,
}

/// Input for replacing an invoice that is not yet final.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceInput {
    /// Free-text invoice type.
    pub invoice_type: String,
    /// Claimed amount.
    pub amount: i64,
    /// Unspent amount.
    pub sisa_amount: i64,
    /// Description.
    pub description: String,
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Free-text status.
    pub status: String,
    /// Vouchers claimed after the update.
    pub voucher_ids: Vec<Uuid>,
    /// Operator making the change.
    pub updated_by: String,
}

/// Filter for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Company filter.
    pub company_id: Option<CompanyId>,
    /// Branch filter.
    pub branch_id: Option<BranchId>,
    /// Substring of the number.
    pub num: Option<String>,
    /// Approval stage filter.
    pub approval: Option<InvoiceApproval>,
    /// Invoice date on or after.
    pub from_date: Option<NaiveDate>,
    /// Invoice date on or before.
    pub to_date: Option<NaiveDate>,
}

/// Invoice header with its detail rows.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithDetails {
    /// The header.
    #[serde(flatten)]
    pub header: invoice_headers::Model,
    /// One row per claimed voucher.
    pub details: Vec<invoice_details::Model>,
}

fn in_scope(header: &invoice_headers::Model, scope: BranchScope) -> bool {
    header.company_id == scope.company_id.into_inner()
        && header.branch_id == scope.branch_id.into_inner()
}

fn unique_vouchers(ids: &[Uuid]) -> Result<Vec<Uuid>, LedgerError> {
    let unique = dedup_ids(ids);
    if unique.len() != ids.len() {
        return Err(LedgerError::Validation(
            "a voucher is listed more than once".to_string(),
        ));
    }
    Ok(unique)
}

/// Locks `voucher_ids` and checks each one may be linked to `invoice_id`.
async fn check_vouchers(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    invoice_id: Uuid,
    voucher_ids: &[Uuid],
) -> Result<Vec<bkk_headers::Model>, LedgerError> {
    let vouchers = lock_vouchers(txn, scope, voucher_ids).await?;
    for voucher in &vouchers {
        if voucher.invoice_id == Some(invoice_id) && voucher.payment()? == PaymentStatus::Paid {
            continue;
        }
        ensure_invoiceable(
            voucher.approval()?,
            voucher.payment()?,
            voucher.invoice_id,
            invoice_id,
        )?;
    }
    Ok(vouchers)
}

/// Writes one detail row per checked voucher and marks it invoiced.
///
/// The header row must already exist.
async fn attach_vouchers(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    vouchers: Vec<bkk_headers::Model>,
    actor: &str,
) -> Result<Vec<invoice_details::Model>, LedgerError> {
    let mut details = Vec::with_capacity(vouchers.len());
    for voucher in vouchers {
        let detail = invoice_details::ActiveModel {
            id: Set(Uuid::now_v7()),
            invoice_header_id: Set(invoice_id),
            bkk_header_id: Set(voucher.id),
            status: Set(String::new()),
            total_amount: Set(voucher.total_amount),
            created_at: Set(now()),
        }
        .insert(txn)
        .await
        .map_err(db_err)?;

        if voucher.payment()? != PaymentStatus::Paid {
            set_payment_in(txn, voucher, PaymentStatus::Invoiced, Some(invoice_id), actor).await?;
        }
        details.push(detail);
    }
    Ok(details)
}

/// Returns vouchers still invoiced on `invoice_id` to unpaid.
async fn release_vouchers(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    invoice_id: Uuid,
    voucher_ids: &[Uuid],
    actor: &str,
) -> Result<usize, LedgerError> {
    if voucher_ids.is_empty() {
        return Ok(0);
    }
    let vouchers = bkk_headers::Entity::find()
        .filter(bkk_headers::Column::Id.is_in(voucher_ids.iter().copied()))
        .filter(bkk_headers::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(bkk_headers::Column::BranchId.eq(scope.branch_id.into_inner()))
        .filter(bkk_headers::Column::InvoiceId.eq(invoice_id))
        .filter(bkk_headers::Column::Status.eq(PaymentStatus::Invoiced.as_str()))
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(db_err)?;

    let count = vouchers.len();
    for voucher in vouchers {
        set_payment_in(txn, voucher, PaymentStatus::Unpaid, None, actor).await?;
    }
    Ok(count)
}

async fn detail_voucher_ids(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
) -> Result<Vec<Uuid>, LedgerError> {
    invoice_details::Entity::find()
        .select_only()
        .column(invoice_details::Column::BkkHeaderId)
        .filter(invoice_details::Column::InvoiceHeaderId.eq(invoice_id))
        .into_tuple()
        .all(txn)
        .await
        .map_err(db_err)
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    tz: Tz,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// Raises an invoice over approved vouchers and marks them invoiced.
    ///
    /// # Errors
    ///
    /// - `Validation` for negative amounts, no vouchers or a repeated voucher
    /// - `NotFound` if the branch or a voucher is missing
    /// - `InvalidTransition` if a voucher is not approved or already paid
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<InvoiceWithDetails, LedgerError> {
        let scope = BranchScope::new(input.company_id, input.branch_id);
        validate_invoice(input.amount, input.sisa_amount, input.voucher_ids.len())?;
        let voucher_ids = unique_vouchers(&input.voucher_ids)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let short = branch_short_code(&txn, scope).await?;

        let id = Uuid::now_v7();
        let vouchers = check_vouchers(&txn, scope, id, &voucher_ids).await?;

        let kind = DocumentKind::Invoice;
        let seq = next_value(&txn, &kind.sequence_key(&short)).await?;
        let num = kind.number(&short, seq);

        let at = now();
        let header = invoice_headers::ActiveModel {
            id: Set(id),
            num: Set(num.clone()),
            number_seq: Set(seq),
            invoice_type: Set(input.invoice_type),
            amount: Set(input.amount),
            sisa_amount: Set(input.sisa_amount),
            description: Set(input.description),
            invoice_date: Set(input.invoice_date),
            file: Set(input.file),
            status: Set(input.status),
            status_approve: Set(InvoiceApproval::Pending.code()),
            company_id: Set(scope.company_id.into_inner()),
            branch_id: Set(scope.branch_id.into_inner()),
            created_by: Set(input.created_by),
            updated_by: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        let details = attach_vouchers(&txn, id, vouchers, &header.created_by).await?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %num, scope = %scope, vouchers = details.len(), "invoice raised");
        Ok(InvoiceWithDetails { header, details })
    }

    /// Gets an invoice with its detail rows.
    pub async fn get(&self, scope: BranchScope, id: Uuid) -> Result<InvoiceWithDetails, LedgerError> {
        let header = invoice_headers::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .filter(|header| in_scope(header, scope))
            .ok_or_else(|| LedgerError::not_found("invoice", id))?;

        let details = header
            .find_related(invoice_details::Entity)
            .order_by_asc(invoice_details::Column::CreatedAt)
            .order_by_asc(invoice_details::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(InvoiceWithDetails { header, details })
    }

    /// Lists invoice headers, newest first.
    pub async fn list(
        &self,
        filter: InvoiceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<invoice_headers::Model>, LedgerError> {
        let mut query = invoice_headers::Entity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(invoice_headers::Column::CompanyId.eq(company_id.into_inner()));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(invoice_headers::Column::BranchId.eq(branch_id.into_inner()));
        }
        if let Some(num) = filter.num.filter(|n| !n.is_empty()) {
            query = query.filter(invoice_headers::Column::Num.contains(num));
        }
        if let Some(approval) = filter.approval {
            query = query.filter(invoice_headers::Column::StatusApprove.eq(approval.code()));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(invoice_headers::Column::InvoiceDate.gte(from));
        }
        if let Some(to) = filter.to_date {
            query = query.filter(invoice_headers::Column::InvoiceDate.lte(to));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(invoice_headers::Column::CreatedAt)
            .order_by_desc(invoice_headers::Column::NumberSeq)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page, total))
    }

    /// Replaces header fields and claimed vouchers; approval restarts at pending.
    ///
    /// Vouchers dropped from the invoice go back to unpaid.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once the invoice is rejected or final.
    pub async fn update(
        &self,
        scope: BranchScope,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<InvoiceWithDetails, LedgerError> {
        validate_invoice(input.amount, input.sisa_amount, input.voucher_ids.len())?;
        let voucher_ids = unique_vouchers(&input.voucher_ids)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let header = invoice_headers::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .filter(|header| in_scope(header, scope))
            .ok_or_else(|| LedgerError::not_found("invoice", id))?;

        let approval = header.approval()?;
        if !approval.is_editable() {
            return Err(LedgerError::InvalidTransition {
                entity: "invoice",
                from: approval.to_string(),
                to: "edited".to_string(),
            });
        }

        let keep: HashSet<Uuid> = voucher_ids.iter().copied().collect();
        let dropped: Vec<Uuid> = detail_voucher_ids(&txn, id)
            .await?
            .into_iter()
            .filter(|voucher_id| !keep.contains(voucher_id))
            .collect();
        let released = release_vouchers(&txn, scope, id, &dropped, &input.updated_by).await?;

        invoice_details::Entity::delete_many()
            .filter(invoice_details::Column::InvoiceHeaderId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let vouchers = check_vouchers(&txn, scope, id, &voucher_ids).await?;
        let details = attach_vouchers(&txn, id, vouchers, &input.updated_by).await?;

        let mut active = header.into_active_model();
        active.invoice_type = Set(input.invoice_type);
        active.amount = Set(input.amount);
        active.sisa_amount = Set(input.sisa_amount);
        active.description = Set(input.description);
        active.invoice_date = Set(input.invoice_date);
        active.file = Set(input.file);
        active.status = Set(input.status);
        active.status_approve = Set(InvoiceApproval::Pending.code());
        active.updated_by = Set(Some(input.updated_by));
        active.updated_at = Set(now());
        let header = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %header.num, vouchers = details.len(), released, "invoice updated");
        Ok(InvoiceWithDetails { header, details })
    }

    /// Moves a batch of invoices to `to`, all or nothing.
    ///
    /// Rejections return the claimed vouchers to unpaid. Final approval
    /// credits `sisa_amount` back to the branch and records it in history.
    ///
    /// # Errors
    ///
    /// - `NotFound` if any id is missing from the caller's branch
    /// - `InvalidTransition` if any invoice cannot move to `to`
    pub async fn update_approve(
        &self,
        scope: BranchScope,
        ids: &[Uuid],
        to: InvoiceApproval,
        actor: &str,
    ) -> Result<Vec<invoice_headers::Model>, LedgerError> {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            return Err(LedgerError::Validation("no invoices given".to_string()));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let found = invoice_headers::Entity::find()
            .filter(invoice_headers::Column::Id.is_in(ids.iter().copied()))
            .filter(invoice_headers::Column::CompanyId.eq(scope.company_id.into_inner()))
            .filter(invoice_headers::Column::BranchId.eq(scope.branch_id.into_inner()))
            .order_by_asc(invoice_headers::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;
        let headers = ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|header| header.id == *id)
                    .cloned()
                    .ok_or_else(|| LedgerError::not_found("invoice", id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for header in &headers {
            header.approval()?.transition_to(to)?;
        }

        let mut updated = Vec::with_capacity(headers.len());
        for header in headers {
            if to.releases_vouchers() {
                let voucher_ids = detail_voucher_ids(&txn, header.id).await?;
                let released = release_vouchers(&txn, scope, header.id, &voucher_ids, actor).await?;
                info!(num = %header.num, released, "invoice vouchers released");
            }

            if let Some(refund) = to.refund(header.sisa_amount) {
                let saldo = lock_saldo(&txn, scope).await?;
                let applied = apply_delta_in(&txn, self.tz, saldo, 0, refund, actor).await?;
                let tag = invoice_refund_tag(&header.num);
                append_history(&txn, scope, &tag, applied.movement(refund, 0), actor).await?;
                info!(num = %header.num, refund, closing = applied.after.closing, "invoice funds returned");
            }

            let mut active = header.into_active_model();
            active.status_approve = Set(to.code());
            active.updated_by = Set(Some(actor.to_string()));
            active.updated_at = Set(now());
            updated.push(active.update(&txn).await.map_err(db_err)?);
        }
        txn.commit().await.map_err(db_err)?;

        info!(count = updated.len(), status = %to, "invoice approval updated");
        Ok(updated)
    }
}
