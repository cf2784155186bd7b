//! Cash-out voucher (BKK) repository.
//!
//! A voucher debits the branch balance when it is issued, in the same
//! transaction as its history entry and its number allocation. Rejecting it
//! reverses both.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use pettycash_core::ledger::start_of_day;
use pettycash_core::workflow::{
    PaymentStatus, VoucherApproval, ensure_editable, voucher_total,
};
use pettycash_core::{BranchScope, DocumentKind, LedgerError};
use pettycash_shared::types::{BranchId, CompanyId, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::entities::{bkk_details, bkk_headers};

use super::counter::next_value;
use super::directory::branch_short_code;
use super::ledger::{append_history, apply_delta_in, lock_saldo, unbook_in};
use super::{db_err, dedup_ids, now, today};

/// One voucher line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherLineInput {
    /// Transaction code the line is booked against.
    #[serde(default)]
    pub trx_id: Option<Uuid>,
    /// What the money was spent on.
    pub description: String,
    /// Date of the expense.
    pub date: NaiveDate,
    /// Amount in minor units, must be positive.
    pub amount: i64,
    /// Receipt reference.
    #[serde(default)]
    pub file: Option<String>,
}

/// Input for issuing a voucher.
#[derive(Debug, Clone)]
pub struct CreateVoucherInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Issuing branch.
    pub branch_id: BranchId,
    /// Cash advance the voucher settles.
    pub kasbon_id: Option<Uuid>,
    /// Planned release date.
    pub release_date: Option<NaiveDate>,
    /// Expense lines; the total is their sum.
    pub lines: Vec<VoucherLineInput>,
    /// Operator issuing the voucher.
    pub created_by: String,
}

/// Input for replacing the lines of a pending voucher.
#[derive(Debug, Clone)]
pub struct UpdateVoucherInput {
    /// Cash advance the voucher settles.
    pub kasbon_id: Option<Uuid>,
    /// Planned release date.
    pub release_date: Option<NaiveDate>,
    /// New lines.
    pub lines: Vec<VoucherLineInput>,
    /// Operator making the change.
    pub updated_by: String,
}

/// Filter for listing vouchers.
#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
    /// Company filter.
    pub company_id: Option<CompanyId>,
    /// Branch filter.
    pub branch_id: Option<BranchId>,
    /// Substring of the number.
    pub num: Option<String>,
    /// Payment status filter.
    pub payment: Option<PaymentStatus>,
    /// Approval stage filter.
    pub approval: Option<VoucherApproval>,
    /// Issued on or after this day.
    pub from_date: Option<NaiveDate>,
    /// Issued on or before this day.
    pub to_date: Option<NaiveDate>,
}

/// Voucher header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherWithLines {
    /// The header.
    #[serde(flatten)]
    pub header: bkk_headers::Model,
    /// The lines, in entry order.
    pub lines: Vec<bkk_details::Model>,
}

fn in_scope(header: &bkk_headers::Model, scope: BranchScope) -> bool {
    header.company_id == scope.company_id.into_inner()
        && header.branch_id == scope.branch_id.into_inner()
}

/// Locks one voucher of `scope`.
pub(crate) async fn lock_voucher(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    id: Uuid,
) -> Result<bkk_headers::Model, LedgerError> {
    bkk_headers::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .filter(|header| in_scope(header, scope))
        .ok_or_else(|| LedgerError::not_found("voucher", id))
}

/// Locks every voucher in `ids`, failing on the first one missing from `scope`.
pub(crate) async fn lock_vouchers(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    ids: &[Uuid],
) -> Result<Vec<bkk_headers::Model>, LedgerError> {
    let found = bkk_headers::Entity::find()
        .filter(bkk_headers::Column::Id.is_in(ids.iter().copied()))
        .filter(bkk_headers::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(bkk_headers::Column::BranchId.eq(scope.branch_id.into_inner()))
        .order_by_asc(bkk_headers::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(db_err)?;

    ids.iter()
        .map(|id| {
            found
                .iter()
                .find(|header| header.id == *id)
                .cloned()
                .ok_or_else(|| LedgerError::not_found("voucher", id))
        })
        .collect()
}

/// Moves a voucher's payment status and invoice link.
pub(crate) async fn set_payment_in(
    txn: &DatabaseTransaction,
    header: bkk_headers::Model,
    to: PaymentStatus,
    invoice_id: Option<Uuid>,
    actor: &str,
) -> Result<bkk_headers::Model, LedgerError> {
    header.payment()?.transition_to(to, header.approval()?)?;

    let mut active = header.into_active_model();
    active.status = Set(to.as_str().to_string());
    active.invoice_id = Set(invoice_id);
    active.updated_by = Set(Some(actor.to_string()));
    active.updated_at = Set(now());
    active.update(txn).await.map_err(db_err)
}

async fn insert_lines(
    txn: &DatabaseTransaction,
    header_id: Uuid,
    lines: Vec<VoucherLineInput>,
) -> Result<Vec<bkk_details::Model>, LedgerError> {
    let mut inserted = Vec::with_capacity(lines.len());
    for line in lines {
        let detail = bkk_details::ActiveModel {
            id: Set(Uuid::now_v7()),
            bkk_header_id: Set(header_id),
            trx_id: Set(line.trx_id),
            lines_desc: Set(line.description),
            lines_date: Set(line.date),
            lines_amount: Set(line.amount),
            lines_file: Set(line.file),
            status: Set(String::new()),
            created_at: Set(now()),
        }
        .insert(txn)
        .await
        .map_err(db_err)?;
        inserted.push(detail);
    }
    Ok(inserted)
}

/// Limit check, debit and history entry for a voucher total.
async fn book_debit(
    txn: &DatabaseTransaction,
    tz: Tz,
    scope: BranchScope,
    num: &str,
    total: i64,
    actor: &str,
) -> Result<(), LedgerError> {
    let saldo = lock_saldo(txn, scope).await?;
    saldo.limits().check_voucher(total, saldo.closing_balance)?;
    let applied = apply_delta_in(txn, tz, saldo, total, 0, actor).await?;
    append_history(txn, scope, num, applied.movement(0, total), actor).await?;
    Ok(())
}

/// Voucher repository.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    db: DatabaseConnection,
    tz: Tz,
}

impl VoucherRepository {
    /// Creates a new voucher repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// Issues a voucher and debits the branch balance.
    ///
    /// The number is allocated only after every check passed, inside the
    /// same transaction, so a failed create leaves no gap in the sequence.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch or its balance does not exist
    /// - `Validation` for empty lines or non-positive amounts
    /// - `LimitExceeded` if the total is above the voucher limit
    /// - `InsufficientBalance` if the total is above the closing balance
    pub async fn create(&self, input: CreateVoucherInput) -> Result<VoucherWithLines, LedgerError> {
        let scope = BranchScope::new(input.company_id, input.branch_id);
        let total = voucher_total(input.lines.iter().map(|line| line.amount))?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let short = branch_short_code(&txn, scope).await?;

        let saldo = lock_saldo(&txn, scope).await?;
        saldo.limits().check_voucher(total, saldo.closing_balance)?;

        let kind = DocumentKind::Voucher;
        let seq = next_value(&txn, &kind.sequence_key(&short)).await?;
        let num = kind.number(&short, seq);

        let applied = apply_delta_in(&txn, self.tz, saldo, total, 0, &input.created_by).await?;

        let at = now();
        let header = bkk_headers::ActiveModel {
            id: Set(Uuid::now_v7()),
            num: Set(num.clone()),
            number_seq: Set(seq),
            company_id: Set(scope.company_id.into_inner()),
            branch_id: Set(scope.branch_id.into_inner()),
            kasbon_id: Set(input.kasbon_id),
            invoice_id: Set(None),
            release_date: Set(input.release_date),
            paid_date: Set(None),
            total_amount: Set(total),
            status: Set(PaymentStatus::Unpaid.as_str().to_string()),
            status_approve: Set(VoucherApproval::Pending.code()),
            created_by: Set(input.created_by.clone()),
            updated_by: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let lines = insert_lines(&txn, header.id, input.lines).await?;
        append_history(&txn, scope, &num, applied.movement(0, total), &input.created_by).await?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %num, scope = %scope, total, closing = applied.after.closing, "voucher issued");
        Ok(VoucherWithLines { header, lines })
    }

    /// Gets a voucher with its lines.
    pub async fn get(&self, scope: BranchScope, id: Uuid) -> Result<VoucherWithLines, LedgerError> {
        let header = bkk_headers::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .filter(|header| in_scope(header, scope))
            .ok_or_else(|| LedgerError::not_found("voucher", id))?;

        let lines = header
            .find_related(bkk_details::Entity)
            .order_by_asc(bkk_details::Column::CreatedAt)
            .order_by_asc(bkk_details::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(VoucherWithLines { header, lines })
    }

    /// Lists voucher headers, newest first.
    pub async fn list(
        &self,
        filter: VoucherFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<bkk_headers::Model>, LedgerError> {
        let mut query = bkk_headers::Entity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(bkk_headers::Column::CompanyId.eq(company_id.into_inner()));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(bkk_headers::Column::BranchId.eq(branch_id.into_inner()));
        }
        if let Some(num) = filter.num.filter(|n| !n.is_empty()) {
            query = query.filter(bkk_headers::Column::Num.contains(num));
        }
        if let Some(payment) = filter.payment {
            query = query.filter(bkk_headers::Column::Status.eq(payment.as_str()));
        }
        if let Some(approval) = filter.approval {
            query = query.filter(bkk_headers::Column::StatusApprove.eq(approval.code()));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(bkk_headers::Column::CreatedAt.gte(start_of_day(from, self.tz)));
        }
        if let Some(to) = filter.to_date {
            let end = start_of_day(to + Duration::days(1), self.tz);
            query = query.filter(bkk_headers::Column::CreatedAt.lt(end));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(bkk_headers::Column::CreatedAt)
            .order_by_desc(bkk_headers::Column::NumberSeq)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page, total))
    }

    /// Replaces the lines of a pending, unpaid voucher.
    ///
    /// A changed total re-states the debit: the old entry is released and
    /// the new total is checked and booked again under the same number.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the voucher is no longer editable
    /// - `LimitExceeded` / `InsufficientBalance` for a larger new total
    pub async fn update(
        &self,
        scope: BranchScope,
        id: Uuid,
        input: UpdateVoucherInput,
    ) -> Result<VoucherWithLines, LedgerError> {
        let total = voucher_total(input.lines.iter().map(|line| line.amount))?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let header = lock_voucher(&txn, scope, id).await?;
        ensure_editable(header.approval()?, header.payment()?)?;

        let previous_total = header.total_amount;
        if total != previous_total {
            unbook_in(&txn, self.tz, scope, &header.num, &input.updated_by).await?;
            book_debit(&txn, self.tz, scope, &header.num, total, &input.updated_by).await?;
        }

        bkk_details::Entity::delete_many()
            .filter(bkk_details::Column::BkkHeaderId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let lines = insert_lines(&txn, id, input.lines).await?;

        let mut active = header.into_active_model();
        active.kasbon_id = Set(input.kasbon_id);
        active.release_date = Set(input.release_date);
        active.total_amount = Set(total);
        active.updated_by = Set(Some(input.updated_by));
        active.updated_at = Set(now());
        let header = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %header.num, previous_total, total, "voucher updated");
        Ok(VoucherWithLines { header, lines })
    }

    /// Marks an approved voucher as paid.
    ///
    /// Invoiced and unpaid are driven by the invoice workflow and cannot be
    /// set here. The balance was debited at issuance.
    pub async fn update_status(
        &self,
        scope: BranchScope,
        id: Uuid,
        to: PaymentStatus,
        actor: &str,
    ) -> Result<bkk_headers::Model, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let header = lock_voucher(&txn, scope, id).await?;
        let from = header.payment()?;
        if to != PaymentStatus::Paid {
            return Err(LedgerError::InvalidTransition {
                entity: "voucher payment",
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let invoice_id = header.invoice_id;
        let header = set_payment_in(&txn, header, to, invoice_id, actor).await?;
        let mut active = header.into_active_model();
        active.paid_date = Set(Some(today(self.tz)));
        let header = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %header.num, from = %from, "voucher paid");
        Ok(header)
    }

    /// Approves or rejects a batch of pending vouchers, all or nothing.
    ///
    /// Rejection deletes each voucher's history entry and gives its amount
    /// back to the branch.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty batch
    /// - `NotFound` if any id is missing from the caller's branch
    /// - `InvalidTransition` if any voucher is not pending
    pub async fn update_approve(
        &self,
        scope: BranchScope,
        ids: &[Uuid],
        to: VoucherApproval,
        actor: &str,
    ) -> Result<Vec<bkk_headers::Model>, LedgerError> {
        let ids = dedup_ids(ids);
        if ids.is_empty() {
            return Err(LedgerError::Validation("no vouchers given".to_string()));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let headers = lock_vouchers(&txn, scope, &ids).await?;
        for header in &headers {
            header.approval()?.transition_to(to)?;
        }

        let mut updated = Vec::with_capacity(headers.len());
        for header in headers {
            if to == VoucherApproval::Rejected {
                let released = unbook_in(&txn, self.tz, scope, &header.num, actor).await?;
                info!(num = %header.num, released, "voucher debit reversed");
            }
            let mut active = header.into_active_model();
            active.status_approve = Set(to.code());
            active.updated_by = Set(Some(actor.to_string()));
            active.updated_at = Set(now());
            updated.push(active.update(&txn).await.map_err(db_err)?);
        }
        txn.commit().await.map_err(db_err)?;

        info!(count = updated.len(), status = %to, "voucher approval updated");
        Ok(updated)
    }
}
