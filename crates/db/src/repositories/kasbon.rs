//! Employee cash advance (Kasbon) repository.
//!
//! Advances are numbered documents with a free-text status. They do not move
//! the branch balance themselves; the voucher that settles one does.

use chrono::NaiveDate;
use pettycash_core::{BranchScope, DocumentKind, LedgerError};
use pettycash_shared::types::{BranchId, CompanyId, EmployeeId, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::kasbons;

use super::counter::next_value;
use super::directory::{branch_short_code, find_employee};
use super::{db_err, now};

/// Input for requesting a cash advance.
#[derive(Debug, Clone)]
pub struct CreateKasbonInput {
    /// Company of the caller; the employee must belong to it.
    pub company_id: CompanyId,
    /// Employee receiving the advance; their branch owns the document.
    pub employee_id: EmployeeId,
    /// Free-text advance type.
    pub kasbon_type: String,
    /// Requested amount, must be positive.
    pub amount: i64,
    /// Purpose.
    pub description: String,
    /// Request date.
    pub kasbon_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Department override; defaults to the employee's.
    pub department_id: Option<Uuid>,
    /// Operator filing the request.
    pub created_by: String,
}

/// Editable fields of an advance.
#[derive(Debug, Clone)]
pub struct UpdateKasbonInput {
    /// Free-text advance type.
    pub kasbon_type: String,
    /// Purpose.
    pub description: String,
    /// Request date.
    pub kasbon_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Operator making the change.
    pub updated_by: String,
}

/// Status change of an advance, with the dates that came with it.
#[derive(Debug, Clone)]
pub struct KasbonStatusInput {
    /// New free-text status.
    pub status: String,
    /// Date the cash was handed out.
    pub release_date: Option<NaiveDate>,
    /// Date it was paid back.
    pub paid_date: Option<NaiveDate>,
    /// Date it was settled.
    pub settled_date: Option<NaiveDate>,
    /// Voucher that settled it.
    pub bkk_header_id: Option<Uuid>,
    /// Operator making the change.
    pub updated_by: String,
}

/// Filter for listing advances.
#[derive(Debug, Clone, Default)]
pub struct KasbonFilter {
    /// Company filter.
    pub company_id: Option<CompanyId>,
    /// Branch filter.
    pub branch_id: Option<BranchId>,
    /// Employee filter.
    pub employee_id: Option<EmployeeId>,
    /// Exact status.
    pub status: Option<String>,
    /// Substring of the number.
    pub num: Option<String>,
}

fn in_scope(row: &kasbons::Model, scope: BranchScope) -> bool {
    row.company_id == scope.company_id.into_inner() && row.branch_id == scope.branch_id.into_inner()
}

async fn lock_kasbon(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    id: Uuid,
) -> Result<kasbons::Model, LedgerError> {
    kasbons::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .filter(|row| in_scope(row, scope))
        .ok_or_else(|| LedgerError::not_found("kasbon", id))
}

/// Cash advance repository.
#[derive(Debug, Clone)]
pub struct KasbonRepository {
    db: DatabaseConnection,
}

impl KasbonRepository {
    /// Creates a new kasbon repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Files an advance for an employee under their branch's numbering.
    ///
    /// # Errors
    ///
    /// - `Validation` if the amount is not positive
    /// - `NotFound` if the employee is missing from the company or their
    ///   branch does not exist
    pub async fn create(&self, input: CreateKasbonInput) -> Result<kasbons::Model, LedgerError> {
        if input.amount <= 0 {
            return Err(LedgerError::Validation(format!(
                "kasbon amount must be positive, got {}",
                input.amount
            )));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let employee = find_employee(&txn, input.employee_id).await?;
        if employee.company_id != input.company_id.into_inner() {
            return Err(LedgerError::not_found("employee", input.employee_id));
        }
        let scope = BranchScope::new(employee.company_id.into(), employee.branch_id.into());
        let short = branch_short_code(&txn, scope).await?;

        let kind = DocumentKind::Kasbon;
        let seq = next_value(&txn, &kind.sequence_key(&short)).await?;
        let num = kind.number(&short, seq);

        let at = now();
        let kasbon = kasbons::ActiveModel {
            id: Set(Uuid::now_v7()),
            num: Set(num),
            number_seq: Set(seq),
            kasbon_type: Set(input.kasbon_type),
            amount: Set(input.amount),
            description: Set(input.description),
            kasbon_date: Set(input.kasbon_date),
            file: Set(input.file),
            status: Set(String::new()),
            release_date: Set(None),
            paid_date: Set(None),
            settled_date: Set(None),
            employee_id: Set(employee.id),
            bkk_header_id: Set(None),
            company_id: Set(scope.company_id.into_inner()),
            branch_id: Set(scope.branch_id.into_inner()),
            department_id: Set(input.department_id.or(employee.department_id)),
            created_by: Set(input.created_by),
            updated_by: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %kasbon.num, employee = %employee.id, amount = kasbon.amount, "kasbon filed");
        Ok(kasbon)
    }

    /// Gets an advance.
    pub async fn get(&self, scope: BranchScope, id: Uuid) -> Result<kasbons::Model, LedgerError> {
        kasbons::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .filter(|row| in_scope(row, scope))
            .ok_or_else(|| LedgerError::not_found("kasbon", id))
    }

    /// Lists advances, newest first.
    pub async fn list(
        &self,
        filter: KasbonFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<kasbons::Model>, LedgerError> {
        let mut query = kasbons::Entity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(kasbons::Column::CompanyId.eq(company_id.into_inner()));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(kasbons::Column::BranchId.eq(branch_id.into_inner()));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(kasbons::Column::EmployeeId.eq(employee_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(kasbons::Column::Status.eq(status));
        }
        if let Some(num) = filter.num.filter(|n| !n.is_empty()) {
            query = query.filter(kasbons::Column::Num.contains(num));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(kasbons::Column::CreatedAt)
            .order_by_desc(kasbons::Column::NumberSeq)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page, total))
    }

    /// Edits the descriptive fields of an advance.
    pub async fn update(
        &self,
        scope: BranchScope,
        id: Uuid,
        input: UpdateKasbonInput,
    ) -> Result<kasbons::Model, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let row = lock_kasbon(&txn, scope, id).await?;

        let mut active = row.into_active_model();
        active.kasbon_type = Set(input.kasbon_type);
        active.description = Set(input.description);
        active.kasbon_date = Set(input.kasbon_date);
        active.file = Set(input.file);
        active.department_id = Set(input.department_id);
        active.updated_by = Set(Some(input.updated_by));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %row.num, "kasbon updated");
        Ok(row)
    }

    /// Sets the status of an advance. Dates and the voucher link are only
    /// overwritten when given.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty status.
    pub async fn update_status(
        &self,
        scope: BranchScope,
        id: Uuid,
        input: KasbonStatusInput,
    ) -> Result<kasbons::Model, LedgerError> {
        let status = input.status.trim().to_string();
        if status.is_empty() {
            return Err(LedgerError::Validation("kasbon status is required".to_string()));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let row = lock_kasbon(&txn, scope, id).await?;
        let from = row.status.clone();

        let mut active = row.into_active_model();
        active.status = Set(status);
        if let Some(date) = input.release_date {
            active.release_date = Set(Some(date));
        }
        if let Some(date) = input.paid_date {
            active.paid_date = Set(Some(date));
        }
        if let Some(date) = input.settled_date {
            active.settled_date = Set(Some(date));
        }
        if let Some(voucher_id) = input.bkk_header_id {
            active.bkk_header_id = Set(Some(voucher_id));
        }
        active.updated_by = Set(Some(input.updated_by));
        active.updated_at = Set(now());
        let row = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(num = %row.num, from = %from, to = %row.status, "kasbon status updated");
        Ok(row)
    }
}
