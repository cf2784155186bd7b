//! Fund withdrawal (TarikDana) repository.
//!
//! A withdrawal credits the branch balance once, when it is recorded. Later
//! edits only touch descriptive fields.

use chrono::NaiveDate;
use chrono_tz::Tz;
use pettycash_core::ledger::FUND_RECEIPT_TAG;
use pettycash_core::{BranchScope, LedgerError};
use pettycash_shared::types::{BranchId, CompanyId, PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::tarik_danas;

use super::ledger::{append_history, apply_delta_in, lock_saldo};
use super::{conflict_err, db_err, now};

/// Input for recording a withdrawal.
#[derive(Debug, Clone)]
pub struct CreateWithdrawalInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Credited branch.
    pub branch_id: BranchId,
    /// Free-text withdrawal type.
    pub withdrawal_type: String,
    /// Amount credited, must be positive.
    pub amount: i64,
    /// Description; unique per branch.
    pub description: String,
    /// Withdrawal date.
    pub withdrawal_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Operator recording the withdrawal.
    pub created_by: String,
}

/// Editable fields of a withdrawal. The amount is fixed once booked.
#[derive(Debug, Clone)]
pub struct UpdateWithdrawalInput {
    /// Free-text withdrawal type.
    pub withdrawal_type: String,
    /// Description; unique per branch.
    pub description: String,
    /// Withdrawal date.
    pub withdrawal_date: NaiveDate,
    /// Attachment reference.
    pub file: Option<String>,
    /// Operator making the change.
    pub updated_by: String,
}

/// Filter for listing withdrawals.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalFilter {
    /// Company filter.
    pub company_id: Option<CompanyId>,
    /// Branch filter.
    pub branch_id: Option<BranchId>,
    /// Substring of the description.
    pub description: Option<String>,
    /// Withdrawal date on or after.
    pub from_date: Option<NaiveDate>,
    /// Withdrawal date on or before.
    pub to_date: Option<NaiveDate>,
}

async fn is_duplicate<C: ConnectionTrait>(
    conn: &C,
    scope: BranchScope,
    description: &str,
    exclude: Option<Uuid>,
) -> Result<bool, LedgerError> {
    let mut query = tarik_danas::Entity::find()
        .filter(tarik_danas::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(tarik_danas::Column::BranchId.eq(scope.branch_id.into_inner()))
        .filter(tarik_danas::Column::Description.eq(description));
    if let Some(id) = exclude {
        query = query.filter(tarik_danas::Column::Id.ne(id));
    }
    Ok(query.count(conn).await.map_err(db_err)? > 0)
}

fn in_scope(row: &tarik_danas::Model, scope: BranchScope) -> bool {
    row.company_id == scope.company_id.into_inner() && row.branch_id == scope.branch_id.into_inner()
}

/// Withdrawal repository.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    db: DatabaseConnection,
    tz: Tz,
}

impl WithdrawalRepository {
    /// Creates a new withdrawal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// True when the branch already has a withdrawal with `description`.
    pub async fn check_duplicate(
        &self,
        scope: BranchScope,
        description: &str,
    ) -> Result<bool, LedgerError> {
        is_duplicate(&self.db, scope, description, None).await
    }

    /// Records a withdrawal and credits the branch balance.
    ///
    /// # Errors
    ///
    /// - `Validation` if the amount is not positive
    /// - `AlreadyExists` if the description is taken in this branch
    /// - `NotFound` if the branch has no balance
    pub async fn create(
        &self,
        input: CreateWithdrawalInput,
    ) -> Result<tarik_danas::Model, LedgerError> {
        let scope = BranchScope::new(input.company_id, input.branch_id);
        if input.amount <= 0 {
            return Err(LedgerError::Validation(format!(
                "withdrawal amount must be positive, got {}",
                input.amount
            )));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        if is_duplicate(&txn, scope, &input.description, None).await? {
            return Err(LedgerError::already_exists("withdrawal", &input.description));
        }

        let saldo = lock_saldo(&txn, scope).await?;
        let applied = apply_delta_in(&txn, self.tz, saldo, 0, input.amount, &input.created_by).await?;
        append_history(
            &txn,
            scope,
            FUND_RECEIPT_TAG,
            applied.movement(input.amount, 0),
            &input.created_by,
        )
        .await?;

        let at = now();
        let description = input.description.clone();
        let withdrawal = tarik_danas::ActiveModel {
            id: Set(Uuid::now_v7()),
            withdrawal_type: Set(input.withdrawal_type),
            amount: Set(input.amount),
            description: Set(input.description),
            withdrawal_date: Set(input.withdrawal_date),
            file: Set(input.file),
            company_id: Set(scope.company_id.into_inner()),
            branch_id: Set(scope.branch_id.into_inner()),
            created_by: Set(input.created_by),
            updated_by: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(conflict_err("withdrawal", &description))?;
        txn.commit().await.map_err(db_err)?;

        info!(
            scope = %scope,
            amount = withdrawal.amount,
            closing = applied.after.closing,
            "withdrawal recorded"
        );
        Ok(withdrawal)
    }

    /// Gets a withdrawal.
    pub async fn get(&self, scope: BranchScope, id: Uuid) -> Result<tarik_danas::Model, LedgerError> {
        tarik_danas::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .filter(|row| in_scope(row, scope))
            .ok_or_else(|| LedgerError::not_found("withdrawal", id))
    }

    /// Lists withdrawals, newest first.
    pub async fn list(
        &self,
        filter: WithdrawalFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<tarik_danas::Model>, LedgerError> {
        let mut query = tarik_danas::Entity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(tarik_danas::Column::CompanyId.eq(company_id.into_inner()));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(tarik_danas::Column::BranchId.eq(branch_id.into_inner()));
        }
        if let Some(description) = filter.description.filter(|d| !d.is_empty()) {
            query = query.filter(tarik_danas::Column::Description.contains(description));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(tarik_danas::Column::WithdrawalDate.gte(from));
        }
        if let Some(to) = filter.to_date {
            query = query.filter(tarik_danas::Column::WithdrawalDate.lte(to));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(tarik_danas::Column::WithdrawalDate)
            .order_by_desc(tarik_danas::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page, total))
    }

    /// Edits the descriptive fields of a withdrawal.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the new description is taken in this branch.
    pub async fn update(
        &self,
        scope: BranchScope,
        id: Uuid,
        input: UpdateWithdrawalInput,
    ) -> Result<tarik_danas::Model, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let row = tarik_danas::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .filter(|row| in_scope(row, scope))
            .ok_or_else(|| LedgerError::not_found("withdrawal", id))?;

        if row.description != input.description
            && is_duplicate(&txn, scope, &input.description, Some(id)).await?
        {
            return Err(LedgerError::already_exists("withdrawal", &input.description));
        }

        let description = input.description.clone();
        let mut active = row.into_active_model();
        active.withdrawal_type = Set(input.withdrawal_type);
        active.description = Set(input.description);
        active.withdrawal_date = Set(input.withdrawal_date);
        active.file = Set(input.file);
        active.updated_by = Set(Some(input.updated_by));
        active.updated_at = Set(now());
        let row = active
            .update(&txn)
            .await
            .map_err(conflict_err("withdrawal", &description))?;
        txn.commit().await.map_err(db_err)?;

        info!(id = %row.id, "withdrawal updated");
        Ok(row)
    }
}
