//! Balance store: branch snapshots, monthly rows and the movement history.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use pettycash_core::ledger::{BalanceFigures, SpendingLimits, opening_balance, start_of_day};
use pettycash_core::{BranchScope, LedgerError, MonthYear};
use pettycash_shared::types::{BranchId, CompanyId, PageRequest, PageResponse};
use pettycash_shared::Claims;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{saldo_histories, saldo_months, saldos};

use super::directory::find_branch;
use super::ledger::{apply_delta_in, insert_month, lock_saldo, release_debit_in};
use super::{conflict_err, db_err, now};

/// Input for opening a branch balance.
#[derive(Debug, Clone)]
pub struct CreateSaldoInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Branch the balance belongs to.
    pub branch_id: BranchId,
    /// Starting cash.
    pub opening_balance: i64,
    /// Ceiling for a single voucher.
    pub voucher_limit: i64,
    /// Ceiling for a single cash advance.
    pub advance_limit: i64,
    /// Operator opening the balance.
    pub created_by: String,
}

/// Filter for the movement history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Company filter.
    pub company_id: Option<CompanyId>,
    /// Branch filter.
    pub branch_id: Option<BranchId>,
    /// Substring of the description tag.
    pub description: Option<String>,
    /// First day included (ledger timezone).
    pub from_date: Option<NaiveDate>,
    /// Last day included (ledger timezone).
    pub to_date: Option<NaiveDate>,
}

/// Balance store repository.
#[derive(Debug, Clone)]
pub struct SaldoRepository {
    db: DatabaseConnection,
    tz: Tz,
}

impl SaldoRepository {
    /// Creates a new saldo repository; months are cut in `tz`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, tz: Tz) -> Self {
        Self { db, tz }
    }

    /// Opens the balance of a branch together with its current month row.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch does not exist in the company
    /// - `AlreadyExists` if the branch already has a balance
    /// - `Validation` for negative amounts
    pub async fn create(&self, input: CreateSaldoInput) -> Result<saldos::Model, LedgerError> {
        let scope = BranchScope::new(input.company_id, input.branch_id);
        let limits = SpendingLimits {
            voucher_limit: input.voucher_limit,
            advance_limit: input.advance_limit,
        };
        limits.validate()?;
        if input.opening_balance < 0 {
            return Err(LedgerError::Validation(format!(
                "opening balance must not be negative: {}",
                input.opening_balance
            )));
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        find_branch(&txn, scope).await?;

        let existing = saldos::Entity::find()
            .filter(saldos::Column::CompanyId.eq(scope.company_id.into_inner()))
            .filter(saldos::Column::BranchId.eq(scope.branch_id.into_inner()))
            .count(&txn)
            .await
            .map_err(db_err)?;
        if existing > 0 {
            return Err(LedgerError::already_exists("saldo", scope));
        }

        let figures = BalanceFigures::starting_at(input.opening_balance);
        let month = MonthYear::current_in(self.tz);
        let at = now();
        let key = scope.to_string();

        let saldo = saldos::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(scope.company_id.into_inner()),
            branch_id: Set(scope.branch_id.into_inner()),
            opening_balance: Set(figures.opening),
            inflow_total: Set(figures.inflow),
            voucher_limit: Set(limits.voucher_limit),
            advance_limit: Set(limits.advance_limit),
            voucher_used: Set(figures.voucher_used),
            advance_used: Set(figures.advance_used),
            closing_balance: Set(figures.closing),
            month_year: Set(month.to_string()),
            is_active: Set(true),
            created_by: Set(input.created_by),
            updated_by: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
        }
        .insert(&txn)
        .await
        .map_err(conflict_err("saldo", &key))?;

        insert_month(&txn, scope, month, figures.opening).await?;
        txn.commit().await.map_err(db_err)?;

        info!(scope = %scope, opening = figures.opening, "saldo opened");
        Ok(saldo)
    }

    /// Gets the snapshot of a branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the branch has no balance.
    pub async fn get_by_company_branch(
        &self,
        scope: BranchScope,
    ) -> Result<saldos::Model, LedgerError> {
        saldos::Entity::find()
            .filter(saldos::Column::CompanyId.eq(scope.company_id.into_inner()))
            .filter(saldos::Column::BranchId.eq(scope.branch_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found("saldo", scope))
    }

    /// Gets the snapshot of the caller's own branch.
    pub async fn get_by_user(&self, claims: &Claims) -> Result<saldos::Model, LedgerError> {
        self.get_by_company_branch(BranchScope::of(claims)).await
    }

    /// Gets the month row of `month`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing was booked in that month.
    pub async fn get_month(
        &self,
        scope: BranchScope,
        month: MonthYear,
    ) -> Result<saldo_months::Model, LedgerError> {
        saldo_months::Entity::find()
            .filter(saldo_months::Column::CompanyId.eq(scope.company_id.into_inner()))
            .filter(saldo_months::Column::BranchId.eq(scope.branch_id.into_inner()))
            .filter(saldo_months::Column::MonthYear.eq(month.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::not_found("saldo month", format!("{scope} {month}")))
    }

    /// Replaces the spending limits; balances are untouched.
    pub async fn update_limits(
        &self,
        scope: BranchScope,
        limits: SpendingLimits,
        actor: &str,
    ) -> Result<saldos::Model, LedgerError> {
        limits.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let saldo = lock_saldo(&txn, scope).await?;
        let mut active = saldo.into_active_model();
        active.voucher_limit = Set(limits.voucher_limit);
        active.advance_limit = Set(limits.advance_limit);
        active.updated_by = Set(Some(actor.to_string()));
        active.updated_at = Set(now());
        let saldo = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        info!(
            scope = %scope,
            voucher_limit = limits.voucher_limit,
            advance_limit = limits.advance_limit,
            "saldo limits updated"
        );
        Ok(saldo)
    }

    /// Opening balance of the month containing `month_start` plus the net of
    /// every history entry from `month_start` up to, not including, `as_of`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `as_of` is before `month_start`
    /// - `NotFound` if the month has no row
    pub async fn compute_opening_balance(
        &self,
        scope: BranchScope,
        as_of: NaiveDate,
        month_start: NaiveDate,
    ) -> Result<i64, LedgerError> {
        if as_of < month_start {
            return Err(LedgerError::Validation(format!(
                "as_of {as_of} is before month start {month_start}"
            )));
        }

        let month = self
            .get_month(scope, MonthYear::of_date(month_start))
            .await?;

        let movements: Vec<(i64, i64)> = saldo_histories::Entity::find()
            .select_only()
            .column(saldo_histories::Column::InAmount)
            .column(saldo_histories::Column::OutAmount)
            .filter(saldo_histories::Column::CompanyId.eq(scope.company_id.into_inner()))
            .filter(saldo_histories::Column::BranchId.eq(scope.branch_id.into_inner()))
            .filter(saldo_histories::Column::CreatedAt.gte(start_of_day(month_start, self.tz)))
            .filter(saldo_histories::Column::CreatedAt.lt(start_of_day(as_of, self.tz)))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        opening_balance(month.opening_balance, movements)
    }

    /// Debits `out` and credits `inflow`, returning the new closing balance.
    ///
    /// No history entry is written; document workflows do that themselves.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the branch has no balance
    /// - `InsufficientBalance` if the result would be negative
    pub async fn apply_delta(
        &self,
        scope: BranchScope,
        out: i64,
        inflow: i64,
        actor: &str,
    ) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let saldo = lock_saldo(&txn, scope).await?;
        let applied = apply_delta_in(&txn, self.tz, saldo, out, inflow, actor).await?;
        txn.commit().await.map_err(db_err)?;

        info!(scope = %scope, out, inflow, closing = applied.after.closing, "saldo moved");
        Ok(applied.after.closing)
    }

    /// Gives back a voucher debit of `amount` booked in `booked`.
    pub async fn release_debit(
        &self,
        scope: BranchScope,
        amount: i64,
        booked: MonthYear,
        actor: &str,
    ) -> Result<i64, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let applied = release_debit_in(&txn, scope, amount, booked, actor).await?;
        txn.commit().await.map_err(db_err)?;

        info!(scope = %scope, amount, month = %booked, "saldo debit released");
        Ok(applied.after.closing)
    }

    /// Lists history entries, newest first.
    pub async fn list_history(
        &self,
        filter: HistoryFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<saldo_histories::Model>, LedgerError> {
        let mut query = saldo_histories::Entity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(saldo_histories::Column::CompanyId.eq(company_id.into_inner()));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(saldo_histories::Column::BranchId.eq(branch_id.into_inner()));
        }
        if let Some(description) = filter.description.filter(|d| !d.is_empty()) {
            query = query.filter(saldo_histories::Column::Description.contains(description));
        }
        if let Some(from) = filter.from_date {
            query = query.filter(saldo_histories::Column::CreatedAt.gte(start_of_day(from, self.tz)));
        }
        if let Some(to) = filter.to_date {
            let end = start_of_day(to + Duration::days(1), self.tz);
            query = query.filter(saldo_histories::Column::CreatedAt.lt(end));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(saldo_histories::Column::CreatedAt)
            .order_by_desc(saldo_histories::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page, total))
    }
}
