//! Balance-store primitives shared by the document workflows.
//!
//! Everything here runs inside a caller's transaction. The branch snapshot is
//! always locked first, then month rows, so concurrent movements on one
//! branch serialize on the snapshot row.

use chrono::Utc;
use chrono_tz::Tz;
use pettycash_core::ledger::{BalanceFigures, Movement};
use pettycash_core::{BranchScope, LedgerError, MonthYear};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{saldo_histories, saldo_months, saldos};

use super::{db_err, now};

/// Result of a debit/credit on the snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Applied {
    pub before: BalanceFigures,
    pub after: BalanceFigures,
}

impl Applied {
    pub(crate) const fn movement(&self, inflow: i64, out: i64) -> Movement {
        Movement::between(&self.before, &self.after, inflow, out)
    }
}

fn month_number(month: MonthYear) -> Result<i16, LedgerError> {
    i16::try_from(month.month())
        .map_err(|_| LedgerError::Validation(format!("invalid month: {month}")))
}

/// Loads the snapshot of `scope` with `SELECT ... FOR UPDATE`.
pub(crate) async fn lock_saldo(
    txn: &DatabaseTransaction,
    scope: BranchScope,
) -> Result<saldos::Model, LedgerError> {
    saldos::Entity::find()
        .filter(saldos::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(saldos::Column::BranchId.eq(scope.branch_id.into_inner()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found("saldo", scope))
}

async fn store_saldo(
    txn: &DatabaseTransaction,
    saldo: saldos::Model,
    figures: BalanceFigures,
    month: MonthYear,
    actor: &str,
) -> Result<(), LedgerError> {
    let mut active = saldo.into_active_model();
    active.opening_balance = Set(figures.opening);
    active.inflow_total = Set(figures.inflow);
    active.voucher_used = Set(figures.voucher_used);
    active.advance_used = Set(figures.advance_used);
    active.closing_balance = Set(figures.closing);
    active.month_year = Set(month.to_string());
    active.updated_by = Set(Some(actor.to_string()));
    active.updated_at = Set(now());
    active.update(txn).await.map_err(db_err)?;
    Ok(())
}

async fn store_month(
    txn: &DatabaseTransaction,
    row: saldo_months::Model,
    figures: BalanceFigures,
) -> Result<(), LedgerError> {
    let mut active = row.into_active_model();
    active.opening_balance = Set(figures.opening);
    active.inflow_total = Set(figures.inflow);
    active.voucher_used = Set(figures.voucher_used);
    active.advance_used = Set(figures.advance_used);
    active.closing_balance = Set(figures.closing);
    active.updated_at = Set(now());
    active.update(txn).await.map_err(db_err)?;
    Ok(())
}

/// Inserts the month row of `month` starting at `opening`.
pub(crate) async fn insert_month(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    month: MonthYear,
    opening: i64,
) -> Result<saldo_months::Model, LedgerError> {
    let figures = BalanceFigures::starting_at(opening);
    let at = now();
    saldo_months::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(scope.company_id.into_inner()),
        branch_id: Set(scope.branch_id.into_inner()),
        month_year: Set(month.to_string()),
        month: Set(month_number(month)?),
        year: Set(month.year()),
        opening_balance: Set(figures.opening),
        inflow_total: Set(figures.inflow),
        voucher_used: Set(figures.voucher_used),
        advance_used: Set(figures.advance_used),
        closing_balance: Set(figures.closing),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(txn)
    .await
    .map_err(db_err)
}

async fn find_month(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    month: MonthYear,
) -> Result<Option<saldo_months::Model>, LedgerError> {
    saldo_months::Entity::find()
        .filter(saldo_months::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(saldo_months::Column::BranchId.eq(scope.branch_id.into_inner()))
        .filter(saldo_months::Column::MonthYear.eq(month.to_string()))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)
}

/// Month row of `month`, created on first use.
///
/// A new row opens at the previous month's closing figure, or at
/// `fallback_opening` when there is no previous row.
async fn month_row(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    month: MonthYear,
    fallback_opening: i64,
) -> Result<saldo_months::Model, LedgerError> {
    if let Some(row) = find_month(txn, scope, month).await? {
        return Ok(row);
    }
    let opening = find_month(txn, scope, month.previous())
        .await?
        .map_or(fallback_opening, |prev| prev.closing_balance);
    insert_month(txn, scope, month, opening).await
}

/// Debits `out` and credits `inflow` on a locked snapshot and on the current
/// month row.
///
/// # Errors
///
/// `InsufficientBalance` when the snapshot would go negative; nothing is
/// written in that case.
pub(crate) async fn apply_delta_in(
    txn: &DatabaseTransaction,
    tz: Tz,
    saldo: saldos::Model,
    out: i64,
    inflow: i64,
    actor: &str,
) -> Result<Applied, LedgerError> {
    let scope = saldo.scope();
    let before = saldo.figures();
    let after = before.apply_delta(out, inflow)?;
    let month = MonthYear::current_in(tz);

    let row = month_row(txn, scope, month, before.closing).await?;
    let month_after = row.figures().apply_delta(out, inflow)?;

    store_saldo(txn, saldo, after, month, actor).await?;
    store_month(txn, row, month_after).await?;

    Ok(Applied { before, after })
}

/// Reverses a voucher debit of `amount` that was booked in `booked`.
///
/// The booked month gives the spend back; every later month row carries the
/// difference forward in its opening figure.
pub(crate) async fn release_debit_in(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    amount: i64,
    booked: MonthYear,
    actor: &str,
) -> Result<Applied, LedgerError> {
    let saldo = lock_saldo(txn, scope).await?;
    let before = saldo.figures();
    let after = before.release_debit(amount)?;
    let month = saldo
        .month_year
        .parse::<MonthYear>()
        .map_or(booked, |last| last.max(booked));

    let rows = saldo_months::Entity::find()
        .filter(saldo_months::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(saldo_months::Column::BranchId.eq(scope.branch_id.into_inner()))
        .filter(saldo_months::Column::MonthYear.gte(booked.to_string()))
        .order_by_asc(saldo_months::Column::MonthYear)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(db_err)?;

    for row in rows {
        let figures = if row.month_year == booked.to_string() {
            row.figures().release_debit(amount)?
        } else {
            row.figures().shift_opening(amount)?
        };
        store_month(txn, row, figures).await?;
    }

    store_saldo(txn, saldo, after, month, actor).await?;
    Ok(Applied { before, after })
}

/// Appends one history entry for `movement`.
pub(crate) async fn append_history(
    txn: &DatabaseTransaction,
    scope: BranchScope,
    description: &str,
    movement: Movement,
    actor: &str,
) -> Result<saldo_histories::Model, LedgerError> {
    saldo_histories::ActiveModel {
        id: Set(Uuid::now_v7()),
        description: Set(description.to_string()),
        company_id: Set(scope.company_id.into_inner()),
        branch_id: Set(scope.branch_id.into_inner()),
        opening_balance: Set(movement.opening),
        in_amount: Set(movement.inflow),
        out_amount: Set(movement.out),
        closing_balance: Set(movement.closing),
        created_by: Set(actor.to_string()),
        created_at: Set(now()),
    }
    .insert(txn)
    .await
    .map_err(db_err)
}

/// Deletes the debit entries tagged `description` and gives their amounts
/// back to the branch. Returns the total released.
pub(crate) async fn unbook_in(
    txn: &DatabaseTransaction,
    tz: Tz,
    scope: BranchScope,
    description: &str,
    actor: &str,
) -> Result<i64, LedgerError> {
    let entries = saldo_histories::Entity::find()
        .filter(saldo_histories::Column::CompanyId.eq(scope.company_id.into_inner()))
        .filter(saldo_histories::Column::BranchId.eq(scope.branch_id.into_inner()))
        .filter(saldo_histories::Column::Description.eq(description))
        .filter(saldo_histories::Column::OutAmount.gt(0))
        .all(txn)
        .await
        .map_err(db_err)?;

    let mut released = 0i64;
    for entry in entries {
        let booked = MonthYear::of_instant(entry.created_at.with_timezone(&Utc), tz);
        release_debit_in(txn, scope, entry.out_amount, booked, actor).await?;
        released = released
            .checked_add(entry.out_amount)
            .ok_or_else(|| LedgerError::Validation("released amount overflow".to_string()))?;
        saldo_histories::Entity::delete_by_id(entry.id)
            .exec(txn)
            .await
            .map_err(db_err)?;
    }
    Ok(released)
}
