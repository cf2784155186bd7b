//! Lookups into the read-only reference tables.

use pettycash_core::{BranchScope, LedgerError, numbering::validate_short_code};
use pettycash_shared::types::EmployeeId;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::entities::{branches, employees};

use super::db_err;

/// Branch of `scope`, `NotFound` when missing or owned by another company.
pub(crate) async fn find_branch<C: ConnectionTrait>(
    conn: &C,
    scope: BranchScope,
) -> Result<branches::Model, LedgerError> {
    branches::Entity::find_by_id(scope.branch_id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?
        .filter(|branch| branch.company_id == scope.company_id.into_inner())
        .ok_or_else(|| LedgerError::not_found("branch", scope))
}

/// Short code used in document numbers of `scope`.
pub(crate) async fn branch_short_code<C: ConnectionTrait>(
    conn: &C,
    scope: BranchScope,
) -> Result<String, LedgerError> {
    let branch = find_branch(conn, scope).await?;
    validate_short_code(&branch.shorter)?;
    Ok(branch.shorter)
}

pub(crate) async fn find_employee<C: ConnectionTrait>(
    conn: &C,
    employee_id: EmployeeId,
) -> Result<employees::Model, LedgerError> {
    employees::Entity::find_by_id(employee_id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| LedgerError::not_found("employee", employee_id))
}
