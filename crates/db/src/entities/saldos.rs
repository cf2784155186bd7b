//! `SeaORM` Entity for saldos table (one balance snapshot per branch).

use pettycash_core::ledger::{BalanceFigures, BranchScope, SpendingLimits};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "saldos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub opening_balance: i64,
    pub inflow_total: i64,
    pub voucher_limit: i64,
    pub advance_limit: i64,
    pub voucher_used: i64,
    pub advance_used: i64,
    pub closing_balance: i64,
    /// Month of the last movement, `YYYY-MM`.
    pub month_year: String,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The balance figures of this row.
    #[must_use]
    pub const fn figures(&self) -> BalanceFigures {
        BalanceFigures {
            opening: self.opening_balance,
            inflow: self.inflow_total,
            voucher_used: self.voucher_used,
            advance_used: self.advance_used,
            closing: self.closing_balance,
        }
    }

    /// The spending limits of this branch.
    #[must_use]
    pub const fn limits(&self) -> SpendingLimits {
        SpendingLimits {
            voucher_limit: self.voucher_limit,
            advance_limit: self.advance_limit,
        }
    }

    /// Company/branch this row belongs to.
    #[must_use]
    pub fn scope(&self) -> BranchScope {
        BranchScope::new(self.company_id.into(), self.branch_id.into())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branches::Entity",
        from = "Column::BranchId",
        to = "super::branches::Column::Id"
    )]
    Branches,
}

impl Related<super::branches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
