//! `SeaORM` Entity for saldo_months table (one balance row per branch and month).

use pettycash_core::ledger::BalanceFigures;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "saldo_months")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub month_year: String,
    pub month: i16,
    pub year: i32,
    pub opening_balance: i64,
    pub inflow_total: i64,
    pub voucher_used: i64,
    pub advance_used: i64,
    pub closing_balance: i64,
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
