//! `SeaORM` Entity for bkk_headers table (cash-out vouchers).

use pettycash_core::LedgerError;
use pettycash_core::workflow::{PaymentStatus, VoucherApproval};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bkk_headers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub num: String,
    pub number_seq: i64,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub kasbon_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub release_date: Option<Date>,
    pub paid_date: Option<Date>,
    pub total_amount: i64,
    /// Payment status: `""`, `"Invoice"` or `"Paid"`.
    pub status: String,
    /// Approval stage: 0 pending, 1 approved, 2 rejected.
    pub status_approve: i16,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed approval stage.
    pub fn approval(&self) -> Result<VoucherApproval, LedgerError> {
        VoucherApproval::from_code(self.status_approve)
    }

    /// Parsed payment status.
    pub fn payment(&self) -> Result<PaymentStatus, LedgerError> {
        PaymentStatus::parse(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bkk_details::Entity")]
    BkkDetails,
}

impl Related<super::bkk_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BkkDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
