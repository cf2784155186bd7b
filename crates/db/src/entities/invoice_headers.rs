//! `SeaORM` Entity for invoice_headers table.

use pettycash_core::LedgerError;
use pettycash_core::workflow::InvoiceApproval;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_headers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub num: String,
    pub number_seq: i64,
    pub invoice_type: String,
    pub amount: i64,
    /// Unspent amount returned to the branch on final approval.
    pub sisa_amount: i64,
    pub description: String,
    pub invoice_date: Date,
    pub file: Option<String>,
    pub status: String,
    /// Approval stage: 0 pending .. 4 final-rejected.
    pub status_approve: i16,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed approval stage.
    pub fn approval(&self) -> Result<InvoiceApproval, LedgerError> {
        InvoiceApproval::from_code(self.status_approve)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_details::Entity")]
    InvoiceDetails,
}

impl Related<super::invoice_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
