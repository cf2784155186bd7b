//! `SeaORM` Entity for invoice_details table (vouchers claimed by an invoice).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_header_id: Uuid,
    pub bkk_header_id: Uuid,
    pub status: String,
    pub total_amount: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice_headers::Entity",
        from = "Column::InvoiceHeaderId",
        to = "super::invoice_headers::Column::Id"
    )]
    InvoiceHeaders,
    #[sea_orm(
        belongs_to = "super::bkk_headers::Entity",
        from = "Column::BkkHeaderId",
        to = "super::bkk_headers::Column::Id"
    )]
    BkkHeaders,
}

impl Related<super::invoice_headers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceHeaders.def()
    }
}

impl Related<super::bkk_headers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BkkHeaders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
