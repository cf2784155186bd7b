//! `SeaORM` Entity for bkk_details table (voucher lines).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bkk_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bkk_header_id: Uuid,
    /// Transaction code the line is booked against.
    pub trx_id: Option<Uuid>,
    pub lines_desc: String,
    pub lines_date: Date,
    pub lines_amount: i64,
    pub lines_file: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bkk_headers::Entity",
        from = "Column::BkkHeaderId",
        to = "super::bkk_headers::Column::Id"
    )]
    BkkHeaders,
}

impl Related<super::bkk_headers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BkkHeaders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
