//! `SeaORM` Entity for kasbons table (employee cash advances).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "kasbons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub num: String,
    pub number_seq: i64,
    pub kasbon_type: String,
    pub amount: i64,
    pub description: String,
    pub kasbon_date: Date,
    pub file: Option<String>,
    pub status: String,
    pub release_date: Option<Date>,
    pub paid_date: Option<Date>,
    pub settled_date: Option<Date>,
    pub employee_id: Uuid,
    /// Voucher that settled the advance.
    pub bkk_header_id: Option<Uuid>,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub department_id: Option<Uuid>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeeId",
        to = "super::employees::Column::Id"
    )]
    Employees,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
