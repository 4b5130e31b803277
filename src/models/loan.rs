use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub status: String, // 'active', 'returned', 'overdue', 'renewed', 'lost'
    pub loan_date: String,
    pub expected_return_date: String,
    pub actual_return_date: Option<String>,
    pub renewals_count: i32,
    pub max_renewals: i32,
    pub observations: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::loan_detail::Entity")]
    LoanDetails,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::loan_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A loan is open while its copies are still out.
    pub fn is_open(&self) -> bool {
        self.actual_return_date.is_none() && self.status != "returned"
    }
}
