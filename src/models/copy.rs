use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "copies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    pub isbn: Option<String>,
    pub publisher_name: Option<String>,
    pub shelf_location: Option<String>,
    /// Whether this physical copy is on the shelf. Flipped to `false` when
    /// the copy is checked out and back to `true` when its loan is returned.
    /// A copy is *available* iff `is_active` and it has no open loan.
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id"
    )]
    Book,
    #[sea_orm(has_many = "super::loan_detail::Entity")]
    LoanDetails,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::loan_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
