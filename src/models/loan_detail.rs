use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub loan_id: i32,
    pub copy_id: i32,
    /// Always 1: each row is one physical copy. A multi-copy loan is
    /// multiple rows, never a row with a higher quantity.
    pub quantity: i32,
    pub date_added: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loan::Entity",
        from = "Column::LoanId",
        to = "super::loan::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Loan,
    #[sea_orm(
        belongs_to = "super::copy::Entity",
        from = "Column::CopyId",
        to = "super::copy::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Copy,
}

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loan.def()
    }
}

impl Related<super::copy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Copy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Subquery selecting the copy ids held by open loans (no actual return
/// date, status not "returned"). Used for availability checks.
pub fn open_loan_copy_ids() -> sea_orm::sea_query::SelectStatement {
    use sea_orm::sea_query::{Expr, Query};

    Query::select()
        .column((Entity, Column::CopyId))
        .from(Entity)
        .inner_join(
            super::loan::Entity,
            Expr::col((super::loan::Entity, super::loan::Column::Id))
                .equals((Entity, Column::LoanId)),
        )
        .and_where(
            Expr::col((super::loan::Entity, super::loan::Column::ActualReturnDate)).is_null(),
        )
        .and_where(Expr::col((super::loan::Entity, super::loan::Column::Status)).ne("returned"))
        .to_owned()
}
