//! SeaORM implementation of CopyRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::domain::{Copy, CopyRepository, CreateCopyInput, DomainError};
use crate::models::book::Entity as BookEntity;
use crate::models::copy::{ActiveModel, Column, Entity as CopyEntity};
use crate::models::loan_detail::open_loan_copy_ids;

/// SeaORM-based implementation of CopyRepository
pub struct SeaOrmCopyRepository {
    db: DatabaseConnection,
}

impl SeaOrmCopyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_dto(copy: crate::models::copy::Model, book_title: Option<String>) -> Copy {
    Copy {
        id: copy.id,
        book_id: copy.book_id,
        isbn: copy.isbn,
        publisher_name: copy.publisher_name,
        shelf_location: copy.shelf_location,
        is_active: copy.is_active,
        book_title,
    }
}

#[async_trait]
impl CopyRepository for SeaOrmCopyRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Copy>, DomainError> {
        let result = CopyEntity::find_by_id(id)
            .find_also_related(BookEntity)
            .one(&self.db)
            .await?;

        Ok(result.map(|(copy, book)| to_dto(copy, book.map(|b| b.title))))
    }

    async fn find_by_book_id(&self, book_id: i32) -> Result<Vec<Copy>, DomainError> {
        let copies = CopyEntity::find()
            .filter(Column::BookId.eq(book_id))
            .all(&self.db)
            .await?;

        Ok(copies.into_iter().map(|c| to_dto(c, None)).collect())
    }

    async fn list_available(&self, book_id: i32) -> Result<Vec<Copy>, DomainError> {
        let copies = CopyEntity::find()
            .filter(Column::BookId.eq(book_id))
            .filter(Column::IsActive.eq(true))
            .filter(Column::Id.not_in_subquery(open_loan_copy_ids()))
            .all(&self.db)
            .await?;

        Ok(copies.into_iter().map(|c| to_dto(c, None)).collect())
    }

    async fn count_available(&self, book_id: i32) -> Result<u64, DomainError> {
        let count = CopyEntity::find()
            .filter(Column::BookId.eq(book_id))
            .filter(Column::IsActive.eq(true))
            .filter(Column::Id.not_in_subquery(open_loan_copy_ids()))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn create(&self, input: CreateCopyInput) -> Result<Copy, DomainError> {
        // The parent book must exist; a dangling copy is unreachable
        BookEntity::find_by_id(input.book_id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let now = chrono::Utc::now().to_rfc3339();

        let new_copy = ActiveModel {
            book_id: Set(input.book_id),
            isbn: Set(input.isbn),
            publisher_name: Set(input.publisher_name),
            shelf_location: Set(input.shelf_location),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_copy.insert(&self.db).await?;

        Ok(to_dto(result, None))
    }
}
