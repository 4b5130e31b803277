//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::domain::{Author, AuthorRepository, CreateAuthorInput, DomainError};
use crate::models::author::{ActiveModel, Column, Entity as AuthorEntity};

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_dto(model: crate::models::author::Model) -> Author {
    Author {
        id: model.id,
        full_name: model.full_name,
        nationality: model.nationality,
        biography: model.biography,
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_all(&self) -> Result<Vec<Author>, DomainError> {
        let authors = AuthorEntity::find()
            .order_by_asc(Column::FullName)
            .all(&self.db)
            .await?;

        Ok(authors.into_iter().map(to_dto).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError> {
        let author = AuthorEntity::find_by_id(id).one(&self.db).await?;
        Ok(author.map(to_dto))
    }

    async fn create(&self, input: CreateAuthorInput) -> Result<Author, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_author = ActiveModel {
            full_name: Set(input.full_name),
            nationality: Set(input.nationality),
            biography: Set(input.biography),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_author.insert(&self.db).await?;

        Ok(to_dto(result))
    }
}
