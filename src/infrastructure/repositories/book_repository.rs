//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::{BookFilter, BookRepository, CreateBookInput, DomainError, PaginatedBooks};
use crate::models::book::{ActiveModel, Book, Column, Entity as BookEntity};
use crate::models::loan_detail::open_loan_copy_ids;
use crate::models::{book_authors, copy};
use crate::seed::generate_isbn;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self, filter: BookFilter) -> Result<PaginatedBooks, DomainError> {
        let mut query = BookEntity::find();

        if let Some(search) = &filter.search {
            if !search.is_empty() {
                // lower() on both sides keeps the match case-insensitive
                // regardless of the backend's LIKE collation
                query = query.filter(
                    Expr::expr(Func::lower(Expr::col((BookEntity, Column::Title))))
                        .like(format!("%{}%", search.to_lowercase())),
                );
            }
        }

        let page = filter.page.max(1);
        let page_size = filter.page_size.max(1);

        let paginator = query
            .order_by_asc(Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let total_pages = paginator.num_pages().await?;
        let books = paginator.fetch_page(page - 1).await?;

        Ok(PaginatedBooks {
            books: books.into_iter().map(Book::from).collect(),
            total,
            total_pages,
            page,
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let book = BookEntity::find_by_id(id).one(&self.db).await?;
        Ok(book.map(Book::from))
    }

    async fn find_detailed(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let Some(model) = BookEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let authors = model
            .find_related(crate::models::author::Entity)
            .all(&self.db)
            .await?;

        let available = copy::Entity::find()
            .filter(copy::Column::BookId.eq(id))
            .filter(copy::Column::IsActive.eq(true))
            .filter(copy::Column::Id.not_in_subquery(open_loan_copy_ids()))
            .count(&self.db)
            .await?;

        let mut book = Book::from(model);
        if !authors.is_empty() {
            book.authors = Some(
                authors
                    .into_iter()
                    .map(|a| a.full_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        book.available_copies = Some(available);

        Ok(Some(book))
    }

    async fn create(&self, input: CreateBookInput) -> Result<Book, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let txn = self.db.begin().await?;

        let new_book = ActiveModel {
            title: Set(input.title),
            publication_year: Set(input.publication_year),
            description: Set(input.description),
            cover_url: Set(input.cover_url),
            category_id: Set(input.category_id),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };

        let saved = new_book.insert(&txn).await?;

        for _ in 0..input.copies {
            let new_copy = copy::ActiveModel {
                book_id: Set(saved.id),
                isbn: Set(Some(generate_isbn())),
                publisher_name: Set(Some("Generic Publisher".to_owned())),
                shelf_location: Set(Some("Unshelved".to_owned())),
                is_active: Set(true),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            };
            new_copy.insert(&txn).await?;
        }

        for author_id in input.author_ids {
            let link = book_authors::ActiveModel {
                book_id: Set(saved.id),
                author_id: Set(author_id),
                role: Set("Writer".to_owned()),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(Book::from(saved))
    }
}
