//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use crate::models::book::Book;

/// Filter criteria for book listing
#[derive(Debug, Clone)]
pub struct BookFilter {
    /// Case-insensitive substring match on the title
    pub search: Option<String>,
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

impl Default for BookFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: 30,
        }
    }
}

/// Paginated result with total count
#[derive(Debug)]
pub struct PaginatedBooks {
    pub books: Vec<Book>,
    pub total: u64,
    /// Ceiling of total / page_size
    pub total_pages: u64,
    pub page: u64,
}

/// Input for creating a book with its initial copies and author links
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateBookInput {
    pub title: String,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub category_id: Option<i32>,
    /// Number of physical copies to register, active and on the shelf
    #[serde(default)]
    pub copies: u32,
    /// Authors linked with role "Writer"
    #[serde(default)]
    pub author_ids: Vec<i32>,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// List books matching the filter, paginated
    async fn find_all(&self, filter: BookFilter) -> Result<PaginatedBooks, DomainError>;

    /// Find a single book by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Find a book with author names and available-copy count filled in
    async fn find_detailed(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Create a book plus its copies and author associations
    async fn create(&self, input: CreateBookInput) -> Result<Book, DomainError>;
}

/// Copy data for API responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct Copy {
    pub id: i32,
    pub book_id: i32,
    pub isbn: Option<String>,
    pub publisher_name: Option<String>,
    pub shelf_location: Option<String>,
    pub is_active: bool,
    pub book_title: Option<String>,
}

/// Input for registering an additional copy of a book
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateCopyInput {
    pub book_id: i32,
    pub isbn: Option<String>,
    pub publisher_name: Option<String>,
    pub shelf_location: Option<String>,
}

/// Repository trait for Copy entity
#[async_trait]
pub trait CopyRepository: Send + Sync {
    /// Find a copy by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Copy>, DomainError>;

    /// All copies of a book
    async fn find_by_book_id(&self, book_id: i32) -> Result<Vec<Copy>, DomainError>;

    /// Copies of a book that are active and not out on an open loan
    async fn list_available(&self, book_id: i32) -> Result<Vec<Copy>, DomainError>;

    /// Count of available copies of a book
    async fn count_available(&self, book_id: i32) -> Result<u64, DomainError>;

    /// Register a new copy, active by default
    async fn create(&self, input: CreateCopyInput) -> Result<Copy, DomainError>;
}

/// Author data for API responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct Author {
    pub id: i32,
    pub full_name: String,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

/// Input for creating an author
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateAuthorInput {
    pub full_name: String,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find all authors
    async fn find_all(&self) -> Result<Vec<Author>, DomainError>;

    /// Find an author by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, DomainError>;

    /// Create a new author
    async fn create(&self, input: CreateAuthorInput) -> Result<Author, DomainError>;
}
