use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::Claims;
use crate::domain::{BookFilter, CreateBookInput};
use crate::infrastructure::AppState;

#[derive(Deserialize)]
pub struct ListBooksQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Paginated book list, optionally filtered by title substring")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> impl IntoResponse {
    let filter = BookFilter {
        search: query.search,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(30),
    };

    match state.book_repo.find_all(filter).await {
        Ok(result) => Json(json!({
            "books": result.books,
            "total": result.total,
            "page": result.page,
            "total_pages": result.total_pages,
        }))
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    responses(
        (status = 200, description = "Book details with authors and available-copy count"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.book_repo.find_detailed(id).await {
        Ok(Some(book)) => Json(json!({ "book": book })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Book created with its copies and author links"),
        (status = 403, description = "Caller is not library staff")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateBookInput>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Only library staff can create books" })),
        )
            .into_response();
    }

    match state.book_repo.create(payload).await {
        Ok(book) => (
            StatusCode::CREATED,
            Json(json!({ "book": book, "message": "Book created successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
