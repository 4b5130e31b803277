pub mod auth;
pub mod author;
pub mod books;
pub mod cart;
pub mod copy;
pub mod health;
pub mod loan;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// Map a domain failure onto an HTTP status and JSON error body.
pub(crate) fn error_response(e: DomainError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id/copies", get(copy::get_book_copies))
        // Copies
        .route("/copies", post(copy::create_copy))
        .route("/copies/:id", get(copy::get_copy))
        // Authors
        .route(
            "/authors",
            get(author::list_authors).post(author::create_author),
        )
        .route("/authors/:id", get(author::get_author))
        // Cart
        .route("/cart", get(cart::get_cart))
        .route("/cart/add", post(cart::add_to_cart))
        .route("/cart/remove", post(cart::remove_from_cart))
        // Loans
        .route("/loans", get(loan::list_loans).post(loan::create_loan))
        .route("/loans/:id", get(loan::get_loan).put(loan::update_loan))
        .route("/loans/:id/renew", post(loan::renew_loan))
        .with_state(state)
}
