//! Copy API handlers using the repository pattern

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::api::error_response;
use crate::auth::Claims;
use crate::domain::CreateCopyInput;
use crate::infrastructure::AppState;

/// All copies of a book, plus how many of them are currently available.
pub async fn get_book_copies(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> impl IntoResponse {
    let copies = match state.copy_repo.find_by_book_id(book_id).await {
        Ok(copies) => copies,
        Err(e) => return error_response(e).into_response(),
    };

    match state.copy_repo.count_available(book_id).await {
        Ok(available) => Json(json!({
            "copies": copies,
            "total": copies.len(),
            "available": available,
        }))
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_copy(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.copy_repo.find_by_id(id).await {
        Ok(Some(copy)) => Json(json!({ "copy": copy })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Copy not found" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_copy(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateCopyInput>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Only library staff can register copies" })),
        )
            .into_response();
    }

    match state.copy_repo.create(payload).await {
        Ok(copy) => (
            StatusCode::CREATED,
            Json(json!({ "copy": copy, "message": "Copy registered successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
