use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::api::error_response;
use crate::auth::Claims;
use crate::domain::CreateAuthorInput;
use crate::infrastructure::AppState;

pub async fn list_authors(State(state): State<AppState>) -> impl IntoResponse {
    match state.author_repo.find_all().await {
        Ok(authors) => {
            let total = authors.len();
            Json(json!({ "authors": authors, "total": total })).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_author(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.author_repo.find_by_id(id).await {
        Ok(Some(author)) => Json(json!({ "author": author })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Author not found" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_author(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateAuthorInput>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Only library staff can create authors" })),
        )
            .into_response();
    }

    match state.author_repo.create(payload).await {
        Ok(author) => (
            StatusCode::CREATED,
            Json(json!({ "author": author, "message": "Author created successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
