//! Cart handlers: the staging area between browsing and checkout.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::Claims;
use crate::infrastructure::AppState;
use crate::services::cart_service;

pub async fn get_cart(State(state): State<AppState>, claims: Claims) -> impl IntoResponse {
    let items = state.carts.items(claims.user_id);
    let total = items.len();
    Json(json!({ "items": items, "total": total }))
}

#[derive(Deserialize)]
pub struct CartRequest {
    pub book_id: i32,
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    responses(
        (status = 200, description = "An available copy of the book was staged"),
        (status = 400, description = "No available copy, or all copies already staged"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CartRequest>,
) -> impl IntoResponse {
    match cart_service::add_to_cart(
        state.book_repo.as_ref(),
        state.copy_repo.as_ref(),
        &state.carts,
        claims.user_id,
        payload.book_id,
    )
    .await
    {
        Ok(item) => {
            let items = state.carts.items(claims.user_id);
            Json(json!({ "added": item, "items": items })).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CartRequest>,
) -> impl IntoResponse {
    let removed = cart_service::remove_from_cart(&state.carts, claims.user_id, payload.book_id);
    let items = state.carts.items(claims.user_id);
    (
        StatusCode::OK,
        Json(json!({ "removed": removed, "items": items })),
    )
}
