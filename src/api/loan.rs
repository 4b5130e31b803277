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
use crate::infrastructure::AppState;
use crate::services::loan_service::{self, CheckoutInput, LoanFilter, UpdateLoanInput};

#[derive(Deserialize)]
pub struct ListLoansQuery {
    pub user_id: Option<i32>,
    pub status: Option<String>,
}

pub async fn list_loans(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ListLoansQuery>,
) -> impl IntoResponse {
    // Regular members only ever see their own loans
    let user_id = if claims.is_staff() {
        query.user_id
    } else {
        Some(claims.user_id)
    };

    let filter = LoanFilter {
        user_id,
        status: query.status,
    };

    match loan_service::list_loans(state.db(), filter).await {
        Ok(loans) => {
            let total = loans.len();
            Json(json!({ "loans": loans, "total": total })).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_loan(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match loan_service::get_loan(state.db(), id).await {
        Ok(loan) => {
            // A member probing someone else's loan learns nothing, not
            // even that it exists
            if !claims.is_staff() && loan.user_id != claims.user_id {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Loan not found" })),
                )
                    .into_response();
            }
            Json(json!({ "loan": loan })).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/loans",
    responses(
        (status = 201, description = "Loan created from the caller's cart"),
        (status = 400, description = "Empty cart or loan limit exceeded"),
        (status = 409, description = "A staged copy was checked out concurrently")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CheckoutInput>,
) -> impl IntoResponse {
    match loan_service::checkout(state.db(), &state.carts, claims.user_id, payload).await {
        Ok(loan) => (
            StatusCode::CREATED,
            Json(json!({ "loan": loan, "message": "Loan created successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/loans/{id}",
    responses(
        (status = 200, description = "Loan updated; a transition to returned reactivates its copies"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Concurrent update conflict")
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLoanInput>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Only library staff can edit loans" })),
        )
            .into_response();
    }

    match loan_service::update_loan(state.db(), id, payload).await {
        Ok(loan) => Json(json!({ "loan": loan, "message": "Loan updated" })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn renew_loan(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    // Owners renew their own loans; staff can renew any
    match loan_service::get_loan(state.db(), id).await {
        Ok(loan) if claims.is_staff() || loan.user_id == claims.user_id => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Loan not found" })),
            )
                .into_response()
        }
        Err(e) => return error_response(e).into_response(),
    }

    match loan_service::renew_loan(state.db(), id).await {
        Ok(loan) => Json(json!({ "loan": loan, "message": "Loan renewed" })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
