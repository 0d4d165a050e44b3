use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::auth::Claims;
use crate::domain::CirculationError;
use crate::infrastructure::AppState;

/// Borrow a copy for the caller. A missing or invalid token reaches the
/// service as an absent member and fails as unauthenticated.
pub async fn borrow_book(
    State(state): State<AppState>,
    claims: Option<Claims>,
    Path(book_id): Path<i32>,
) -> Result<(StatusCode, Json<Value>), CirculationError> {
    let member_id = claims.as_ref().map(Claims::member_id);
    let borrowing = state.borrowing.borrow(book_id, member_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book borrowed successfully",
            "borrowing": borrowing
        })),
    ))
}

pub async fn borrowed_by_me(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> Result<Json<Value>, CirculationError> {
    let borrowed = state
        .borrowing
        .is_borrowed_by(book_id, claims.member_id())
        .await?;
    Ok(Json(json!({ "book_id": book_id, "borrowed": borrowed })))
}

/// Return a borrowing. Members may only return their own.
pub async fn return_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(borrowing_id): Path<i32>,
) -> Result<Json<Value>, CirculationError> {
    let existing = state.borrowing.find_borrowing(borrowing_id).await?;
    if existing.member_id != claims.member_id() && !claims.is_admin() {
        return Err(CirculationError::Forbidden);
    }

    let borrowing = state.borrowing.return_book(borrowing_id).await?;
    Ok(Json(json!({
        "message": "Book returned successfully",
        "borrowing": borrowing
    })))
}

pub async fn list_overdue(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, CirculationError> {
    claims.require_admin()?;

    let overdue = state
        .borrowing
        .overdue_borrowings(chrono::Utc::now())
        .await?;
    Ok(Json(json!({ "total": overdue.len(), "borrowings": overdue })))
}
