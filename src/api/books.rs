use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::Claims;
use crate::domain::CirculationError;
use crate::infrastructure::AppState;
use crate::models::book::{BookUpdate, NewBook};
use crate::services::book_service::{self, BookFilter};

pub async fn list_books(
    State(state): State<AppState>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Value>, CirculationError> {
    let books = book_service::list_books(state.db(), filter).await?;

    Ok(Json(json!({
        "total": books.len(),
        "books": books,
    })))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, CirculationError> {
    let book = book_service::get_book(state.db(), id).await?;
    Ok(Json(json!({ "book": book })))
}

pub async fn create_book(
    State(state): State<AppState>,
    claims: Claims,
    Json(input): Json<NewBook>,
) -> Result<(StatusCode, Json<Value>), CirculationError> {
    claims.require_admin()?;

    let book = book_service::create_book(state.db(), input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book created successfully",
            "book": book
        })),
    ))
}

pub async fn delete_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<Json<Value>, CirculationError> {
    claims.require_admin()?;

    state.borrowing.delete_book(id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}

/// Edit a book. A new copy count is applied first so a refused recount
/// leaves the descriptive fields untouched.
pub async fn update_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(update): Json<BookUpdate>,
) -> Result<Json<Value>, CirculationError> {
    claims.require_admin()?;
    book_service::validate_update(&update)?;

    if let Some(total_copies) = update.total_copies {
        state.borrowing.update_book_copies(id, total_copies).await?;
    }

    let book = book_service::update_book(state.db(), id, update).await?;
    Ok(Json(json!({
        "message": "Book updated successfully",
        "book": book
    })))
}

#[derive(Deserialize)]
pub struct UpdateCopiesRequest {
    pub total_copies: i32,
}

pub async fn update_copies(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCopiesRequest>,
) -> Result<Json<Value>, CirculationError> {
    claims.require_admin()?;

    let book = state
        .borrowing
        .update_book_copies(id, payload.total_copies)
        .await?;
    Ok(Json(json!({ "book": book })))
}
