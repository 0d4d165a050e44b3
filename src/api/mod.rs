pub mod books;
pub mod borrowings;
pub mod error;
pub mod health;
pub mod members;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalogue
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/:id/copies", put(books::update_copies))
        // Circulation
        .route("/books/:id/borrow", post(borrowings::borrow_book))
        .route("/books/:id/borrowed", get(borrowings::borrowed_by_me))
        .route("/borrowings/overdue", get(borrowings::list_overdue))
        .route("/borrowings/:id/return", put(borrowings::return_book))
        // Members
        .route(
            "/members/me",
            get(members::get_me)
                .post(members::register)
                .put(members::update_me),
        )
        .route("/members/me/borrowings", get(members::current_borrowings))
        .route("/members/me/history", get(members::history))
        .route("/members/me/stats", get(members::stats))
        .with_state(state)
}
