//! Service layer - business logic without the HTTP layer
//!
//! Handlers in `api` stay thin and delegate here.

pub mod book_service;
pub mod borrowing_service;
pub mod member_service;

pub use borrowing_service::BorrowingService;
