pub mod book;
pub mod borrowing;
pub mod member;

pub use borrowing::{Borrowing, BorrowingDetails};
