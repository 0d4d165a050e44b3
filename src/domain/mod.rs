//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no Axum, no queries).
//! Only circulation rules and domain error types.

pub mod circulation;
pub mod errors;

pub use self::circulation::{BorrowingStatus, CopyReductionPolicy};
pub use errors::{CirculationError, Resource};
