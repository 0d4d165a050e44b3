//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! Every failure mode of the circulation workflow has its own variant so that
//! callers can tell them apart.

use std::fmt;

/// Kind of record a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Book,
    Borrowing,
    Member,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Book => write!(f, "Book"),
            Resource::Borrowing => write!(f, "Borrowing"),
            Resource::Member => write!(f, "Member"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CirculationError {
    /// No authenticated member behind the request
    Unauthenticated,
    /// Authenticated, but not allowed to perform the operation
    Forbidden,
    /// Book, borrowing or member does not exist
    NotFound(Resource),
    /// No copy left to lend
    Unavailable,
    /// The member already holds this book
    AlreadyBorrowed,
    /// Transition not allowed from the record's current state
    InvalidState(String),
    /// Operation blocked by other records (active borrowings, concurrent edits)
    Conflict(String),
    /// Rejected input
    Validation(String),
    /// Underlying data-store failure
    Store(String),
}

impl CirculationError {
    /// Stable machine-readable identifier for API clients
    pub fn code(&self) -> &'static str {
        match self {
            CirculationError::Unauthenticated => "unauthenticated",
            CirculationError::Forbidden => "forbidden",
            CirculationError::NotFound(_) => "not_found",
            CirculationError::Unavailable => "unavailable",
            CirculationError::AlreadyBorrowed => "already_borrowed",
            CirculationError::InvalidState(_) => "invalid_state",
            CirculationError::Conflict(_) => "conflict",
            CirculationError::Validation(_) => "validation",
            CirculationError::Store(_) => "store_error",
        }
    }
}

impl fmt::Display for CirculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CirculationError::Unauthenticated => write!(f, "Authentication required"),
            CirculationError::Forbidden => write!(f, "Operation not permitted"),
            CirculationError::NotFound(resource) => write!(f, "{} not found", resource),
            CirculationError::Unavailable => {
                write!(f, "This book is currently not available for borrowing")
            }
            CirculationError::AlreadyBorrowed => {
                write!(f, "This book is already borrowed by the member")
            }
            CirculationError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            CirculationError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            CirculationError::Validation(msg) => write!(f, "Validation error: {}", msg),
            CirculationError::Store(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for CirculationError {}

// Conversion from SeaORM errors (used in the service layer)
impl From<sea_orm::DbErr> for CirculationError {
    fn from(e: sea_orm::DbErr) -> Self {
        CirculationError::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_resource() {
        let err = CirculationError::NotFound(Resource::Borrowing);
        assert_eq!(err.to_string(), "Borrowing not found");
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn db_errors_become_store_errors() {
        let err: CirculationError = sea_orm::DbErr::Custom("disk full".to_string()).into();
        assert_eq!(err.code(), "store_error");
        assert!(err.to_string().contains("disk full"));
    }
}
