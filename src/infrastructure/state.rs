//! Application state containing services and shared resources

use sea_orm::DatabaseConnection;

use crate::infrastructure::config::Config;
use crate::services::BorrowingService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection for catalogue and member queries
    db: DatabaseConnection,
    /// Copy counts and borrowing transitions
    pub borrowing: BorrowingService,
}

impl AppState {
    /// Create a new AppState with default circulation settings
    pub fn new(db: DatabaseConnection) -> Self {
        let borrowing = BorrowingService::new(db.clone());
        Self { db, borrowing }
    }

    pub fn from_config(db: DatabaseConnection, config: &Config) -> Self {
        let borrowing = BorrowingService::from_config(db.clone(), config);
        Self { db, borrowing }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
