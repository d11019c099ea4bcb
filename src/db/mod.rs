//! Database module providing connection management and queries.

pub mod waste_records;

use sea_orm::{Database, DatabaseConnection};

use crate::error::{AppError, AppResult};

/// Database connection handle shared across request handlers.
///
/// Created once at service start and injected into the components that need
/// the record store; SeaORM pools connections internally.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let conn = Database::connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Get access to the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}
