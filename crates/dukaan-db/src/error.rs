//! # Database Error Types
//!
//! Error types for database operations and the ledger engine surface.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerError = CoreError | DbError ← What the ledger engine returns    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller maps to its own surface (HTTP status, retry, ...)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Busy/locked conditions are split out as [`DbError::Unavailable`] so
//! callers can retry them; everything else is terminal for the request.

use thiserror::Error;

use dukaan_core::CoreError;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and caller feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - An UPDATE/DELETE affected zero rows for a known-shape query
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second product with the same (name, color, variant)
    /// - Second buyer with the same phone
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a category or transaction id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// The schema backstops the ledger invariants (`available >= 0`,
    /// non-negative amounts, positive quantities); reaching this means a
    /// write slipped past application-level guards.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Malformed request that reached the repository layer (e.g. an update
    /// with no fields set). User-correctable.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The store is temporarily unavailable (locked/busy/pool timeout).
    /// Retryable.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DbError::InvalidInput {
            message: message.into(),
        }
    }

    /// True for transient conditions a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Unavailable(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::Unavailable
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraints in the message text:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                //   "database is locked" / "database table is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::Unavailable(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::Unavailable("connection pool timed out".to_string())
            }

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// LedgerError
// =============================================================================

/// The error surface of the ledger engine.
///
/// Business rule violations (insufficient stock, invalid drafts) come from
/// dukaan-core; store-level failures come from [`DbError`]. Callers match
/// on the variant to decide between 4xx, retry, and 5xx handling.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl LedgerError {
    /// Creates an InsufficientStock error.
    pub fn insufficient_stock(name: impl Into<String>, available: i64, requested: i64) -> Self {
        LedgerError::Core(CoreError::insufficient_stock(name, available, requested))
    }

    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::Db(DbError::not_found(entity, id))
    }

    /// True for transient store conditions a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Db(db) if db.is_retryable())
    }
}

// sqlx errors inside the engine flow through DbError categorization first.
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Db(DbError::from(err))
    }
}

/// Result type for ledger engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Buyer", "b-123");
        assert_eq!(err.to_string(), "Buyer not found: b-123");
    }

    #[test]
    fn test_retryable() {
        assert!(DbError::Unavailable("database is locked".to_string()).is_retryable());
        assert!(!DbError::not_found("Buyer", "b-123").is_retryable());

        let ledger_err = LedgerError::Db(DbError::Unavailable("busy".to_string()));
        assert!(ledger_err.is_retryable());
        assert!(!LedgerError::insufficient_stock("Cable", 1, 2).is_retryable());
    }

    #[test]
    fn test_pool_timeout_maps_to_unavailable() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Unavailable(_)));
    }
}
