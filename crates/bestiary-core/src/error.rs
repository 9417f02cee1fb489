//! Error types for bestiary-core
//!
//! Store, cache and facade share one error type. Every variant carries owned
//! data so the error is `Clone`: de-duplicated cache waiters all receive the
//! same failure.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result alias used across the core
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for bestiary operations
///
/// "Not found" is not an error: lookups by id return `Option::None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    // ===================
    // Store Errors
    // ===================
    /// Unique or foreign-key constraint breached on create/update
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// Connectivity, locking or I/O failure talking to the store
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Malformed statement or undecodable row
    #[error("Query failed: {message}")]
    Query { message: String },

    // ===================
    // Caller Errors
    // ===================
    /// Caller-supplied arguments rejected by the transport layer
    #[error("Invalid argument: {message}")]
    Validation { message: String },

    // ===================
    // Cache Errors
    // ===================
    /// A cache key resolved to a value of another type
    #[error("Cached value for {key} has an unexpected type")]
    CacheTypeMismatch { key: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns true for failures a caller may reasonably retry
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::StoreUnavailable { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::ConstraintViolation { message },
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly,
            ) => StoreError::StoreUnavailable { message },
            _ => StoreError::Query { message },
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Query {
            message: format!("JSON processing failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_breach_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();

        let err: StoreError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, StoreError::ConstraintViolation { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_bad_sql_maps_to_query() {
        let conn = Connection::open_in_memory().unwrap();

        let err: StoreError = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[test]
    fn test_unavailable_is_transient() {
        let err = StoreError::unavailable("connection refused");
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
    }
}
