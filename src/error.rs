//! Error types for DeskSync.

use thiserror::Error;

/// Infrastructure error type for DeskSync.
///
/// Engine-level decisions use [`crate::auth::AuthError`]; this type covers
/// storage, configuration and I/O failures underneath it.
#[derive(Error, Debug)]
pub enum DeskSyncError {
    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// A uniqueness constraint was violated on insert or update.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for configuration or stored data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound delivery failed.
    #[error("delivery error: {0}")]
    Delivery(String),
}

impl From<sqlx::Error> for DeskSyncError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return DeskSyncError::Conflict(db_err.message().to_string());
            }
        }
        DeskSyncError::Database(e.to_string())
    }
}

/// Result type alias for DeskSync operations.
pub type Result<T> = std::result::Result<T, DeskSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = DeskSyncError::Validation("port out of range".to_string());
        assert_eq!(err.to_string(), "validation error: port out of range");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = DeskSyncError::NotFound("account".to_string());
        assert_eq!(err.to_string(), "account not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = DeskSyncError::Conflict("UNIQUE constraint failed: accounts.email".to_string());
        assert!(err.to_string().starts_with("conflict:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DeskSyncError = io_err.into();
        assert!(matches!(err, DeskSyncError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: DeskSyncError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DeskSyncError::Database(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(DeskSyncError::Config("missing secret".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
