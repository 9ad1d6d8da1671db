//! Error types for the task store.
//!
//! The HTTP adapter maps these onto response statuses in `http::error`.

use thiserror::Error;

/// Failure of a task store operation.
///
/// `NotFound` is the only variant a client can act on; everything else is a
/// storage failure and surfaces as an opaque server error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {id} not found")]
    NotFound { id: i64 },

    /// The caller abandoned the operation (deadline or shutdown) and the
    /// running statement was interrupted.
    #[error("operation canceled")]
    Canceled,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed {column} timestamp {value:?}: {source}")]
    Timestamp {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("corrupt task row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("schema migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("storage worker failed: {0}")]
    Join(String),

    #[error("storage connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True for every variant that is an underlying persistence failure.
    pub fn is_storage(&self) -> bool {
        !self.is_not_found()
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_a_storage_error() {
        let err = StoreError::NotFound { id: 7 };
        assert!(err.is_not_found());
        assert!(!err.is_storage());
        assert_eq!(err.to_string(), "task 7 not found");
    }

    #[test]
    fn timestamp_error_names_column_and_value() {
        let source = chrono::DateTime::parse_from_rfc3339("yesterday").unwrap_err();
        let err = StoreError::Timestamp {
            column: "time_of_create",
            value: "yesterday".to_string(),
            source,
        };
        assert!(err.is_storage());
        let msg = err.to_string();
        assert!(msg.contains("time_of_create"));
        assert!(msg.contains("\"yesterday\""));
    }
}
