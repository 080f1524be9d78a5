//! Errors from the durable alert history
//!
//! A unique violation on `alert_id` is its own variant: the drain cycle
//! treats it as "already persisted", never as a failure.

use std::fmt;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    /// Could not open or reach the database
    ConnectionFailed(String),

    QueryFailed(String),

    MigrationFailed(String),

    /// A row with this alert id already exists
    DuplicateKey(String),

    /// A stored column could not be turned back into its domain type
    Decode { column: &'static str, reason: String },

    IoError(std::io::Error),
}

impl StorageError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::DuplicateKey(_))
    }

    pub fn decode(column: &'static str, reason: impl fmt::Display) -> Self {
        StorageError::Decode {
            column,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed(msg) => {
                write!(f, "alert history unreachable: {}", msg)
            }
            StorageError::QueryFailed(msg) => write!(f, "alert history query failed: {}", msg),
            StorageError::MigrationFailed(msg) => {
                write!(f, "alert history migration failed: {}", msg)
            }
            StorageError::DuplicateKey(msg) => write!(f, "alert already persisted: {}", msg),
            StorageError::Decode { column, reason } => {
                write!(f, "cannot decode column {}: {}", column, reason)
            }
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::DuplicateKey(db.message().to_string())
            }
            sqlx::Error::Io(io_err) => StorageError::IoError(io_err),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StorageError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::ColumnDecode { index, source } => StorageError::Decode {
                column: "unknown",
                reason: format!("{index}: {source}"),
            },
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StorageError::MigrationFailed(err.to_string())
    }
}
