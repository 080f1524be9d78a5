//! Error types for shared store operations

use std::fmt;

/// Result type alias for shared store operations
pub type SpaceResult<T> = Result<T, SpaceError>;

/// Errors that can occur while talking to the shared store
#[derive(Debug)]
pub enum SpaceError {
    /// The store could not be reached or rejected the call. `MemoryStore`
    /// never returns this; networked implementations report outages with it.
    Unavailable(String),

    /// A single store call exceeded its time budget
    Timeout { op: &'static str, key: String },

    /// The key holds a different data structure than the operation expects
    WrongType(String),

    /// A value could not be encoded for the store
    Serialization(String),
}

impl SpaceError {
    /// Outages and timeouts are worth retrying on the next request or tick
    pub fn is_retryable(&self) -> bool {
        matches!(self, SpaceError::Unavailable(_) | SpaceError::Timeout { .. })
    }
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceError::Unavailable(msg) => write!(f, "shared store unavailable: {}", msg),
            SpaceError::Timeout { op, key } => {
                write!(f, "shared store operation {} on {} timed out", op, key)
            }
            SpaceError::WrongType(key) => {
                write!(f, "key {} holds the wrong kind of value", key)
            }
            SpaceError::Serialization(msg) => write!(f, "space serialization error: {}", msg),
        }
    }
}

impl std::error::Error for SpaceError {}

impl From<serde_json::Error> for SpaceError {
    fn from(err: serde_json::Error) -> Self {
        SpaceError::Serialization(err.to_string())
    }
}
