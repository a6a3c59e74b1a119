/// Core error types for Tonearm
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Tonearm
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store is disabled or unreachable
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Write rejected because the store is full
    #[error("Store quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catalog lookup failed (transient)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::not_found("Track", "abc");
        assert_eq!(err.to_string(), "Track not found: abc");
    }

    #[test]
    fn quota_message() {
        let err = CoreError::QuotaExceeded {
            needed: 10,
            available: 4,
        };
        assert!(err.to_string().contains("10 bytes needed"));
    }
}
