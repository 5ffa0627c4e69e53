//! Error types for the knowledge base.

use thiserror::Error;

/// Result type alias using KbError.
pub type Result<T> = std::result::Result<T, KbError>;

/// Errors that can occur in the knowledge base.
#[derive(Error, Debug)]
pub enum KbError {
    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl KbError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KbError::config("bad corpus root");
        assert!(err.to_string().contains("bad corpus root"));
        let err = KbError::database("locked");
        assert!(matches!(err, KbError::Database { .. }));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KbError = io.into();
        assert!(matches!(err, KbError::Io(_)));
    }
}
