//! Error types for parley

use thiserror::Error;

/// The main error type for parley operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Relay call errors, carrying the text shown to the user
    #[error("{0}")]
    Relay(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A specialized Result type for parley operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_displays_bare_text() {
        let err = Error::Relay("Internal server error".to_string());
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
