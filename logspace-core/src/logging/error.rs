//! Error types for the logging subsystem

use thiserror::Error;

/// Errors that can occur while setting up logging
#[derive(Debug, Clone, Error)]
pub enum LoggingError {
    /// The global subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// The provided configuration was rejected
    #[error("Invalid logging configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LoggingError::InitializationFailed("already set".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: already set");
    }

    #[test]
    fn test_is_error_trait() {
        let err = LoggingError::InvalidConfiguration("bad".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
