//! # Error Types
//!
//! Top-level error type shared by the O2 IMS crates. Domain crates define
//! their own `thiserror` enums and convert into [`O2imsError`] at crate
//! boundaries.

use thiserror::Error;

/// Top-level error type for the O2 IMS operators.
#[derive(Error, Debug)]
pub enum O2imsError {
    /// Input failed validation (malformed name, timestamp, duration).
    #[error("validation error: {0}")]
    Validation(String),

    /// A persisted state value is outside the known enumeration.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category() {
        let err = O2imsError::InvalidState("Running".to_string());
        assert_eq!(err.to_string(), "invalid state: Running");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: O2imsError = io.into();
        assert!(matches!(err, O2imsError::Io(_)));
    }
}
