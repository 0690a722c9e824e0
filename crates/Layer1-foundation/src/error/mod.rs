//! Error types for hostbridge
//!
//! Every crate in the workspace converges on this error type at its public
//! boundary.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// hostbridge error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Transport
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // Execution
    // ========================================================================
    #[error("Execution failed: {0}")]
    Execution(String),

    // ========================================================================
    // Lifecycle
    // ========================================================================
    #[error("Service error: {0}")]
    Service(String),

    // ========================================================================
    // External conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the caller can fix the problem by changing its request or settings
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Config(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::InvalidInput("bad json".into()).is_user_facing());
        assert!(!Error::Internal("oops".into()).is_user_facing());
        assert!(Error::Config("port".into()).is_user_facing());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Error = io.into();
        assert!(err.to_string().contains("port taken"));
    }
}
