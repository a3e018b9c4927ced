use thiserror::Error;

/// Application-wide error types for Gleaner.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request did not complete within the fetch timeout or job deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The connection to the target host could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    /// The server answered with a status other than 200.
    #[error("HTTP {status_code}")]
    HttpStatus { status_code: u16 },

    /// Any other transport-level failure (invalid URL, body read, TLS, ...).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The caller cancelled the operation before the fetch completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Returns true for failures of the fetch stage.
    ///
    /// Transport failures are terminal for a single attempt and are recorded
    /// as a failed extraction result instead of being raised.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_)
                | AppError::ConnectionFailure(_)
                | AppError::HttpStatus { .. }
                | AppError::HttpError(_)
                | AppError::Cancelled
        )
    }

    /// The HTTP status observed before the failure, if a response arrived.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::HttpStatus { status_code } => Some(*status_code),
            _ => None,
        }
    }
}
