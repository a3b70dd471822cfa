//! Error types for the hamclock-backend services.

use thiserror::Error;

/// Result type alias for upstream fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors produced by upstream feed fetchers.
///
/// Every fetcher reports exactly one of these; the scheduler logs the error
/// and leaves the previous artifact in place.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("failed to parse upstream response: {0}")]
    Parse(String),

    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Rate-limit responses get special treatment by the weather-grid
    /// worker (abort the cycle, resume from the cursor next tick).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::HttpStatus(429))
    }
}

/// Result type alias for request handling.
pub type BackendResult<T> = Result<T, BackendError>;

/// Primary error type for per-request failures.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BackendError {
    /// HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            BackendError::MissingParameter(_) | BackendError::InvalidParameter { .. } => 400,
            BackendError::NotFound(_) => 404,
            BackendError::Upstream(_) | BackendError::Internal(_) => 500,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal(err.to_string())
    }
}

impl From<FetchError> for BackendError {
    fn from(err: FetchError) -> Self {
        BackendError::Upstream(err.to_string())
    }
}
