//! Custom error types for rustacademic.
//!
//! All fallible library functions return `Result<T, AcademicError>` instead of
//! using `unwrap()`. Binaries wrap these in `anyhow` at the edges.

use crate::models::Platform;
use thiserror::Error;

/// Main error type for rustacademic operations.
#[derive(Debug, Error)]
pub enum AcademicError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML or JSON payload did not have the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external service
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External service returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message from the service
        message: String,
    },

    /// The platform answered with an anti-automation challenge page
    #[error("{platform} returned an anti-automation challenge ({marker})")]
    Challenge {
        /// Platform that served the challenge
        platform: Platform,
        /// Marker text that identified the page
        marker: String,
    },

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Spreadsheet generation failure
    #[error("Export error: {0}")]
    Export(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AcademicError {
    /// Whether this error came from a challenge page rather than a real failure.
    pub fn is_challenge(&self) -> bool {
        matches!(self, AcademicError::Challenge { .. })
    }
}

/// Result type alias using `AcademicError`
pub type Result<T> = std::result::Result<T, AcademicError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AcademicError::Parse(msg.to_string()))
    }
}
