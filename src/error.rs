//! Custom error types for pubsummary.
//!
//! Every fallible library function returns `Result<T, PubSummaryError>`.
//! The controller folds these into a single user-facing message; nothing
//! below the binary uses `unwrap()`.

use thiserror::Error;

/// Main error type for pubsummary operations.
#[derive(Debug, Error)]
pub enum PubSummaryError {
    /// Missing or invalid user input, caught before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure talking to the backend
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend error: {status} - {}", backend_reason(.status, .message))]
    Backend {
        /// HTTP status code
        status: u16,
        /// Message reported by the backend
        message: String,
    },

    /// Reply was understood but yielded zero records
    #[error("No results: {0}")]
    NoResults(String),

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
}

impl PubSummaryError {
    /// Message the backend itself produced, if this error carries one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            PubSummaryError::Backend { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Backend message, or the HTTP reason phrase when the backend gave none.
fn backend_reason(status: &u16, message: &str) -> String {
    if !message.is_empty() {
        return message.to_string();
    }
    reqwest::StatusCode::from_u16(*status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unexpected response")
        .to_string()
}

/// Result type alias using `PubSummaryError`
pub type Result<T> = std::result::Result<T, PubSummaryError>;

/// Extension trait for turning selector/URL parse failures into config errors
pub trait ResultExt<T> {
    /// Map any displayable error into `PubSummaryError::Config`
    fn or_config(self, what: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn or_config(self, what: &str) -> Result<T> {
        self.map_err(|e| PubSummaryError::Config(format!("{}: {}", what, e)))
    }
}
