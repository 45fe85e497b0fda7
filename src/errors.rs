//! Error types for the widget service
//!
//! Every failure an invocation can hit is a `WidgetError`. Each variant
//! knows its HTTP status, so the single dispatch point can always turn a
//! failure into a well-formed envelope.

use http::StatusCode;
use thiserror::Error;

/// Main error type for widget operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// POST or DELETE without a widget name in the path
    #[error("Widget name missing")]
    MissingIdentifier,

    /// Anything besides GET, POST and DELETE
    #[error("We only accept GET, POST, and DELETE, not {0}")]
    UnsupportedMethod(String),

    /// Malformed request payload (e.g. undecodable base64 body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Metadata lookup on a widget that does not exist
    #[error("Widget not found: {name}")]
    NotFound { name: String },

    /// Object store call failed (permissions, network, throttling)
    #[error("Storage operation failed: {0}")]
    Upstream(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WidgetError {
    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            WidgetError::MissingIdentifier
            | WidgetError::UnsupportedMethod(_)
            | WidgetError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WidgetError::NotFound { .. } => StatusCode::NOT_FOUND,
            WidgetError::Upstream(_) | WidgetError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client errors are logged at `warn`, everything else at `error`
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        WidgetError::Internal(format!("Serialization failed: {}", err))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WidgetError>;
