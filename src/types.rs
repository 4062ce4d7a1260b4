//! Error types for portal

use thiserror::Error;

use crate::endpoint::ServiceKind;

/// Result type for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Fatal failure to build the client factory.
///
/// Cloneable so a failed construction can be stored and handed to every
/// later caller without resolving endpoints again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to initialize content client factory: {reason}")]
pub struct InitializationError {
    pub reason: String,
}

impl InitializationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Portal error types
#[derive(Error, Debug)]
pub enum PortalError {
    /// Content endpoint could not be resolved; the factory is unusable
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Optional backend service was not resolved at startup
    #[error("Feature unavailable: no {0} endpoint was resolved")]
    FeatureUnavailable(ServiceKind),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Discovery service failure
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Token acquisition failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Backend accepted the query but reported errors
    #[error("Query error: {0}")]
    Query(String),

    /// Header name or value not representable on an outgoing request
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Inbound query string could not be parsed
    #[error("Invalid query string: {0}")]
    InvalidQuery(#[from] serde_urlencoded::de::Error),

    /// Content provider failed to populate a list
    #[error("List population failed for '{list_id}': {reason}")]
    Population { list_id: String, reason: String },
}

impl PortalError {
    /// Whether this error leaves the access layer permanently unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, PortalError::Initialization(_))
    }
}
