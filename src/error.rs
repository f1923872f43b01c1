//! Error types for SIL consultation
//!
//! This module defines the error taxonomy shared by the API client, the
//! capture pipeline, the session state machine and the chat controller,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for SIL operations
///
/// The API client only classifies and returns these; recovery (fallback
/// analysis, canned chat replies) happens in the capture pipeline and the
/// chat controller.
#[derive(Error, Debug)]
pub enum SilError {
    /// Bad local input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level failure (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Client-side deadline expired and the request was aborted
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Backend answered with a non-2xx status
    #[error("API Error {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body text, verbatim
        body: String,
    },

    /// Stream could not be opened or broke mid-way
    #[error("Stream error: {0}")]
    Stream(String),

    /// Backend answered 2xx with a body that does not match the contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An event that the current wizard step does not accept
    #[error("Invalid transition: {action} is not allowed in step {step}")]
    InvalidTransition {
        /// Step the session was in
        step: String,
        /// Rejected action
        action: String,
    },

    /// A chat reply is still pending
    #[error("A reply is already in progress")]
    Busy,

    /// Camera or image processing failure
    #[error("Capture error: {0}")]
    Capture(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl SilError {
    /// Map a transport failure to [`SilError::Network`]
    ///
    /// reqwest's own timeouts land here too; [`SilError::Timeout`] is only
    /// raised by the analysis deadline.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        SilError::Network(err.to_string())
    }

    /// Returns true for [`SilError::Timeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, SilError::Timeout(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SilError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Look up the typed error inside an `anyhow::Error`
///
/// # Examples
///
/// ```
/// use sil_consult::error::{classify, SilError};
///
/// let err: anyhow::Error = SilError::Busy.into();
/// assert!(matches!(classify(&err), Some(SilError::Busy)));
/// ```
pub fn classify(err: &anyhow::Error) -> Option<&SilError> {
    err.downcast_ref::<SilError>()
}

/// Result type alias for SIL operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
