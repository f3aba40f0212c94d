//! Error types for the Rebound core library
//!
//! Every way an orchestrated call can end unsuccessfully is a variant of
//! [`Error`]. Nothing here is fatal to the process; all failures are returned
//! to the caller as values.

use thiserror::Error;

use crate::http::network_errors::TransportErrorKind;

/// Main error type for Rebound operations
#[derive(Error, Debug)]
pub enum Error {
    /// A response was received but it was unsuccessful and not retried
    /// (any 4xx, any 5xx other than 503, or an explicit `retryable: false`)
    #[error("HTTP {status} {status_text}: {message}")]
    Http {
        status: u16,
        status_text: String,
        message: String,
    },

    /// The classifier kept asking for retries but every attempt was used
    #[error("Retries exhausted after {attempts} attempts: {message}")]
    RetryExhausted {
        attempts: u32,
        /// Status of the last response, if the last attempt received one
        status: Option<u16>,
        /// Transport failure kind of the last attempt, if it received no response
        transport: Option<TransportErrorKind>,
        message: String,
    },

    /// No response could be obtained from the peer
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: TransportErrorKind,
        message: String,
    },

    /// The request failed without a status for a reason that is not a
    /// network failure (it could not be built, encoded, or redirected)
    #[error("Request error: {message}")]
    Request { message: String },

    /// The call was cancelled through its cancel handle
    #[error("Request aborted")]
    Aborted,

    /// A response body could not be decoded as JSON
    #[error("Decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The target URL could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON serialization errors while encoding a request body
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without an underlying source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` when the call ended because it was cancelled
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// HTTP status of the response that ended the call, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::RetryExhausted { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` when the call ended without any response because the
    /// peer could not be reached. Only these failures are handed to the
    /// network-failure retry scheduler.
    pub fn is_network_failure(&self) -> bool {
        match self {
            Error::Network { kind, .. } => kind.is_network(),
            Error::RetryExhausted {
                status: None,
                transport: Some(kind),
                ..
            } => kind.is_network(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
