//! Retryability classification
//!
//! [`should_retry`] is the single rule that decides whether a failed attempt
//! is tried again. [`ErrorClassification`] is a coarser label used for logging
//! and for choosing the terminal error; it never changes a retry verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::options::FetchOptions;
use super::outcome::Outcome;

/// The status that means "try again shortly"
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Decide whether an attempt should be retried.
///
/// An explicit override always wins. Without one, only 503 is retried; 2xx
/// never is, and neither is a missing status.
pub fn should_retry(status: Option<u16>, retryable: Option<bool>) -> bool {
    if let Some(verdict) = retryable {
        return verdict;
    }

    match status {
        Some(200..=299) => false,
        Some(SERVICE_UNAVAILABLE) => true,
        _ => false,
    }
}

/// Apply [`should_retry`] to an attempt outcome using the caller's override
pub fn classify(outcome: &Outcome, options: &FetchOptions) -> bool {
    match outcome {
        Outcome::Success(_) | Outcome::Aborted => false,
        _ => should_retry(outcome.status(), options.retryable),
    }
}

/// Coarse label for an attempt outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClassification {
    Success,
    /// 4xx
    ClientError,
    /// 5xx other than 503, or any other non-2xx status
    ServerError,
    /// 503
    ServiceUnavailable,
    /// No response because the peer was unreachable
    NetworkError,
    /// No response because the request itself was unusable
    RequestError,
    Aborted,
}

impl ErrorClassification {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => ErrorClassification::Success,
            SERVICE_UNAVAILABLE => ErrorClassification::ServiceUnavailable,
            400..=499 => ErrorClassification::ClientError,
            _ => ErrorClassification::ServerError,
        }
    }

    pub fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(_) => ErrorClassification::Success,
            Outcome::ServerFailure(response) => Self::from_status(response.status()),
            Outcome::NetworkFailure(error) if error.is_network() => {
                ErrorClassification::NetworkError
            }
            Outcome::NetworkFailure(_) => ErrorClassification::RequestError,
            Outcome::Aborted => ErrorClassification::Aborted,
        }
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClassification::Success => "success",
            ErrorClassification::ClientError => "client error",
            ErrorClassification::ServerError => "server error",
            ErrorClassification::ServiceUnavailable => "service unavailable",
            ErrorClassification::NetworkError => "network error",
            ErrorClassification::RequestError => "request error",
            ErrorClassification::Aborted => "aborted",
        };
        f.write_str(label)
    }
}
