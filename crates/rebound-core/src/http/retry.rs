//! Bounded retry scheduling with exponential backoff
//!
//! [`run_bounded`] drives up to `max_attempts` attempts through a transport.
//! Between attempts it waits `base_delay`, then doubles the wait, capped at
//! [`MAX_BACKOFF`]. The wait is deterministic; there is no jitter.

use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use super::cancel::sleep_unless_cancelled;
use super::classify::{classify, ErrorClassification};
use super::network_errors::TransportError;
use super::options::FetchOptions;
use super::outcome::Outcome;
use super::response::Response;
use super::transport::Transport;
use crate::error::{Error, Result};

/// Upper bound for a single backoff wait
pub const MAX_BACKOFF: Duration = Duration::from_millis(5000);

/// Retry policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub base_delay: Duration,
    /// Cap for any single wait
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Per-invocation attempt bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptContext {
    /// 1-based number of the attempt in progress
    pub attempt: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Wait to apply before the next attempt
    pub current_delay: Duration,
    pub max_delay: Duration,
    /// Set when cancellation ended the run
    pub aborted_early: bool,
}

impl AttemptContext {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            max_attempts: policy.max_attempts.max(1),
            base_delay: policy.base_delay,
            current_delay: policy.base_delay.min(policy.max_delay),
            max_delay: policy.max_delay,
            aborted_early: false,
        }
    }

    pub fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Move to the next attempt, returning the wait that precedes it
    pub fn advance(&mut self) -> Duration {
        let delay = self.current_delay;
        self.attempt += 1;
        self.current_delay = self.current_delay.saturating_mul(2).min(self.max_delay);
        delay
    }

    /// Turn a classifier verdict into a decision for this context
    pub fn decide(&mut self, retry: bool) -> RetryDecision {
        if retry && self.has_remaining() {
            RetryDecision::Retry {
                delay: self.advance(),
            }
        } else {
            RetryDecision::NoRetry
        }
    }
}

/// A failed attempt, ready to become the terminal error
enum Failure {
    Response(Response),
    Transport(TransportError),
}

impl Failure {
    fn into_error(self, retryable: bool, attempts: u32) -> Error {
        match self {
            Failure::Response(response) if retryable => Error::RetryExhausted {
                attempts,
                status: Some(response.status()),
                transport: None,
                message: response.error_message(),
            },
            Failure::Response(response) => Error::Http {
                status: response.status(),
                status_text: response.status_text().to_string(),
                message: response.error_message(),
            },
            Failure::Transport(error) if retryable => Error::RetryExhausted {
                attempts,
                status: None,
                transport: Some(error.kind),
                message: error.message,
            },
            Failure::Transport(error) if error.is_network() => Error::Network {
                kind: error.kind,
                message: error.message,
            },
            Failure::Transport(error) => Error::Request {
                message: error.message,
            },
        }
    }
}

/// Run attempts until one succeeds, a failure is not retryable, the attempt
/// budget is spent, or the call is cancelled
pub async fn run_bounded<T: Transport>(
    transport: &T,
    url: &Url,
    options: &FetchOptions,
    policy: &RetryPolicy,
) -> Result<Response> {
    let mut context = AttemptContext::new(policy);

    loop {
        if options.is_cancelled() {
            context.aborted_early = true;
            debug!(attempt = context.attempt, "cancelled before attempt");
            return Err(Error::Aborted);
        }

        let attempt = context.attempt;
        debug!(attempt, max_attempts = context.max_attempts, "starting attempt");

        let outcome = transport.attempt(url, options).await;
        let retry = classify(&outcome, options);
        let classification = ErrorClassification::of(&outcome);
        let status = outcome.status();

        let failure = match outcome {
            Outcome::Success(response) => {
                debug!(attempt, status = response.status(), "attempt succeeded");
                return Ok(response);
            }
            Outcome::Aborted => {
                context.aborted_early = true;
                debug!(attempt, "attempt aborted");
                return Err(Error::Aborted);
            }
            Outcome::ServerFailure(response) => Failure::Response(response),
            Outcome::NetworkFailure(error) => Failure::Transport(error),
        };

        match context.decide(retry) {
            RetryDecision::Retry { delay } => {
                warn!(
                    attempt,
                    status = ?status,
                    %classification,
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying"
                );
                if !sleep_unless_cancelled(delay, options.cancel.as_ref()).await {
                    context.aborted_early = true;
                    debug!(attempt, "cancelled during backoff");
                    return Err(Error::Aborted);
                }
            }
            RetryDecision::NoRetry => {
                let error = failure.into_error(retry, attempt);
                if retry {
                    error!(attempts = attempt, %classification, "retries exhausted: {}", error);
                } else {
                    debug!(attempt, %classification, "not retrying: {}", error);
                }
                return Err(error);
            }
        }
    }
}
