//! Connector-level timeouts
//!
//! These bound a single exchange inside [`ReqwestConnector`](super::connector::ReqwestConnector).
//! An exchange that runs past them surfaces as a `Timeout` transport failure and
//! is therefore handled like any other network failure. There is no timeout at
//! the orchestrator level; callers bound a whole call with
//! [`CancelHandle::cancel_after`](super::cancel::CancelHandle::cancel_after).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout configuration for the production connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to establish a connection, in seconds
    pub connect_timeout_secs: u64,
    /// Total time allowed for one exchange, in seconds. `None` means unbounded,
    /// which suits long uploads.
    pub request_timeout_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: None,
        }
    }
}

impl TimeoutConfig {
    /// Durations are stored in whole seconds, rounded up
    pub fn new(connect_timeout: Duration, request_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout_secs: whole_secs(connect_timeout),
            request_timeout_secs: request_timeout.map(whole_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Override the per-exchange timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = Some(whole_secs(timeout));
        self
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout_secs == 0 {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if let Some(request_timeout) = self.request_timeout_secs {
            if request_timeout == 0 {
                return Err("Request timeout cannot be zero".to_string());
            }
            if request_timeout < self.connect_timeout_secs {
                return Err("Request timeout should be >= connect timeout".to_string());
            }
        }

        Ok(())
    }
}

fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
