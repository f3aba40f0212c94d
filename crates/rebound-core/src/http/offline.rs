//! Re-running a request whose peer could not be reached
//!
//! When the bounded scheduler gives up because no response could be obtained,
//! the whole bounded flow is re-run after a fixed interval. With
//! `retry_indefinitely` this continues until some response arrives (of any
//! status) or the call is cancelled. Otherwise there is exactly one re-run.

use std::time::Duration;
use tracing::info;
use url::Url;

use super::cancel::sleep_unless_cancelled;
use super::options::FetchOptions;
use super::response::Response;
use super::retry::{run_bounded, RetryPolicy};
use super::transport::Transport;
use crate::error::{Error, Result};

/// Wait between re-runs of the bounded flow
pub const OFFLINE_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflinePolicy {
    pub retry_indefinitely: bool,
    pub interval: Duration,
}

impl Default for OfflinePolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OfflinePolicy {
    pub fn new(retry_indefinitely: bool) -> Self {
        Self {
            retry_indefinitely,
            interval: OFFLINE_RETRY_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Re-run the bounded flow after a network failure.
///
/// Call this only once [`run_bounded`] has already failed with an error for
/// which [`Error::is_network_failure`] holds; the first thing it does is wait.
pub async fn run_offline<T: Transport>(
    transport: &T,
    url: &Url,
    options: &FetchOptions,
    policy: &RetryPolicy,
    offline: &OfflinePolicy,
) -> Result<Response> {
    let mut rerun = 0u32;

    loop {
        rerun += 1;
        info!(
            rerun,
            interval_ms = offline.interval.as_millis() as u64,
            "peer unreachable, re-running request after interval"
        );

        if !sleep_unless_cancelled(offline.interval, options.cancel.as_ref()).await {
            return Err(Error::Aborted);
        }

        match run_bounded(transport, url, options, policy).await {
            Err(error) if error.is_network_failure() && offline.retry_indefinitely => continue,
            result => return result,
        }
    }
}
