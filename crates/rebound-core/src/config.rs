//! Orchestrator configuration
//!
//! [`FetchConfig`] carries the defaults [`Fetcher::fetch`](crate::Fetcher::fetch)
//! applies to every call. It deserializes from a partial document; missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::http::offline::{OfflinePolicy, OFFLINE_RETRY_INTERVAL};
use crate::http::retry::{RetryPolicy, MAX_BACKOFF};
use crate::http::timeout::TimeoutConfig;
use crate::http::transport::DEFAULT_UPLOAD_CHUNK_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Keep re-running unreachable requests until they get a response
    pub offline_retry: bool,
    pub offline_interval_ms: u64,
    pub upload_chunk_size: usize,
    pub timeouts: TimeoutConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 200,
            max_delay_ms: MAX_BACKOFF.as_millis() as u64,
            offline_retry: true,
            offline_interval_ms: OFFLINE_RETRY_INTERVAL.as_millis() as u64,
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn offline_interval(&self) -> Duration {
        Duration::from_millis(self.offline_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_base_delay(self.base_delay())
            .with_max_delay(self.max_delay())
    }

    pub fn offline_policy(&self) -> OfflinePolicy {
        OfflinePolicy::new(self.offline_retry).with_interval(self.offline_interval())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::configuration("max_attempts must be at least 1"));
        }
        if self.max_delay_ms > MAX_BACKOFF.as_millis() as u64 {
            return Err(Error::configuration(format!(
                "max_delay_ms cannot exceed {}",
                MAX_BACKOFF.as_millis()
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(Error::configuration(
                "base_delay_ms cannot exceed max_delay_ms",
            ));
        }
        if self.offline_interval_ms == 0 {
            return Err(Error::configuration("offline_interval_ms cannot be zero"));
        }
        if self.upload_chunk_size == 0 {
            return Err(Error::configuration("upload_chunk_size cannot be zero"));
        }
        self.timeouts.validate().map_err(Error::configuration)
    }
}
