//! Request orchestration
//!
//! [`Fetcher`] is the entry point. One call validates the URL, registers with
//! the tracker, picks a transport, runs the bounded retry scheduler, hands
//! network failures to the offline scheduler, and always concludes the
//! tracker entry before returning.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::http::connector::{Connector, ReqwestConnector};
use crate::http::offline::{run_offline, OfflinePolicy};
use crate::http::options::FetchOptions;
use crate::http::response::Response;
use crate::http::retry::{run_bounded, RetryPolicy};
use crate::http::transport::SelectedTransport;
use crate::tracker::RequestTracker;

/// Resilient HTTP client
pub struct Fetcher<C = ReqwestConnector> {
    connector: C,
    tracker: Option<Arc<dyn RequestTracker>>,
    config: FetchConfig,
}

impl Default for Fetcher<ReqwestConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher<ReqwestConnector> {
    pub fn new() -> Self {
        Self::with_connector(ReqwestConnector::new())
    }

    /// Build a fetcher whose connector honours the configured timeouts
    pub fn from_config(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let connector = ReqwestConnector::from_config(&config.timeouts)?;
        Ok(Self::with_connector(connector).with_config(config))
    }
}

impl<C: Connector> Fetcher<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            tracker: None,
            config: FetchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn RequestTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Perform a call with the configured attempt budget, base delay and
    /// offline behaviour
    pub async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Response> {
        self.fetch_with(
            url,
            options,
            self.config.max_attempts,
            self.config.base_delay(),
            self.config.offline_retry,
        )
        .await
    }

    /// Perform a call with explicit retry parameters
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn fetch_with(
        &self,
        url: &str,
        options: FetchOptions,
        max_attempts: u32,
        base_delay: Duration,
        offline_retry: bool,
    ) -> Result<Response> {
        let target = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let id = Uuid::new_v4().to_string();
        let class = options.request_class();
        debug!(request_id = %id, %class, "request started");

        if let Some(tracker) = &self.tracker {
            tracker.record_start(&id, class);
        }

        let policy = RetryPolicy {
            max_attempts,
            base_delay,
            ..self.config.retry_policy()
        };
        let offline = OfflinePolicy {
            retry_indefinitely: offline_retry,
            ..self.config.offline_policy()
        };

        let result = self.orchestrate(&target, &options, &policy, &offline).await;

        if let Some(tracker) = &self.tracker {
            tracker.record_end(&id, class);
        }

        match &result {
            Ok(response) => info!(request_id = %id, status = response.status(), "request completed"),
            Err(Error::Aborted) => info!(request_id = %id, "request aborted"),
            Err(error) => warn!(request_id = %id, "request failed: {}", error),
        }

        result
    }

    async fn orchestrate(
        &self,
        url: &Url,
        options: &FetchOptions,
        policy: &RetryPolicy,
        offline: &OfflinePolicy,
    ) -> Result<Response> {
        let transport =
            SelectedTransport::select(&self.connector, options, self.config.upload_chunk_size);
        debug!(transport = ?transport.kind(), "transport selected");

        match run_bounded(&transport, url, options, policy).await {
            Err(error) if error.is_network_failure() => {
                run_offline(&transport, url, options, policy, offline).await
            }
            result => result,
        }
    }
}
