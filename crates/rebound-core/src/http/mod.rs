//! Attempt-level HTTP machinery
//!
//! This module provides:
//! - Retryability classification of attempt outcomes
//! - Plain and upload-progress transports over a pluggable connector
//! - Bounded retry with capped exponential backoff
//! - Interval re-runs for requests whose peer was unreachable
//! - Cooperative cancellation

pub mod body;
pub mod cancel;
pub mod classify;
pub mod connector;
pub mod network_errors;
pub mod offline;
pub mod options;
pub mod outcome;
pub mod progress;
pub mod response;
pub mod retry;
pub mod timeout;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use body::{MultipartForm, Part, RequestBody};
pub use cancel::CancelHandle;
pub use classify::{classify, should_retry, ErrorClassification};
pub use connector::{Connector, OutgoingBody, OutgoingRequest, ReqwestConnector};
pub use network_errors::{TransportError, TransportErrorKind};
pub use offline::{run_offline, OfflinePolicy, OFFLINE_RETRY_INTERVAL};
pub use options::{FetchOptions, ProgressSink};
pub use outcome::Outcome;
pub use progress::{ProgressEvent, SpeedEstimator, SpeedSample, SPEED_WINDOW};
pub use response::{Headers, Response};
pub use retry::{run_bounded, AttemptContext, RetryDecision, RetryPolicy, MAX_BACKOFF};
pub use timeout::TimeoutConfig;
pub use transport::{
    PlainTransport, ProgressTransport, SelectedTransport, Transport, TransportKind,
    DEFAULT_UPLOAD_CHUNK_SIZE,
};
