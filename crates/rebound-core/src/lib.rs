//! Rebound Core - resilient HTTP request orchestration
//!
//! Rebound wraps a single HTTP call in retry and recovery logic:
//!
//! - **Classification**: only `503` is retried by default; callers may force
//!   the verdict either way with `retryable`
//! - **Bounded retry**: up to `max_attempts` attempts, waiting a doubling
//!   delay (capped at 5 s) between them
//! - **Offline recovery**: when no response could be obtained at all, the
//!   bounded flow is re-run every 2 s, once or until the peer answers
//! - **Upload progress**: binary bodies can be streamed in chunks with
//!   per-chunk progress and throughput events
//! - **Cancellation**: a [`CancelHandle`] aborts in-flight attempts and waits
//!
//! # Example
//!
//! ```no_run
//! use rebound_core::{FetchOptions, Fetcher, Result};
//!
//! async fn example() -> Result<()> {
//!     let fetcher = Fetcher::new();
//!     let response = fetcher
//!         .fetch("https://example.com/items", FetchOptions::default())
//!         .await?;
//!     let items: serde_json::Value = response.json()?;
//!     println!("{}", items);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod tracker;

pub use client::Fetcher;
pub use config::FetchConfig;
pub use error::{Error, Result};
pub use http::{
    CancelHandle, Connector, FetchOptions, Headers, MultipartForm, ProgressEvent, RequestBody,
    ReqwestConnector, Response, TransportError, TransportErrorKind,
};
pub use tracker::{PendingRequests, RequestClass, RequestTracker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
