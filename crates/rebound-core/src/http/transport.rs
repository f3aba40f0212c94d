//! Single-attempt transports
//!
//! A transport turns one [`FetchOptions`] into one [`Outcome`]. The plain
//! transport sends the body in one piece. The progress transport streams a
//! binary body in chunks and reports each chunk to the caller's upload sink.
//! Both resolve to the same [`Response`](super::response::Response) shape.

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;
use url::Url;

use super::body::{EncodedBody, RequestBody};
use super::cancel::{cancelled, CancelHandle};
use super::connector::{Connector, OutgoingBody, OutgoingRequest};
use super::network_errors::{TransportError, TransportErrorKind};
use super::options::FetchOptions;
use super::outcome::Outcome;
use super::progress::{ProgressEvent, SpeedEstimator};
use super::response::Headers;

pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Performs one attempt of a request
pub trait Transport: Send + Sync {
    fn attempt(&self, url: &Url, options: &FetchOptions) -> impl Future<Output = Outcome> + Send;
}

/// Which transport serves a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Plain,
    Progress,
}

impl TransportKind {
    /// Progress reporting applies only to binary forms with a sink attached
    pub fn select(options: &FetchOptions) -> Self {
        if options.body.is_binary_form() && options.on_upload_progress.is_some() {
            TransportKind::Progress
        } else {
            TransportKind::Plain
        }
    }
}

/// Sends the whole body at once
#[derive(Debug)]
pub struct PlainTransport<'c, C> {
    connector: &'c C,
}

impl<'c, C: Connector> PlainTransport<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> Transport for PlainTransport<'_, C> {
    async fn attempt(&self, url: &Url, options: &FetchOptions) -> Outcome {
        if options.is_cancelled() {
            return Outcome::Aborted;
        }

        let (headers, encoded) = match prepare(options) {
            Ok(prepared) => prepared,
            Err(error) => return Outcome::NetworkFailure(error),
        };

        let body = if options.body.is_empty() {
            OutgoingBody::Empty
        } else {
            OutgoingBody::Full(encoded.bytes)
        };

        let request = OutgoingRequest {
            method: options.method.clone(),
            url: url.clone(),
            headers,
            body,
        };

        exchange(self.connector, request, options.cancel.as_ref()).await
    }
}

/// Streams the body in chunks, reporting progress after each one
#[derive(Debug)]
pub struct ProgressTransport<'c, C> {
    connector: &'c C,
    chunk_size: usize,
}

impl<'c, C: Connector> ProgressTransport<'c, C> {
    pub fn new(connector: &'c C) -> Self {
        Self {
            connector,
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl<C: Connector> Transport for ProgressTransport<'_, C> {
    async fn attempt(&self, url: &Url, options: &FetchOptions) -> Outcome {
        if options.is_cancelled() {
            return Outcome::Aborted;
        }

        let (headers, encoded) = match prepare(options) {
            Ok(prepared) => prepared,
            Err(error) => return Outcome::NetworkFailure(error),
        };

        let total = encoded.bytes.len() as u64;
        let chunks = split(&encoded.bytes, self.chunk_size);

        // Set once the attempt resolves so a connector that keeps polling
        // the body cannot produce late events. Emission holds the lock.
        let closed = Arc::new(Mutex::new(false));
        let gate = Arc::clone(&closed);
        let sink = options.on_upload_progress.clone();
        let cancel = options.cancel.clone();

        let started = Instant::now();
        let mut estimator = SpeedEstimator::new();
        estimator.record(0, 0);
        let mut sent = 0u64;

        let body = stream::iter(chunks).map(move |chunk| {
            if cancel.as_ref().is_some_and(CancelHandle::is_cancelled) {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "upload cancelled"));
            }

            sent += chunk.len() as u64;
            let closed = gate.lock().unwrap_or_else(PoisonError::into_inner);
            if !*closed {
                let now_ms = started.elapsed().as_millis() as u64;
                let speed = estimator.record(sent, now_ms);
                if let Some(sink) = &sink {
                    sink(&ProgressEvent::new(sent, total, speed));
                }
            }
            Ok(chunk)
        });

        let request = OutgoingRequest {
            method: options.method.clone(),
            url: url.clone(),
            headers,
            body: OutgoingBody::Streamed {
                length: total,
                chunks: Box::pin(body),
            },
        };

        let outcome = exchange(self.connector, request, options.cancel.as_ref()).await;
        *closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        outcome
    }
}

/// The transport chosen for one orchestrated call
#[derive(Debug)]
pub enum SelectedTransport<'c, C> {
    Plain(PlainTransport<'c, C>),
    Progress(ProgressTransport<'c, C>),
}

impl<'c, C: Connector> SelectedTransport<'c, C> {
    pub fn select(connector: &'c C, options: &FetchOptions, chunk_size: usize) -> Self {
        match TransportKind::select(options) {
            TransportKind::Plain => SelectedTransport::Plain(PlainTransport::new(connector)),
            TransportKind::Progress => SelectedTransport::Progress(
                ProgressTransport::new(connector).with_chunk_size(chunk_size),
            ),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            SelectedTransport::Plain(_) => TransportKind::Plain,
            SelectedTransport::Progress(_) => TransportKind::Progress,
        }
    }
}

impl<C: Connector> Transport for SelectedTransport<'_, C> {
    async fn attempt(&self, url: &Url, options: &FetchOptions) -> Outcome {
        match self {
            SelectedTransport::Plain(transport) => transport.attempt(url, options).await,
            SelectedTransport::Progress(transport) => transport.attempt(url, options).await,
        }
    }
}

/// Encode the body and settle the headers that go with it
fn prepare(options: &FetchOptions) -> Result<(Headers, EncodedBody), TransportError> {
    let encoded = options
        .body
        .encode()
        .map_err(|e| TransportError::new(TransportErrorKind::Request, e.to_string()))?;

    let mut headers = options.headers.clone();
    // The boundary is ours; a caller-supplied multipart content type would not match it
    if matches!(options.body, RequestBody::Multipart(_)) {
        headers.remove("content-type");
    }
    if let Some(content_type) = &encoded.content_type {
        if !headers.contains("content-type") {
            headers.append("Content-Type", content_type.as_str());
        }
    }

    Ok((headers, encoded))
}

fn split(bytes: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    (0..bytes.len())
        .step_by(chunk_size)
        .map(|start| bytes.slice(start..(start + chunk_size).min(bytes.len())))
        .collect()
}

/// Run the exchange, abandoning it if the call is cancelled first
async fn exchange<C: Connector>(
    connector: &C,
    request: OutgoingRequest,
    cancel: Option<&CancelHandle>,
) -> Outcome {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => Outcome::Aborted,
        result = connector.execute(request) => match result {
            // The body stream stops itself on cancellation, which the connector sees as an error
            Err(_) if cancel.is_some_and(CancelHandle::is_cancelled) => Outcome::Aborted,
            result => Outcome::from(result),
        },
    }
}
