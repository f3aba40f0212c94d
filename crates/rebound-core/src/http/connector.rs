//! The raw request/response seam under both transports
//!
//! A [`Connector`] performs exactly one HTTP exchange. It knows nothing about
//! retries, progress or cancellation; the transports layer those on top.

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::CONTENT_LENGTH;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use url::Url;

use super::network_errors::{TransportError, TransportErrorKind};
use super::response::{Headers, Response};
use super::timeout::TimeoutConfig;
use crate::error::{Error, Result};

pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + Sync + 'a>>;

/// Body as handed to the connector
pub enum OutgoingBody {
    Empty,
    Full(Bytes),
    /// A body of known length produced chunk by chunk
    Streamed {
        length: u64,
        chunks: BoxStream<'static, std::result::Result<Bytes, io::Error>>,
    },
}

impl std::fmt::Debug for OutgoingBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutgoingBody::Empty => f.write_str("Empty"),
            OutgoingBody::Full(bytes) => write!(f, "Full({} bytes)", bytes.len()),
            OutgoingBody::Streamed { length, .. } => write!(f, "Streamed({} bytes)", length),
        }
    }
}

#[derive(Debug)]
pub struct OutgoingRequest {
    pub method: String,
    pub url: Url,
    pub headers: Headers,
    pub body: OutgoingBody,
}

/// Performs a single HTTP exchange
pub trait Connector: Send + Sync {
    fn execute(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = std::result::Result<Response, TransportError>> + Send;
}

impl<C: Connector> Connector for Arc<C> {
    fn execute(
        &self,
        request: OutgoingRequest,
    ) -> impl Future<Output = std::result::Result<Response, TransportError>> + Send {
        (**self).execute(request)
    }
}

/// Production connector backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestConnector {
    client: reqwest::Client,
}

impl Default for ReqwestConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build a client with the given connect and request timeouts
    pub fn from_config(config: &TimeoutConfig) -> Result<Self> {
        config.validate().map_err(Error::configuration)?;

        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| Error::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(anyhow::Error::new(e)),
        })?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for ReqwestConnector {
    async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<Response, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Request,
                format!("invalid method '{}': {}", request.method, e),
            )
        })?;

        let mut builder = self.client.request(method, request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        builder = match request.body {
            OutgoingBody::Empty => builder,
            OutgoingBody::Full(bytes) => builder.body(bytes),
            OutgoingBody::Streamed { length, chunks } => builder
                .header(CONTENT_LENGTH, length)
                .body(reqwest::Body::wrap_stream(chunks)),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status();
        let headers = Headers::from(response.headers());
        // The status line arrived, but a body cut short still means no usable response
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        Ok(Response::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            headers,
            body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_invalid_timeouts() {
        let config = TimeoutConfig {
            connect_timeout_secs: 0,
            request_timeout_secs: None,
        };
        let err = ReqwestConnector::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_from_default_config() {
        assert!(ReqwestConnector::from_config(&TimeoutConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_method_is_request_error() {
        let connector = ReqwestConnector::new();
        let request = OutgoingRequest {
            method: "BAD METHOD".to_string(),
            url: Url::parse("http://127.0.0.1:1/").unwrap(),
            headers: Headers::new(),
            body: OutgoingBody::Empty,
        };
        let err = connector.execute(request).await.unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Request);
    }
}
