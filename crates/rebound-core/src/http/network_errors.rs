//! Classification of failures where no HTTP response was obtained
//!
//! A statusless failure is not automatically a network failure. Each one is
//! tagged with a [`TransportErrorKind`] so the orchestrator can tell "the peer
//! could not be reached" apart from "the request itself was unusable".

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Why a single exchange produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// TCP/TLS connection could not be established
    Connect,
    /// The exchange did not finish within the connector's timeout
    Timeout,
    /// Host name resolution failed
    Dns,
    /// The connection was reset or closed mid-exchange
    Reset,
    /// The body stream failed while sending or receiving
    Body,
    /// The request could not be built, encoded, or followed through redirects
    Request,
}

impl TransportErrorKind {
    /// Whether this failure means the peer was unreachable
    pub fn is_network(&self) -> bool {
        !matches!(self, TransportErrorKind::Request)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Dns => write!(f, "dns"),
            TransportErrorKind::Reset => write!(f, "reset"),
            TransportErrorKind::Body => write!(f, "body"),
            TransportErrorKind::Request => write!(f, "request"),
        }
    }
}

/// A single exchange failed before any status line was received
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} failure: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Map a reqwest error onto a transport failure kind
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_builder() || error.is_redirect() {
            TransportErrorKind::Request
        } else if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            if mentions_dns(error) {
                TransportErrorKind::Dns
            } else {
                TransportErrorKind::Connect
            }
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else if error.is_request() || io_source(error).is_some() {
            // hyper reports a dropped connection as a request error
            TransportErrorKind::Reset
        } else {
            TransportErrorKind::Request
        };

        Self::new(kind, error.to_string())
    }

    /// Whether this failure means the peer was unreachable
    pub fn is_network(&self) -> bool {
        self.kind.is_network()
    }
}

fn io_source<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a io::Error> {
    let mut source = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        source = err.source();
    }
    None
}

fn mentions_dns(error: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if text.contains("dns") || text.contains("failed to lookup address") {
            return true;
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_kinds() {
        assert!(TransportErrorKind::Connect.is_network());
        assert!(TransportErrorKind::Timeout.is_network());
        assert!(TransportErrorKind::Dns.is_network());
        assert!(TransportErrorKind::Reset.is_network());
        assert!(TransportErrorKind::Body.is_network());
        assert!(!TransportErrorKind::Request.is_network());
    }

    #[test]
    fn test_display() {
        let err = TransportError::new(TransportErrorKind::Dns, "no such host");
        assert_eq!(err.to_string(), "dns failure: no such host");
    }

    #[tokio::test]
    #[cfg_attr(not(feature = "flaky"), ignore)]
    async fn test_connection_refused_is_network() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = reqwest::Client::new();
        let error = client
            .get(format!("http://127.0.0.1:{}/", port))
            .send()
            .await
            .unwrap_err();

        let mapped = TransportError::from_reqwest(&error);
        assert!(mapped.is_network(), "unexpected kind {:?}", mapped.kind);
    }

    #[tokio::test]
    async fn test_invalid_header_is_request_error() {
        let client = reqwest::Client::new();
        let error = client
            .get("http://127.0.0.1:1/")
            .header("bad header", "x")
            .send()
            .await
            .unwrap_err();

        let mapped = TransportError::from_reqwest(&error);
        assert_eq!(mapped.kind, TransportErrorKind::Request);
    }
}
