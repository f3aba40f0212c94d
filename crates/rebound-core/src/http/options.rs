//! Transport-neutral request descriptor

use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::body::{MultipartForm, RequestBody};
use super::cancel::CancelHandle;
use super::progress::ProgressEvent;
use super::response::Headers;
use crate::error::Result;
use crate::tracker::RequestClass;

/// Receives upload progress events, synchronously, on the uploading task
pub type ProgressSink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Everything needed to perform one orchestrated call
#[derive(Clone)]
pub struct FetchOptions {
    pub method: String,
    pub headers: Headers,
    pub body: RequestBody,
    /// Forces the retry verdict for every failed attempt when set
    pub retryable: Option<bool>,
    /// Track the call as a read even when the method is not GET
    pub read: bool,
    pub cancel: Option<CancelHandle>,
    pub on_upload_progress: Option<ProgressSink>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Headers::new(),
            body: RequestBody::Empty,
            retryable: None,
            read: false,
            cancel: None,
            on_upload_progress: None,
        }
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("retryable", &self.retryable)
            .field("read", &self.read)
            .field("cancel", &self.cancel.is_some())
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .finish()
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_body(RequestBody::Text(text.into()))
    }

    /// Serialize `value` as the JSON body
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self> {
        Ok(self.with_body(RequestBody::Json(serde_json::to_value(value)?)))
    }

    pub fn with_multipart(self, form: MultipartForm) -> Self {
        self.with_body(RequestBody::Multipart(form))
    }

    pub fn with_bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.with_body(RequestBody::Binary(bytes.into()))
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn on_upload_progress<F>(mut self, sink: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.on_upload_progress = Some(Arc::new(sink));
        self
    }

    /// GET requests and calls flagged `read` are reads; everything else writes
    pub fn request_class(&self) -> RequestClass {
        if self.read || self.method.eq_ignore_ascii_case("GET") {
            RequestClass::Read
        } else {
            RequestClass::Write
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.method, "GET");
        assert!(options.body.is_empty());
        assert_eq!(options.retryable, None);
        assert_eq!(options.request_class(), RequestClass::Read);
    }

    #[test]
    fn test_request_class() {
        let post = FetchOptions::new().with_method("POST");
        assert_eq!(post.request_class(), RequestClass::Write);
        assert_eq!(post.with_read(true).request_class(), RequestClass::Read);
        assert_eq!(
            FetchOptions::new().with_method("get").request_class(),
            RequestClass::Read
        );
    }

    #[test]
    fn test_json_body() {
        let options = FetchOptions::new()
            .with_json(&serde_json::json!({"id": 7}))
            .unwrap();
        assert!(matches!(options.body, RequestBody::Json(_)));
    }

    #[test]
    fn test_cancel_flag() {
        let cancel = CancelHandle::new();
        let options = FetchOptions::new().with_cancel(cancel.clone());
        assert!(!options.is_cancelled());
        cancel.cancel();
        assert!(options.is_cancelled());
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let options = FetchOptions::new().on_upload_progress(|_| {});
        let rendered = format!("{:?}", options);
        assert!(rendered.contains("on_upload_progress: true"));
    }
}
