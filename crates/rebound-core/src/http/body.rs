//! Request body shapes and their wire encoding

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;
use std::path::Path;

use crate::error::Result;

/// What a request carries
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    /// Raw bytes, treated as a binary form
    Binary(Bytes),
    /// `multipart/form-data`
    Multipart(MultipartForm),
}

/// A body encoded for the wire, plus the content type it implies
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl RequestBody {
    /// Binary forms are the only bodies eligible for upload progress
    pub fn is_binary_form(&self) -> bool {
        matches!(self, RequestBody::Binary(_) | RequestBody::Multipart(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub fn encode(&self) -> Result<EncodedBody> {
        let encoded = match self {
            RequestBody::Empty => EncodedBody {
                bytes: Bytes::new(),
                content_type: None,
            },
            RequestBody::Text(text) => EncodedBody {
                bytes: Bytes::copy_from_slice(text.as_bytes()),
                content_type: Some("text/plain;charset=UTF-8".to_string()),
            },
            RequestBody::Json(value) => EncodedBody {
                bytes: Bytes::from(serde_json::to_vec(value)?),
                content_type: Some("application/json".to_string()),
            },
            RequestBody::Binary(bytes) => EncodedBody {
                bytes: bytes.clone(),
                content_type: None,
            },
            RequestBody::Multipart(form) => EncodedBody {
                bytes: form.encode(),
                content_type: Some(form.content_type()),
            },
        };
        Ok(encoded)
    }
}

/// One field of a multipart form
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A `multipart/form-data` body with a fixed boundary
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("rebound-{}", uuid::Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    /// Add a plain text field
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.with_part(Part {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value),
        })
    }

    /// Add an in-memory file field
    pub fn bytes(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.with_part(Part {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some("application/octet-stream".to_string()),
            data: data.into(),
        })
    }

    /// Add a file field read from disk
    pub fn file(self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(self.bytes(name, filename, data))
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        for part in &self.parts {
            out.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_field(&part.name)
            );
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape_field(filename)));
            }
            out.put_slice(disposition.as_bytes());
            out.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.put_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            out.put_slice(b"\r\n");
            out.put_slice(&part.data);
            out.put_slice(b"\r\n");
        }
        out.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out.freeze()
    }
}

fn escape_field(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_forms() {
        assert!(RequestBody::Binary(Bytes::from_static(b"x")).is_binary_form());
        assert!(RequestBody::Multipart(MultipartForm::new()).is_binary_form());
        assert!(!RequestBody::Text("x".into()).is_binary_form());
        assert!(!RequestBody::Json(serde_json::json!({})).is_binary_form());
        assert!(!RequestBody::Empty.is_binary_form());
    }

    #[test]
    fn test_encoded_content_types() {
        let json = RequestBody::Json(serde_json::json!({"a": 1})).encode().unwrap();
        assert_eq!(json.content_type.as_deref(), Some("application/json"));
        assert_eq!(&json.bytes[..], br#"{"a":1}"#);

        let text = RequestBody::Text("hi".into()).encode().unwrap();
        assert_eq!(text.content_type.as_deref(), Some("text/plain;charset=UTF-8"));

        let raw = RequestBody::Binary(Bytes::from_static(b"\x00\x01")).encode().unwrap();
        assert_eq!(raw.content_type, None);
        assert_eq!(raw.bytes.len(), 2);
    }

    #[test]
    fn test_multipart_layout() {
        let form = MultipartForm::new()
            .text("title", "report")
            .bytes("upload", "a\"b.txt", Bytes::from_static(b"payload"));
        let boundary = form.boundary().to_string();
        let body = String::from_utf8(form.encode().to_vec()).unwrap();

        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.contains("Content-Disposition: form-data; name=\"title\"\r\n\r\nreport\r\n"));
        assert!(body.contains("filename=\"a%22b.txt\""));
        assert!(body.contains("Content-Type: application/octet-stream\r\n\r\npayload\r\n"));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={}", boundary)
        );
    }

    #[test]
    fn test_distinct_boundaries() {
        assert_ne!(MultipartForm::new().boundary(), MultipartForm::new().boundary());
    }
}
