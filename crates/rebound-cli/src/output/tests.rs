// Tests for response and status output
//
// A shared buffer stands in for stdout so the rendered text can be inspected.

use super::*;
use bytes_buffer::SharedBuffer;
use rebound_core::Headers;

mod bytes_buffer {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

fn json_response(status: u16, body: &'static str) -> Response {
    let mut headers = Headers::new();
    headers.append("Content-Type", "application/json");
    headers.append("X-Request-Id", "abc");
    Response::from_status(status, headers, body.as_bytes().to_vec().into())
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, Box::new(buffer.clone()));
    (writer, buffer)
}

#[test]
fn test_human_response_with_headers() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output
        .response(&json_response(200, r#"{"id":1}"#), true)
        .unwrap();

    let text = buffer.contents();
    assert!(text.starts_with("HTTP 200 OK\n"));
    assert!(text.contains("X-Request-Id: abc\n"));
    assert!(text.contains("\"id\": 1"));
}

#[test]
fn test_quiet_prints_only_body() {
    let (mut output, buffer) = writer(OutputFormat::Human, true);
    output
        .response(&json_response(503, r#"{"id":1}"#), false)
        .unwrap();

    let text = buffer.contents();
    assert!(!text.contains("HTTP 503"));
    assert!(text.contains("\"id\": 1"));
}

#[test]
fn test_json_summary() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output
        .response(&json_response(201, r#"{"id":9}"#), false)
        .unwrap();

    let value: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
    assert_eq!(value["status"], 201);
    assert_eq!(value["ok"], true);
    assert_eq!(value["body"]["id"], 9);
    assert_eq!(value["headers"]["x-request-id"], "abc");
}

#[test]
fn test_text_body_in_summary() {
    let response = Response::from_status(200, Headers::new(), "plain words".as_bytes().to_vec().into());
    let summary = ResponseSummary::from_response(&response);
    assert_eq!(summary.body, Value::String("plain words".to_string()));
}

#[test]
fn test_messages_suppressed_for_machine_formats() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output.info("hello").unwrap();
    output.success("done").unwrap();
    assert!(buffer.contents().is_empty());
}

#[test]
fn test_apply_progress_resets_on_retry() {
    let bar = ProgressBar::hidden();
    apply_progress(&bar, &ProgressEvent::new(300, 400, 10.0));
    assert_eq!(bar.position(), 300);

    apply_progress(&bar, &ProgressEvent::new(100, 400, 10.0));
    assert_eq!(bar.position(), 100);
    assert_eq!(bar.length(), Some(400));
}

#[test]
fn test_apply_progress_reports_speed() {
    let bar = ProgressBar::hidden();
    apply_progress(&bar, &ProgressEvent::new(2048, 4096, 2048.7));
    assert_eq!(bar.message(), format!("{}/s", HumanBytes(2048)));
    assert!(bar.message().ends_with("/s"));
}
