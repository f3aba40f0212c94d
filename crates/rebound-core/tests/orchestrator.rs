//! End-to-end orchestration tests over a scripted connector
//!
//! The tokio clock is paused, so backoff and offline waits complete instantly
//! while `Instant` still reports the virtual time that passed.


use rebound_core::{
    CancelHandle, Error, FetchConfig, FetchOptions, Fetcher, PendingRequests, RequestClass, RequestTracker,
    TransportErrorKind,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_support::{ScriptedConnector, Step};
use tokio::time::Instant;

const URL: &str = "http://api.test/items";

fn fetcher(steps: Vec<Step>) -> Fetcher<ScriptedConnector> {
    Fetcher::with_connector(ScriptedConnector::new(steps))
}

/// Tracker that remembers every call it receives
#[derive(Default)]
struct RecordingTracker {
    events: Mutex<Vec<(&'static str, String, RequestClass)>>,
}

impl RecordingTracker {
    fn events(&self) -> Vec<(&'static str, String, RequestClass)> {
        self.events.lock().unwrap().clone()
    }
}

impl RequestTracker for RecordingTracker {
    fn record_start(&self, id: &str, class: RequestClass) {
        self.events.lock().unwrap().push(("start", id.to_string(), class));
    }

    fn record_end(&self, id: &str, class: RequestClass) {
        self.events.lock().unwrap().push(("end", id.to_string(), class));
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let fetcher = fetcher(vec![Step::Json(200, r#"{"id": 7}"#)]);

    let response = fetcher.fetch(URL, FetchOptions::default()).await.unwrap();

    assert!(response.ok());
    assert_eq!(response.status(), 200);
    assert_eq!(response.status_text(), "OK");
    assert_eq!(response.headers().get("content-type"), Some("application/json"));
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["id"], 7);
    assert_eq!(fetcher.connector().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_exhausts_with_doubling_waits() {
    let fetcher = fetcher(vec![Step::Status(503)]);

    let err = fetcher
        .fetch_with(URL, FetchOptions::default(), 3, Duration::from_millis(200), true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RetryExhausted {
            attempts: 3,
            status: Some(503),
            ..
        }
    ));
    // A status-bearing failure never reaches the offline scheduler
    assert!(!err.is_network_failure());

    let times = fetcher.connector().call_times();
    assert_eq!(times.len(), 3);
    let first_wait = times[1] - times[0];
    let second_wait = times[2] - times[1];
    assert!(first_wait >= Duration::from_millis(200) && first_wait < Duration::from_millis(250));
    assert!(second_wait >= Duration::from_millis(400) && second_wait < Duration::from_millis(450));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_then_recovers() {
    let fetcher = fetcher(vec![Step::Status(503), Step::Status(503), Step::Status(201)]);

    let response = fetcher.fetch(URL, FetchOptions::default()).await.unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(fetcher.connector().calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_surfaces_immediately() {
    let fetcher = fetcher(vec![Step::Json(422, r#"{"message": "title is required"}"#)]);

    let err = fetcher
        .fetch(URL, FetchOptions::new().with_method("POST").with_text("x"))
        .await
        .unwrap_err();

    match err {
        Error::Http {
            status,
            status_text,
            message,
        } => {
            assert_eq!(status, 422);
            assert_eq!(status_text, "Unprocessable Entity");
            assert_eq!(message, "title is required");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
    assert_eq!(fetcher.connector().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_other_server_errors_not_retried() {
    for status in [500u16, 502, 504] {
        let fetcher = fetcher(vec![Step::Status(status)]);
        let err = fetcher.fetch(URL, FetchOptions::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert_eq!(fetcher.connector().calls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_forced_retry_of_client_error() {
    let fetcher = fetcher(vec![Step::Status(409)]);

    let err = fetcher
        .fetch_with(
            URL,
            FetchOptions::default().with_retryable(true),
            4,
            Duration::from_millis(10),
            true,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetryExhausted { attempts: 4, status: Some(409), .. }));
    assert_eq!(fetcher.connector().calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_offline_retries_until_reachable() {
    let fetcher = fetcher(vec![
        Step::Offline,
        Step::Offline,
        Step::Offline,
        Step::Status(200),
    ]);
    let start = Instant::now();

    let response = fetcher.fetch(URL, FetchOptions::default()).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(fetcher.connector().calls(), 4);
    // Three offline intervals of 2 s each
    assert!(start.elapsed() >= Duration::from_millis(6000));
}

#[tokio::test(start_paused = true)]
async fn test_call_overrides_keep_configured_cap_and_interval() {
    let fetcher = fetcher(vec![Step::Offline]).with_config(FetchConfig {
        max_delay_ms: 300,
        offline_interval_ms: 700,
        ..Default::default()
    });

    let err = fetcher
        .fetch_with(
            URL,
            FetchOptions::new().with_retryable(true),
            3,
            Duration::from_millis(200),
            false,
        )
        .await
        .unwrap_err();
    assert!(err.is_network_failure());

    let times = fetcher.connector().call_times();
    assert_eq!(times.len(), 6);
    let waits: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    // Backoff doubles from the per-call base but stops at the configured cap
    assert!(waits[0] >= Duration::from_millis(200) && waits[0] < Duration::from_millis(250));
    assert!(waits[1] >= Duration::from_millis(300) && waits[1] < Duration::from_millis(350));
    // The re-run waits the configured offline interval
    assert!(waits[2] >= Duration::from_millis(700) && waits[2] < Duration::from_millis(750));
    assert!(waits[4] >= Duration::from_millis(300) && waits[4] < Duration::from_millis(350));
}

#[tokio::test(start_paused = true)]
async fn test_offline_single_rerun_when_disabled() {
    let fetcher = fetcher(vec![Step::Offline]);

    let err = fetcher
        .fetch_with(URL, FetchOptions::default(), 5, Duration::from_millis(200), false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network { kind: TransportErrorKind::Connect, .. }));
    assert_eq!(fetcher.connector().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_forced_retry_of_network_failure_runs_twice_bounded() {
    let fetcher = fetcher(vec![Step::Offline]);

    let err = fetcher
        .fetch_with(
            URL,
            FetchOptions::default().with_retryable(true),
            3,
            Duration::from_millis(100),
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RetryExhausted {
            attempts: 3,
            status: None,
            transport: Some(TransportErrorKind::Connect),
            ..
        }
    ));
    // One bounded run, then exactly one re-run of it
    assert_eq!(fetcher.connector().calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_request_failure_skips_offline_scheduler() {
    let fetcher = fetcher(vec![Step::Fail(TransportErrorKind::Request)]);

    let err = fetcher.fetch(URL, FetchOptions::default()).await.unwrap_err();

    assert!(matches!(err, Error::Request { .. }));
    assert_eq!(fetcher.connector().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let fetcher = fetcher(vec![Step::Status(503)]);
    let cancel = CancelHandle::new();
    let _deadline = cancel.cancel_after(Duration::from_millis(300));
    let start = Instant::now();

    let err = fetcher
        .fetch_with(
            URL,
            FetchOptions::default().with_cancel(cancel),
            5,
            Duration::from_millis(1000),
            true,
        )
        .await
        .unwrap_err();

    assert!(err.is_abort());
    assert_eq!(fetcher.connector().calls(), 1);
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_in_flight_attempt() {
    let fetcher = fetcher(vec![Step::Hang]);
    let cancel = CancelHandle::new();
    let _deadline = cancel.cancel_after(Duration::from_secs(3));

    let err = fetcher
        .fetch(URL, FetchOptions::default().with_cancel(cancel))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Aborted));
    assert_eq!(fetcher.connector().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_start_makes_no_attempt() {
    let fetcher = fetcher(vec![Step::Status(200)]);
    let cancel = CancelHandle::new();
    cancel.cancel();

    let err = fetcher
        .fetch(URL, FetchOptions::default().with_cancel(cancel))
        .await
        .unwrap_err();

    assert!(err.is_abort());
    assert_eq!(fetcher.connector().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_url_skips_tracker() {
    let tracker = Arc::new(RecordingTracker::default());
    let fetcher = fetcher(vec![Step::Status(200)]).with_tracker(tracker.clone());

    let err = fetcher
        .fetch("::not a url::", FetchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidUrl { .. }));
    assert!(tracker.events().is_empty());
    assert_eq!(fetcher.connector().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tracker_sees_start_and_end() {
    let tracker = Arc::new(RecordingTracker::default());
    let fetcher = fetcher(vec![Step::Status(404)]).with_tracker(tracker.clone());

    let _ = fetcher
        .fetch(URL, FetchOptions::new().with_method("DELETE"))
        .await;
    let _ = fetcher
        .fetch(URL, FetchOptions::new().with_method("POST").with_read(true))
        .await;

    let events = tracker.events();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0].0, "start");
    assert_eq!(events[1].0, "end");
    assert_eq!(events[0].1, events[1].1);
    assert_eq!(events[0].2, RequestClass::Write);
    assert_eq!(events[2].2, RequestClass::Read);
    assert_ne!(events[0].1, events[2].1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_ledger_during_call() {
    let pending = Arc::new(PendingRequests::new());
    let fetcher = Arc::new(fetcher(vec![Step::Hang]).with_tracker(pending.clone()));
    let cancel = CancelHandle::new();

    let call = {
        let fetcher = fetcher.clone();
        let options = FetchOptions::new()
            .with_method("PUT")
            .with_text("draft")
            .with_cancel(cancel.clone());
        tokio::spawn(async move { fetcher.fetch(URL, options).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(pending.pending_writes().len(), 1);
    assert!(pending.pending_reads().is_empty());

    cancel.cancel();
    let result = call.await.unwrap();
    assert!(result.unwrap_err().is_abort());
    assert!(pending.is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_share_fetcher() {
    let fetcher = fetcher(vec![Step::Status(200)]);

    let (a, b) = tokio::join!(
        fetcher.fetch("http://api.test/a", FetchOptions::default()),
        fetcher.fetch("http://api.test/b", FetchOptions::default()),
    );

    assert!(a.unwrap().ok());
    assert!(b.unwrap().ok());
    assert_eq!(fetcher.connector().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_request_shape_reaches_connector() {
    let fetcher = fetcher(vec![Step::Status(204)]);

    fetcher
        .fetch(
            URL,
            FetchOptions::new()
                .with_method("PATCH")
                .with_header("X-Request-Source", "tests")
                .with_json(&serde_json::json!({"done": true}))
                .unwrap(),
        )
        .await
        .unwrap();

    let seen = fetcher.connector().requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(seen[0].url, URL);
    assert_eq!(seen[0].headers.get("x-request-source"), Some("tests"));
    assert_eq!(seen[0].headers.get("content-type"), Some("application/json"));
    assert_eq!(&seen[0].body[..], br#"{"done":true}"#);
    assert!(!seen[0].streamed);
}
