//! Scripted transport for scheduler unit tests

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use super::network_errors::{TransportError, TransportErrorKind};
use super::options::FetchOptions;
use super::outcome::Outcome;
use super::response::{Headers, Response};
use super::transport::Transport;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Status(u16),
    Fail(TransportErrorKind),
}

/// Plays back a fixed sequence of outcomes; the last step repeats forever
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        let last = steps.last().copied().unwrap_or(Step::Status(200));
        Self {
            script: Mutex::new(steps.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn statuses(statuses: &[u16]) -> Self {
        Self::new(statuses.iter().map(|s| Step::Status(*s)).collect())
    }

    pub(crate) fn failing(kind: TransportErrorKind) -> Self {
        Self::new(vec![Step::Fail(kind)])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn attempt(&self, _url: &Url, options: &FetchOptions) -> Outcome {
        if options.is_cancelled() {
            return Outcome::Aborted;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut script = self.script.lock().unwrap();
            let last = *self.last.lock().unwrap();
            script.pop_front().unwrap_or(last)
        };

        match step {
            Step::Status(status) => {
                Outcome::from_response(Response::from_status(status, Headers::new(), Bytes::new()))
            }
            Step::Fail(kind) => Outcome::NetworkFailure(TransportError::new(kind, "scripted failure")),
        }
    }
}
