//! Pending-request bookkeeping
//!
//! The orchestrator reports the start and end of every call to an optional
//! [`RequestTracker`]. [`PendingRequests`] is the in-memory ledger shipped with
//! the crate: one map for reads, one for writes, keyed by request id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    Read,
    Write,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestClass::Read => write!(f, "read"),
            RequestClass::Write => write!(f, "write"),
        }
    }
}

/// Receives the lifecycle of each orchestrated call
pub trait RequestTracker: Send + Sync {
    fn record_start(&self, id: &str, class: RequestClass);
    fn record_end(&self, id: &str, class: RequestClass);
}

/// In-memory ledger of calls that have started but not concluded
#[derive(Debug, Default)]
pub struct PendingRequests {
    reads: Mutex<HashMap<String, DateTime<Utc>>>,
    writes: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_reads(&self) -> HashMap<String, DateTime<Utc>> {
        self.ledger(RequestClass::Read).clone()
    }

    pub fn pending_writes(&self) -> HashMap<String, DateTime<Utc>> {
        self.ledger(RequestClass::Write).clone()
    }

    pub fn is_idle(&self) -> bool {
        self.ledger(RequestClass::Read).is_empty() && self.ledger(RequestClass::Write).is_empty()
    }

    fn ledger(&self, class: RequestClass) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        let map = match class {
            RequestClass::Read => &self.reads,
            RequestClass::Write => &self.writes,
        };
        // Entries are plain values, so a panic elsewhere cannot leave them torn
        map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestTracker for PendingRequests {
    fn record_start(&self, id: &str, class: RequestClass) {
        self.ledger(class).insert(id.to_string(), Utc::now());
    }

    fn record_end(&self, id: &str, class: RequestClass) {
        self.ledger(class).remove(id);
    }
}
