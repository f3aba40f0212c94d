//! Upload progress events and throughput estimation

use std::collections::VecDeque;

/// Number of samples the estimator keeps
pub const SPEED_WINDOW: usize = 10;

/// A point in an upload, handed synchronously to the progress sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub sent_bytes: u64,
    pub total_bytes: u64,
    /// Fraction sent, in `[0, 1]`
    pub percentage: f64,
    /// Smoothed throughput, never negative
    pub speed_bytes_per_sec: f64,
}

impl ProgressEvent {
    pub fn new(sent_bytes: u64, total_bytes: u64, speed_bytes_per_sec: f64) -> Self {
        let percentage = if total_bytes == 0 {
            1.0
        } else {
            (sent_bytes as f64 / total_bytes as f64).min(1.0)
        };
        Self {
            sent_bytes,
            total_bytes,
            percentage,
            speed_bytes_per_sec: speed_bytes_per_sec.max(0.0),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sent_bytes >= self.total_bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub timestamp_ms: u64,
    pub sent_bytes: u64,
}

/// Throughput over the last [`SPEED_WINDOW`] samples
#[derive(Debug, Clone, Default)]
pub struct SpeedEstimator {
    samples: VecDeque<SpeedSample>,
}

impl SpeedEstimator {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SPEED_WINDOW),
        }
    }

    /// Record cumulative `sent_bytes` at `now_ms` and return the current speed
    pub fn record(&mut self, sent_bytes: u64, now_ms: u64) -> f64 {
        if self.samples.len() == SPEED_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(SpeedSample {
            timestamp_ms: now_ms,
            sent_bytes,
        });
        self.current()
    }

    /// Speed across the window in bytes per second
    pub fn current(&self) -> f64 {
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }

        let elapsed_ms = newest.timestamp_ms.saturating_sub(oldest.timestamp_ms);
        if elapsed_ms == 0 {
            return 0.0;
        }

        let sent = newest.sent_bytes as f64 - oldest.sent_bytes as f64;
        (sent / (elapsed_ms as f64 / 1000.0)).max(0.0)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
