//! Health counters for push pipelines

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_micros() as u64)
}

/// Health metrics for one pushed stream
///
/// All fields use atomic operations so the buffer path and a monitoring task
/// can touch them concurrently.
pub struct PipelineHealth {
    /// Buffers handed to the engine
    pub buffers_pushed: AtomicU64,

    /// Total bytes handed to the engine
    pub bytes_pushed: AtomicU64,

    /// Buffers refused because the stream was not started
    pub buffers_rejected: AtomicU64,

    /// Pushes the engine refused
    pub push_failures: AtomicU64,

    /// Timestamp (as Unix microseconds) of the last pushed buffer
    pub last_buffer_time: AtomicU64,
}

impl PipelineHealth {
    pub fn new() -> Self {
        Self {
            buffers_pushed: AtomicU64::new(0),
            bytes_pushed: AtomicU64::new(0),
            buffers_rejected: AtomicU64::new(0),
            push_failures: AtomicU64::new(0),
            last_buffer_time: AtomicU64::new(now_micros()),
        }
    }

    /// Record a buffer accepted by the engine
    pub fn record_buffer(&self, size: usize) {
        self.last_buffer_time.store(now_micros(), Ordering::Relaxed);
        self.buffers_pushed.fetch_add(1, Ordering::Relaxed);
        self.bytes_pushed.fetch_add(size as u64, Ordering::Relaxed);
    }

    /// Record a buffer that arrived before its stream was started
    pub fn record_rejected(&self) {
        self.buffers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a push the engine failed
    pub fn record_push_failure(&self) {
        self.push_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn buffers_pushed(&self) -> u64 {
        self.buffers_pushed.load(Ordering::Relaxed)
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed.load(Ordering::Relaxed)
    }

    pub fn buffers_rejected(&self) -> u64 {
        self.buffers_rejected.load(Ordering::Relaxed)
    }

    pub fn push_failures(&self) -> u64 {
        self.push_failures.load(Ordering::Relaxed)
    }

    pub fn last_buffer_time(&self) -> u64 {
        self.last_buffer_time.load(Ordering::Relaxed)
    }

    /// Check if no buffer arrived within `threshold`
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        let elapsed_micros = now_micros().saturating_sub(self.last_buffer_time());
        elapsed_micros > threshold.as_micros() as u64
    }

    /// Get a summary of health metrics
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            buffers_pushed: self.buffers_pushed(),
            bytes_pushed: self.bytes_pushed(),
            buffers_rejected: self.buffers_rejected(),
            push_failures: self.push_failures(),
        }
    }
}

impl Default for PipelineHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSummary {
    pub buffers_pushed: u64,
    pub bytes_pushed: u64,
    pub buffers_rejected: u64,
    pub push_failures: u64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buffers ({} bytes), {} rejected, {} push failures",
            self.buffers_pushed, self.bytes_pushed, self.buffers_rejected, self.push_failures
        )
    }
}
