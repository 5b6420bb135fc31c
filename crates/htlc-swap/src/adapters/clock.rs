//! Clock adapters implementing `TimeSource`.

use crate::domain::Timestamp;
use crate::ports::TimeSource;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wall clock, seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Clock moved by hand. Used by ledger tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: AtomicU64,
}

impl ManualClock {
    /// Start at `initial`.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to `time`.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

/// Chain clock driven by tokio's timer.
///
/// Under a paused runtime (`start_paused = true`) time only moves when every
/// task is idle, so simulated timelocks elapse deterministically.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base: Timestamp,
    start: tokio::time::Instant,
}

impl TokioClock {
    /// Report `base` now and advance with the runtime clock.
    pub fn starting_at(base: Timestamp) -> Self {
        Self {
            base,
            start: tokio::time::Instant::now(),
        }
    }
}

impl TimeSource for TokioClock {
    fn now(&self) -> Timestamp {
        self.base + self.start.elapsed().as_secs()
    }
}
