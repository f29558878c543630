//! Wall-clock time source consumed by the core.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeUtc;

/// Supplies UTC seconds. The core never reads the system clock itself.
pub trait Clock: Send + Sync {
    /// Current UTC time in seconds.
    fn now_utc(&self) -> TimeUtc;
}

/// Host system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> TimeUtc {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as TimeUtc)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `start`.
    pub fn new(start: TimeUtc) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: TimeUtc) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `seconds`, returning the new reading.
    pub fn advance(&self, seconds: TimeUtc) -> TimeUtc {
        self.now.fetch_add(seconds, Ordering::SeqCst) + seconds
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> TimeUtc {
        self.now.load(Ordering::SeqCst)
    }
}
