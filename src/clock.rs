//! Time sources for rate and staleness evaluation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::record::TimestampMs;

/// Source of "now" in milliseconds.
///
/// Any `Fn() -> u64` closure is a clock, which keeps tests short:
///
/// ```rust
/// use mavstore::{RawStore, StoreConfig};
///
/// let config = StoreConfig::default().with_clock(|| 42_000u64);
/// let store = RawStore::with_config(config).unwrap();
/// assert_eq!(store.now(), 42_000);
/// ```
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> TimestampMs;
}

impl<F> Clock for F
where
    F: Fn() -> TimestampMs + Send + Sync,
{
    fn now_ms(&self) -> TimestampMs {
        self()
    }
}

/// Wall clock: milliseconds since the UNIX epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as TimestampMs)
            .unwrap_or(0)
    }
}

/// Settable clock, shared by handle.
///
/// Clones observe the same time. Used to drive staleness from replayed
/// timestamps instead of the wall clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: TimestampMs) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: TimestampMs) {
        self.now.store(ms, Ordering::SeqCst);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: TimestampMs) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Move forward to `ms` if it is later than the current time
    pub fn advance_to(&self, ms: TimestampMs) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}
