//! Per-message aggregate state
//!
//! One [`Entry`] exists for every (sysid, compid, msg_id) triple the store
//! has seen. It tracks the last value, a message count, an exponential
//! moving average of the update rate and a bounded history.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::Result;
use crate::record::{Payload, RawValue, Sample, TimestampMs};
use crate::ringbuffer::RingBuffer;

/// Aggregate state for one (sysid, compid, msg_id) triple
#[derive(Debug, Clone)]
pub struct Entry {
    last_t: Option<TimestampMs>,
    last_payload: Option<Arc<Payload>>,
    count: u64,
    /// 0.0 means "no rate computed yet"
    hz_ema: f64,
    history: RingBuffer<Sample>,
}

impl Entry {
    /// Create a zero-baseline entry with the given history depth
    pub fn new(history_size: NonZeroUsize) -> Self {
        Self {
            last_t: None,
            last_payload: None,
            count: 0,
            hz_ema: 0.0,
            history: RingBuffer::with_capacity(history_size),
        }
    }

    /// Record one observation.
    ///
    /// The rate estimate only moves when `t` is strictly later than the
    /// previous observation; everything else is updated unconditionally.
    pub fn observe(&mut self, t: TimestampMs, payload: Arc<Payload>, ema_alpha: f64) {
        if let Some(last_t) = self.last_t {
            if t > last_t {
                let dt = (t - last_t) as f64 / 1000.0;
                let inst_hz = 1.0 / dt;
                self.hz_ema = if self.hz_ema == 0.0 {
                    inst_hz
                } else {
                    (1.0 - ema_alpha) * self.hz_ema + ema_alpha * inst_hz
                };
            }
        }

        self.last_t = Some(t);
        self.last_payload = Some(Arc::clone(&payload));
        self.count += 1;
        self.history.push(Sample { t, payload });
    }

    /// Back to the zero baseline with an empty history of `history_size`.
    pub fn reset(&mut self, history_size: NonZeroUsize) {
        *self = Self::new(history_size);
    }

    /// Resize the history, keeping the most recent items.
    pub fn set_history_size(&mut self, n: usize) -> Result<()> {
        self.history.set_capacity(n)
    }

    /// Timestamp of the last observation
    pub fn last_t(&self) -> Option<TimestampMs> {
        self.last_t
    }

    /// Payload of the last observation
    pub fn last_payload(&self) -> Option<&Arc<Payload>> {
        self.last_payload.as_ref()
    }

    /// Number of observations since creation or the last reset
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smoothed update rate in Hz, 0.0 if not yet known
    pub fn hz_ema(&self) -> f64 {
        self.hz_ema
    }

    /// Rate estimate, `None` until one has been computed
    pub fn rate_hz(&self) -> Option<f64> {
        if self.hz_ema > 0.0 {
            Some(self.hz_ema)
        } else {
            None
        }
    }

    /// Last observation, empty after a reset
    pub fn raw_value(&self) -> RawValue {
        RawValue {
            t: self.last_t,
            payload: self.last_payload.clone(),
        }
    }

    /// Stale when never observed, or older than `stale_ms` at `now`.
    pub fn is_stale(&self, now: TimestampMs, stale_ms: u64) -> bool {
        match self.last_t {
            None => true,
            Some(last_t) => now.saturating_sub(last_t) > stale_ms,
        }
    }

    /// Bounded recent history
    pub fn history(&self) -> &RingBuffer<Sample> {
        &self.history
    }
}
