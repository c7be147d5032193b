//! Configuration types for mavstore

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};

/// Default staleness threshold in milliseconds
pub const DEFAULT_STALE_MS: u64 = 3000;

/// Default number of history items kept per message
pub const DEFAULT_HISTORY_SIZE: usize = 64;

/// Default smoothing factor for the rate estimate
pub const DEFAULT_EMA_ALPHA: f64 = 0.2;

/// Store-level configuration
#[derive(Clone)]
pub struct StoreConfig {
    /// Time source for staleness (default: wall clock)
    pub clock: Arc<dyn Clock>,

    /// A message is stale when older than this (default: 3000 ms)
    pub stale_ms: u64,

    /// History depth per message (default: 64, must be > 0)
    pub history_size: usize,

    /// Weight of the newest sample in the rate EMA, in (0, 1] (default: 0.2)
    pub ema_alpha: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            stale_ms: DEFAULT_STALE_MS,
            history_size: DEFAULT_HISTORY_SIZE,
            ema_alpha: DEFAULT_EMA_ALPHA,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("stale_ms", &self.stale_ms)
            .field("history_size", &self.history_size)
            .field("ema_alpha", &self.ema_alpha)
            .finish_non_exhaustive()
    }
}

impl StoreConfig {
    /// Use a custom time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Set the staleness threshold
    pub fn with_stale_ms(mut self, stale_ms: u64) -> Self {
        self.stale_ms = stale_ms;
        self
    }

    /// Set the per-message history depth
    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    /// Set the EMA smoothing factor
    pub fn with_ema_alpha(mut self, ema_alpha: f64) -> Self {
        self.ema_alpha = ema_alpha;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(StoreError::zero_capacity("historySize"));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(StoreError::InvalidArgument(format!(
                "emaAlpha must be in (0, 1], got {}",
                self.ema_alpha
            )));
        }
        Ok(())
    }
}
