//! # mavstore - Live aggregation of decoded MAVLink telemetry
//!
//! Keeps a queryable picture of every message stream seen on a MAVLink link,
//! indexed by (system id, component id, message id).
//!
//! ## Key Features
//!
//! - **Last value**: most recent payload and timestamp per message
//! - **Rate estimate**: exponential moving average of the update rate
//! - **Staleness**: derived at query time from a pluggable clock
//! - **Bounded history**: fixed-capacity ring buffer per message, resizable
//!
//! ## Quick Start
//!
//! ```rust
//! use mavstore::{DecodedRecord, RawStore};
//!
//! let mut store = RawStore::new();
//!
//! // Records come from an external MAVLink decoder
//! store.apply(DecodedRecord::new(1_000, 1, 1, 30).with_field("roll", 0.02));
//! store.apply(DecodedRecord::new(1_100, 1, 1, 30).with_field("roll", 0.03));
//!
//! assert_eq!(store.list_sysids(), vec![1]);
//! assert_eq!(store.list_msg_ids(1, None), vec![30]);
//!
//! let raw = store.get_raw(1, 30, None).unwrap();
//! assert_eq!(raw.t, Some(1_100));
//!
//! let detail = store.get_msg_detail(1, 1, 30, true).unwrap();
//! assert_eq!(detail.brief.count, 2);
//! assert_eq!(detail.history.unwrap().len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`ringbuffer`]: Fixed-capacity circular history
//! - [`entry`]: Per-message aggregate state
//! - [`store`]: The aggregation store and its query surface
//! - [`shared`]: Mutex-guarded handle for multi-threaded hosts
//! - [`record`]: Decoded record and payload types
//! - [`clock`]: Time sources
//!
//! ## Features
//!
//! - `serde`: Serialize/Deserialize for records and query results
//! - `logging`: `log` output on entry creation, resize and reset

// Modules
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod record;
pub mod ringbuffer;
pub mod shared;
pub mod store;

// Re-exports for convenient access
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, DEFAULT_EMA_ALPHA, DEFAULT_HISTORY_SIZE, DEFAULT_STALE_MS};
pub use entry::Entry;
pub use error::{Result, StoreError};
pub use record::{
    CompId, DecodedRecord, FieldValue, MsgId, Payload, RawValue, Sample, SysId, TimestampMs,
};
pub use ringbuffer::RingBuffer;
pub use shared::SharedStore;
pub use store::{EntryKey, MsgBrief, MsgDetail, RawStore, StoreSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
