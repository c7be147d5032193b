//! Aggregation store for decoded MAVLink messages
//!
//! [`RawStore`] keeps one [`Entry`] per (sysid, compid, msg_id) triple in a
//! single ordered map keyed by [`EntryKey`]. The key orders by sysid, then
//! compid, then msg_id, so every enumeration is a range scan that comes out
//! sorted.
//!
//! Entries are created on first [`RawStore::apply`] and never removed.
//! Staleness is evaluated against the configured clock on every query and
//! is never stored.
//!
//! ```rust
//! use mavstore::{DecodedRecord, RawStore, StoreConfig};
//!
//! let config = StoreConfig::default().with_clock(|| 1_000u64);
//! let mut store = RawStore::with_config(config).unwrap();
//!
//! store.apply(DecodedRecord::new(0, 1, 1, 30).with_field("roll", 0.1));
//! store.apply(DecodedRecord::new(500, 1, 1, 30).with_field("roll", 0.2));
//!
//! let brief = store.get_msg_brief(1, 1, 30).unwrap();
//! assert_eq!(brief.count, 2);
//! assert_eq!(brief.hz_ema, Some(2.0));
//! assert!(!brief.stale);
//! ```

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{StoreConfig, DEFAULT_HISTORY_SIZE};
use crate::entry::Entry;
use crate::error::{Result, StoreError};
use crate::record::{CompId, DecodedRecord, MsgId, Payload, RawValue, Sample, SysId, TimestampMs};

const DEFAULT_DEPTH: NonZeroUsize = match NonZeroUsize::new(DEFAULT_HISTORY_SIZE) {
    Some(n) => n,
    None => panic!("default history size must be > 0"),
};

/// Composite index key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EntryKey {
    pub sysid: SysId,
    pub compid: CompId,
    pub msg_id: MsgId,
}

impl EntryKey {
    pub fn new(sysid: SysId, compid: CompId, msg_id: MsgId) -> Self {
        Self {
            sysid,
            compid,
            msg_id,
        }
    }

    fn system_range(sysid: SysId) -> RangeInclusive<EntryKey> {
        EntryKey::new(sysid, CompId::MIN, MsgId::MIN)..=EntryKey::new(sysid, CompId::MAX, MsgId::MAX)
    }

    fn component_range(sysid: SysId, compid: CompId) -> RangeInclusive<EntryKey> {
        EntryKey::new(sysid, compid, MsgId::MIN)..=EntryKey::new(sysid, compid, MsgId::MAX)
    }
}

/// Summary view of one message stream
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MsgBrief {
    pub compid: CompId,
    pub msg_id: MsgId,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub last_t: Option<TimestampMs>,
    pub count: u64,
    /// Smoothed rate, absent until two increasing timestamps were seen
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub hz_ema: Option<f64>,
    pub stale: bool,
}

/// Brief plus last payload and, optionally, the history
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MsgDetail {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub brief: MsgBrief,
    pub last_payload: Option<Arc<Payload>>,
    /// Oldest -> newest copy of the history
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub history: Option<Vec<Sample>>,
}

/// Store-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StoreSummary {
    pub systems: usize,
    pub components: usize,
    pub entries: usize,
    pub stale_entries: usize,
    /// Sum of per-entry counts since the last reset
    pub total_records: u64,
}

/// Continuously updated aggregate of decoded messages.
///
/// Single-threaded: mutation takes `&mut self`. Wrap it in
/// [`SharedStore`](crate::SharedStore) to share it across threads.
#[derive(Debug)]
pub struct RawStore {
    entries: BTreeMap<EntryKey, Entry>,
    config: StoreConfig,
    /// Validated copy of `config.history_size`
    history_size: NonZeroUsize,
}

impl RawStore {
    /// Create a store with the default configuration
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            config: StoreConfig::default(),
            history_size: DEFAULT_DEPTH,
        }
    }

    /// Create a store with a validated configuration
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let history_size = NonZeroUsize::new(config.history_size)
            .ok_or_else(|| StoreError::zero_capacity("historySize"))?;
        Ok(Self {
            entries: BTreeMap::new(),
            config,
            history_size,
        })
    }

    /// Current time according to the configured clock
    pub fn now(&self) -> TimestampMs {
        self.config.clock.now_ms()
    }

    /// Current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn stale_ms(&self) -> u64 {
        self.config.stale_ms
    }

    pub fn history_size(&self) -> usize {
        self.history_size.get()
    }

    pub fn ema_alpha(&self) -> f64 {
        self.config.ema_alpha
    }

    /// Number of (sysid, compid, msg_id) triples ever observed
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was ever applied
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ----- write surface -----

    /// Fold one decoded record into its entry, creating the entry if needed.
    pub fn apply(&mut self, record: DecodedRecord) {
        let DecodedRecord {
            t,
            sysid,
            compid,
            msg_id,
            payload,
        } = record;
        let history_size = self.history_size;

        let entry = self
            .entries
            .entry(EntryKey::new(sysid, compid, msg_id))
            .or_insert_with(|| {
                #[cfg(feature = "logging")]
                log::debug!(
                    "new entry sysid={} compid={} msg_id={}",
                    sysid,
                    compid,
                    msg_id
                );
                Entry::new(history_size)
            });
        entry.observe(t, Arc::new(payload), self.config.ema_alpha);
    }

    /// Replace the staleness threshold used by later queries
    pub fn set_stale_ms(&mut self, ms: u64) {
        self.config.stale_ms = ms;
    }

    /// Resize every entry's history and use `n` for new entries.
    pub fn set_history_size(&mut self, n: usize) -> Result<()> {
        let size = NonZeroUsize::new(n).ok_or_else(|| StoreError::zero_capacity("historySize"))?;
        for entry in self.entries.values_mut() {
            entry.set_history_size(n)?;
        }
        self.history_size = size;
        self.config.history_size = n;

        #[cfg(feature = "logging")]
        log::info!(
            "history size set to {} across {} entries",
            n,
            self.entries.len()
        );
        Ok(())
    }

    /// Zero every entry's statistics, keeping all keys enumerable.
    pub fn reset_stats(&mut self) {
        for entry in self.entries.values_mut() {
            entry.reset(self.history_size);
        }

        #[cfg(feature = "logging")]
        log::info!("stats reset for {} entries", self.entries.len());
    }

    // ----- read surface -----

    /// Last value of a message.
    ///
    /// With `compid`, a direct lookup. Without it, the most recently updated
    /// component under `sysid` carrying `msg_id` wins; equal timestamps go to
    /// the smallest compid, and a component not observed since the last reset
    /// only wins when no other one was. `None` means no such key exists.
    pub fn get_raw(&self, sysid: SysId, msg_id: MsgId, compid: Option<CompId>) -> Option<RawValue> {
        if let Some(compid) = compid {
            return self
                .entries
                .get(&EntryKey::new(sysid, compid, msg_id))
                .map(Entry::raw_value);
        }

        let mut latest: Option<&Entry> = None;
        for (_, entry) in self
            .entries
            .range(EntryKey::system_range(sysid))
            .filter(|(k, _)| k.msg_id == msg_id)
        {
            // None orders below every timestamp
            match latest {
                Some(best) if entry.last_t() <= best.last_t() => {}
                _ => latest = Some(entry),
            }
        }
        latest.map(Entry::raw_value)
    }

    /// All observed system ids, ascending
    pub fn list_sysids(&self) -> Vec<SysId> {
        let mut out: Vec<SysId> = Vec::new();
        for key in self.entries.keys() {
            if out.last() != Some(&key.sysid) {
                out.push(key.sysid);
            }
        }
        out
    }

    /// Component ids observed under `sysid`, ascending
    pub fn list_compids(&self, sysid: SysId) -> Vec<CompId> {
        let mut out: Vec<CompId> = Vec::new();
        for key in self.entries.range(EntryKey::system_range(sysid)).map(|(k, _)| k) {
            if out.last() != Some(&key.compid) {
                out.push(key.compid);
            }
        }
        out
    }

    /// Message ids under `sysid`, for one component or the union of all.
    pub fn list_msg_ids(&self, sysid: SysId, compid: Option<CompId>) -> Vec<MsgId> {
        match compid {
            Some(compid) => self
                .entries
                .range(EntryKey::component_range(sysid, compid))
                .map(|(k, _)| k.msg_id)
                .collect(),
            None => {
                let mut out: Vec<MsgId> = self
                    .entries
                    .range(EntryKey::system_range(sysid))
                    .map(|(k, _)| k.msg_id)
                    .collect();
                out.sort_unstable();
                out.dedup();
                out
            }
        }
    }

    /// Counters, rate and staleness of one message stream
    pub fn get_msg_brief(&self, sysid: SysId, compid: CompId, msg_id: MsgId) -> Option<MsgBrief> {
        let entry = self.entries.get(&EntryKey::new(sysid, compid, msg_id))?;
        Some(self.brief(compid, msg_id, entry, self.now()))
    }

    /// Brief plus last payload; `include_history` adds a history snapshot.
    pub fn get_msg_detail(
        &self,
        sysid: SysId,
        compid: CompId,
        msg_id: MsgId,
        include_history: bool,
    ) -> Option<MsgDetail> {
        let entry = self.entries.get(&EntryKey::new(sysid, compid, msg_id))?;
        Some(MsgDetail {
            brief: self.brief(compid, msg_id, entry, self.now()),
            last_payload: entry.last_payload().cloned(),
            history: include_history.then(|| entry.history().to_vec()),
        })
    }

    /// Iterate over all entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&EntryKey, &Entry)> {
        self.entries.iter()
    }

    /// Store-wide counters evaluated at the current clock time
    pub fn summary(&self) -> StoreSummary {
        let now = self.now();
        let mut summary = StoreSummary {
            systems: self.list_sysids().len(),
            entries: self.entries.len(),
            ..Default::default()
        };

        let mut last_comp: Option<(SysId, CompId)> = None;
        for (key, entry) in &self.entries {
            if last_comp != Some((key.sysid, key.compid)) {
                summary.components += 1;
                last_comp = Some((key.sysid, key.compid));
            }
            if entry.is_stale(now, self.config.stale_ms) {
                summary.stale_entries += 1;
            }
            summary.total_records += entry.count();
        }
        summary
    }

    fn brief(&self, compid: CompId, msg_id: MsgId, entry: &Entry, now: TimestampMs) -> MsgBrief {
        MsgBrief {
            compid,
            msg_id,
            last_t: entry.last_t(),
            count: entry.count(),
            hz_ema: entry.rate_hz(),
            stale: entry.is_stale(now, self.config.stale_ms),
        }
    }
}

impl Default for RawStore {
    fn default() -> Self {
        Self::new()
    }
}
