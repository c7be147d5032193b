//! Thread-safe handle around a [`RawStore`]
//!
//! One coarse mutex per store covers `apply` and every query, so entry
//! creation and entry mutation are atomic with respect to readers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::record::{CompId, DecodedRecord, MsgId, RawValue, SysId};
use crate::store::{MsgBrief, MsgDetail, RawStore, StoreSummary};

/// Cloneable, `Send + Sync` handle to one store instance
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<RawStore>>,
}

impl SharedStore {
    /// Wrap an existing store
    pub fn new(store: RawStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Create a store from a configuration
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        RawStore::with_config(config).map(Self::new)
    }

    /// Lock the store for a sequence of operations.
    ///
    /// A panic while holding the lock cannot leave an entry half-updated in
    /// a way queries would misread, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, RawStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn apply(&self, record: DecodedRecord) {
        self.lock().apply(record);
    }

    /// Apply a batch under a single lock acquisition
    pub fn apply_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = DecodedRecord>,
    {
        let mut store = self.lock();
        for record in records {
            store.apply(record);
        }
    }

    pub fn set_stale_ms(&self, ms: u64) {
        self.lock().set_stale_ms(ms);
    }

    pub fn set_history_size(&self, n: usize) -> Result<()> {
        self.lock().set_history_size(n)
    }

    pub fn reset_stats(&self) {
        self.lock().reset_stats();
    }

    pub fn get_raw(&self, sysid: SysId, msg_id: MsgId, compid: Option<CompId>) -> Option<RawValue> {
        self.lock().get_raw(sysid, msg_id, compid)
    }

    pub fn list_sysids(&self) -> Vec<SysId> {
        self.lock().list_sysids()
    }

    pub fn list_compids(&self, sysid: SysId) -> Vec<CompId> {
        self.lock().list_compids(sysid)
    }

    pub fn list_msg_ids(&self, sysid: SysId, compid: Option<CompId>) -> Vec<MsgId> {
        self.lock().list_msg_ids(sysid, compid)
    }

    pub fn get_msg_brief(&self, sysid: SysId, compid: CompId, msg_id: MsgId) -> Option<MsgBrief> {
        self.lock().get_msg_brief(sysid, compid, msg_id)
    }

    pub fn get_msg_detail(
        &self,
        sysid: SysId,
        compid: CompId,
        msg_id: MsgId,
        include_history: bool,
    ) -> Option<MsgDetail> {
        self.lock()
            .get_msg_detail(sysid, compid, msg_id, include_history)
    }

    pub fn summary(&self) -> StoreSummary {
        self.lock().summary()
    }

    pub fn entry_count(&self) -> usize {
        self.lock().entry_count()
    }
}

impl From<RawStore> for SharedStore {
    fn from(store: RawStore) -> Self {
        Self::new(store)
    }
}
