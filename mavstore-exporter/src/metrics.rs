// mavstore Exporter - Prometheus metrics definitions
// Copyright (c) 2026 The mavstore authors
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Prometheus metrics for mavstore monitoring.
//!
//! Ingestion counters are updated as records flow in; store gauges are
//! refreshed from the store on every scrape, since staleness only exists at
//! query time.

use lazy_static::lazy_static;
use mavstore::RawStore;
use prometheus::{
    register_counter, register_gauge, register_gauge_vec, Counter, Encoder, Gauge, GaugeVec,
    TextEncoder,
};

lazy_static! {
    // ============================================================
    // Store Metrics (refreshed at scrape time)
    // ============================================================

    /// Number of (sysid, compid, msg_id) triples ever observed.
    pub static ref ENTRIES: Gauge = register_gauge!(
        "mavstore_entries",
        "Number of message streams tracked by the store"
    ).unwrap();

    /// Entries whose last update is older than the staleness threshold.
    pub static ref STALE_ENTRIES: Gauge = register_gauge!(
        "mavstore_stale_entries",
        "Number of message streams currently stale"
    ).unwrap();

    /// Distinct system ids seen.
    pub static ref SYSTEMS: Gauge = register_gauge!(
        "mavstore_systems",
        "Number of MAVLink systems seen"
    ).unwrap();

    /// Smoothed update rate per message stream.
    pub static ref MESSAGE_RATE_HZ: GaugeVec = register_gauge_vec!(
        "mavstore_message_rate_hz",
        "Smoothed update rate per message stream in Hz (0 = unknown)",
        &["sysid", "compid", "msg_id"]
    ).unwrap();

    /// Messages counted per stream since the last reset.
    pub static ref MESSAGE_COUNT: GaugeVec = register_gauge_vec!(
        "mavstore_message_count",
        "Messages received per stream since the last stats reset",
        &["sysid", "compid", "msg_id"]
    ).unwrap();

    // ============================================================
    // Ingestion Metrics
    // ============================================================

    /// Records applied to the store.
    pub static ref RECORDS_APPLIED_TOTAL: Counter = register_counter!(
        "mavstore_records_applied_total",
        "Total decoded records applied to the store"
    ).unwrap();

    /// Input lines rejected before reaching the store.
    pub static ref MALFORMED_RECORDS_TOTAL: Counter = register_counter!(
        "mavstore_malformed_records_total",
        "Total input lines that failed to parse as decoded records"
    ).unwrap();

    // ============================================================
    // Exporter Metrics
    // ============================================================

    /// Current replay position (record index).
    pub static ref REPLAY_POSITION: Gauge = register_gauge!(
        "mavstore_exporter_replay_position",
        "Current replay position (record index)"
    ).unwrap();

    /// Total records in the replay recording.
    pub static ref REPLAY_TOTAL_RECORDS: Gauge = register_gauge!(
        "mavstore_exporter_replay_total_records",
        "Total records in the replay recording"
    ).unwrap();

    /// Replay speed multiplier.
    pub static ref REPLAY_SPEED: Gauge = register_gauge!(
        "mavstore_exporter_replay_speed",
        "Replay speed multiplier"
    ).unwrap();
}

/// Refresh store gauges from the current store contents.
pub fn update_store_metrics(store: &RawStore) {
    let summary = store.summary();
    ENTRIES.set(summary.entries as f64);
    STALE_ENTRIES.set(summary.stale_entries as f64);
    SYSTEMS.set(summary.systems as f64);

    for (key, entry) in store.entries() {
        let ids = [
            key.sysid.to_string(),
            key.compid.to_string(),
            key.msg_id.to_string(),
        ];
        let labels = [ids[0].as_str(), ids[1].as_str(), ids[2].as_str()];
        MESSAGE_RATE_HZ
            .with_label_values(&labels)
            .set(entry.hz_ema());
        MESSAGE_COUNT
            .with_label_values(&labels)
            .set(entry.count() as f64);
    }
}

/// Increment the applied records counter.
pub fn increment_records_applied() {
    RECORDS_APPLIED_TOTAL.inc();
}

/// Increment the malformed input counter.
pub fn increment_malformed_records() {
    MALFORMED_RECORDS_TOTAL.inc();
}

/// Update replay position metrics.
pub fn update_replay_metrics(position: usize, total: usize, speed: f64) {
    REPLAY_POSITION.set(position as f64);
    REPLAY_TOTAL_RECORDS.set(total as f64);
    REPLAY_SPEED.set(speed);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
