//! Behavioural tests for the aggregation store
//!
//! These tests verify:
//! - Counting and history bounds
//! - Rate estimation (seeding, smoothing, out-of-order input)
//! - Staleness against an injected clock
//! - Administrative operations (resize, reset, threshold change)
//! - Cross-component lookups and enumeration
//! - Index growth characteristics

use approx::assert_relative_eq;
use mavstore::{
    DecodedRecord, FieldValue, ManualClock, RawStore, RingBuffer, SharedStore, StoreConfig,
    StoreError,
};

fn store_with_clock(clock: &ManualClock) -> RawStore {
    RawStore::with_config(StoreConfig::default().with_clock(clock.clone())).unwrap()
}

fn attitude(t: u64, compid: u8) -> DecodedRecord {
    DecodedRecord::new(t, 1, compid, 30)
        .with_field("time_boot_ms", t)
        .with_field("roll", 0.01 * t as f64)
}

// ===========================================================================
// Counting and history
// ===========================================================================

#[test]
fn test_count_equals_number_of_applies() {
    let mut store = RawStore::new();
    for i in 0..137u64 {
        store.apply(attitude(i * 20, 1));
    }
    assert_eq!(store.get_msg_brief(1, 1, 30).unwrap().count, 137);
}

#[test]
fn test_history_never_exceeds_configured_size() {
    let mut store = RawStore::with_config(StoreConfig::default().with_history_size(5)).unwrap();
    for i in 0..50u64 {
        store.apply(attitude(i, 1));
        let detail = store.get_msg_detail(1, 1, 30, true).unwrap();
        assert!(detail.history.unwrap().len() <= 5);
    }

    let history = store.get_msg_detail(1, 1, 30, true).unwrap().history.unwrap();
    let times: Vec<u64> = history.iter().map(|s| s.t).collect();
    assert_eq!(times, vec![45, 46, 47, 48, 49]);
}

#[test]
fn test_ring_buffer_returns_last_k_oldest_first() {
    let mut buf = RingBuffer::new(4).unwrap();
    for i in 0..11 {
        buf.push(i);
    }
    assert_eq!(buf.to_vec(), vec![7, 8, 9, 10]);
    assert_eq!(buf.len(), 4);
}

// ===========================================================================
// Rate estimation
// ===========================================================================

#[test]
fn test_ema_seeds_to_first_instantaneous_rate() {
    let mut store = RawStore::with_config(StoreConfig::default().with_ema_alpha(0.2)).unwrap();
    store.apply(attitude(0, 1));
    store.apply(attitude(500, 1));
    assert_relative_eq!(store.get_msg_brief(1, 1, 30).unwrap().hz_ema.unwrap(), 2.0);
}

#[test]
fn test_ema_smoothing_step() {
    let mut store = RawStore::new();
    store.apply(attitude(0, 1));
    store.apply(attitude(500, 1)); // 2 Hz
    store.apply(attitude(750, 1)); // 4 Hz
    assert_relative_eq!(
        store.get_msg_brief(1, 1, 30).unwrap().hz_ema.unwrap(),
        0.8 * 2.0 + 0.2 * 4.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_ema_converges_on_steady_stream() {
    let mut store = RawStore::new();
    for i in 0..200u64 {
        store.apply(attitude(i * 40, 1)); // 25 Hz
    }
    assert_relative_eq!(
        store.get_msg_brief(1, 1, 30).unwrap().hz_ema.unwrap(),
        25.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_out_of_order_update_keeps_rate() {
    let mut store = RawStore::new();
    store.apply(attitude(800, 1));
    store.apply(attitude(1000, 1)); // 5 Hz seed
    assert_relative_eq!(store.get_msg_brief(1, 1, 30).unwrap().hz_ema.unwrap(), 5.0);

    store.apply(attitude(900, 1).with_field("late", true));

    let detail = store.get_msg_detail(1, 1, 30, true).unwrap();
    assert_eq!(detail.brief.last_t, Some(900));
    assert_eq!(detail.brief.count, 3);
    assert_relative_eq!(detail.brief.hz_ema.unwrap(), 5.0);
    assert_eq!(
        detail.last_payload.unwrap().get("late"),
        Some(&FieldValue::Bool(true))
    );
    let times: Vec<u64> = detail.history.unwrap().iter().map(|s| s.t).collect();
    assert_eq!(times, vec![800, 1000, 900]);
}

// ===========================================================================
// Staleness
// ===========================================================================

#[test]
fn test_staleness_threshold() {
    let clock = ManualClock::new(0);
    let mut store = store_with_clock(&clock);
    let t0 = 50_000;
    store.apply(attitude(t0, 1));

    clock.set(t0 + 3000 + 1);
    assert!(store.get_msg_brief(1, 1, 30).unwrap().stale);

    clock.set(t0 + 3000 - 1);
    assert!(!store.get_msg_brief(1, 1, 30).unwrap().stale);
}

#[test]
fn test_set_stale_ms_takes_effect_immediately() {
    let clock = ManualClock::new(10_000);
    let mut store = store_with_clock(&clock);
    store.apply(attitude(9_000, 1));
    assert!(!store.get_msg_brief(1, 1, 30).unwrap().stale);

    store.set_stale_ms(500);
    assert!(store.get_msg_brief(1, 1, 30).unwrap().stale);
    assert!(store.get_msg_detail(1, 1, 30, false).unwrap().brief.stale);
    assert_eq!(store.stale_ms(), 500);
}

// ===========================================================================
// Administration
// ===========================================================================

#[test]
fn test_shrink_history_keeps_most_recent() {
    let mut store = RawStore::new();
    assert_eq!(store.history_size(), 64);
    for i in 0..10u64 {
        store.apply(attitude(i, 1));
    }

    store.set_history_size(4).unwrap();

    let history = store.get_msg_detail(1, 1, 30, true).unwrap().history.unwrap();
    let times: Vec<u64> = history.iter().map(|s| s.t).collect();
    assert_eq!(times, vec![6, 7, 8, 9]);
}

#[test]
fn test_set_history_size_zero_is_invalid_argument() {
    let mut store = RawStore::new();
    store.apply(attitude(0, 1));
    let result = store.set_history_size(0);
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    assert_eq!(store.history_size(), 64);
}

#[test]
fn test_reset_stats_keeps_keys() {
    let mut store = RawStore::new();
    store.apply(attitude(0, 1));
    store.apply(attitude(100, 1));
    store.apply(attitude(100, 2));
    store.reset_stats();

    assert_eq!(store.list_msg_ids(1, Some(1)), vec![30]);
    assert_eq!(store.list_compids(1), vec![1, 2]);
    for compid in [1, 2] {
        let detail = store.get_msg_detail(1, compid, 30, true).unwrap();
        assert_eq!(detail.brief.count, 0);
        assert_eq!(detail.brief.hz_ema, None);
        assert_eq!(detail.brief.last_t, None);
        assert!(detail.last_payload.is_none());
        assert!(detail.history.unwrap().is_empty());
    }

    // entries keep working after a reset
    store.apply(attitude(200, 1));
    store.apply(attitude(300, 1));
    let brief = store.get_msg_brief(1, 1, 30).unwrap();
    assert_eq!(brief.count, 2);
    assert_relative_eq!(brief.hz_ema.unwrap(), 10.0);
}

// ===========================================================================
// Lookups and enumeration
// ===========================================================================

#[test]
fn test_get_raw_across_components() {
    let mut store = RawStore::new();
    store.apply(attitude(100, 1));
    store.apply(attitude(200, 2));

    let raw = store.get_raw(1, 30, None).unwrap();
    assert_eq!(raw.t, Some(200));
    assert_eq!(raw.payload.unwrap()["time_boot_ms"], FieldValue::UInt(200));

    assert_eq!(store.get_raw(1, 30, Some(1)).unwrap().t, Some(100));
}

#[test]
fn test_get_raw_after_reset_is_found_but_empty() {
    let mut store = RawStore::new();
    store.apply(attitude(100, 1));
    store.apply(attitude(200, 2));
    store.reset_stats();

    // keys survive the reset, values do not
    let raw = store.get_raw(1, 30, Some(2)).expect("key still exists");
    assert!(raw.t.is_none());
    assert!(raw.payload.is_none());

    let raw = store.get_raw(1, 30, None).expect("key still exists");
    assert!(raw.t.is_none());

    // the first component seen again wins over the reset one
    store.apply(attitude(50, 2));
    assert_eq!(store.get_raw(1, 30, None).unwrap().t, Some(50));
    assert!(store.get_raw(1, 31, None).is_none());
}

#[test]
fn test_enumeration_is_sorted_and_unique() {
    let mut store = RawStore::new();
    for (sysid, compid, msg_id) in [(255, 190, 0), (1, 1, 30), (1, 1, 0), (1, 100, 0), (2, 1, 24)] {
        store.apply(DecodedRecord::new(0, sysid, compid, msg_id));
        store.apply(DecodedRecord::new(1, sysid, compid, msg_id));
    }
    assert_eq!(store.list_sysids(), vec![1, 2, 255]);
    assert_eq!(store.list_compids(1), vec![1, 100]);
    assert_eq!(store.list_msg_ids(1, None), vec![0, 30]);
    assert_eq!(store.list_msg_ids(1, Some(100)), vec![0]);
}

#[test]
fn test_missing_keys_are_not_found() {
    let mut store = RawStore::new();
    store.apply(attitude(0, 1));
    assert!(store.get_msg_brief(1, 2, 30).is_none());
    assert!(store.get_msg_brief(2, 1, 30).is_none());
    assert!(store.get_msg_detail(1, 1, 31, false).is_none());
    assert!(store.get_raw(1, 31, None).is_none());
    assert!(store.list_compids(7).is_empty());
    assert!(store.list_msg_ids(7, None).is_empty());
}

// ===========================================================================
// Resource growth
// ===========================================================================

#[test]
fn test_index_grows_with_distinct_triples_only() {
    let mut store = RawStore::with_config(StoreConfig::default().with_history_size(2)).unwrap();

    // repeated traffic on the same keys does not grow the index
    for t in 0..1000u64 {
        store.apply(DecodedRecord::new(t, 1, 1, (t % 4) as u32));
    }
    assert_eq!(store.entry_count(), 4);

    // every new triple adds one entry and none are evicted
    for sysid in 1..=10u8 {
        for msg_id in 100..150u32 {
            store.apply(DecodedRecord::new(0, sysid, 1, msg_id));
        }
    }
    assert_eq!(store.entry_count(), 4 + 10 * 50);

    store.reset_stats();
    assert_eq!(store.entry_count(), 504);
    assert_eq!(store.summary().total_records, 0);
}

#[test]
fn test_shared_store_exposes_same_surface() {
    let clock = ManualClock::new(0);
    let shared = SharedStore::new(store_with_clock(&clock));
    shared.apply(attitude(100, 1));
    shared.apply(attitude(200, 2));
    clock.set(200);

    assert_eq!(shared.get_raw(1, 30, None).unwrap().t, Some(200));
    assert!(!shared.get_msg_brief(1, 2, 30).unwrap().stale);
    assert_eq!(shared.summary().components, 2);
}
