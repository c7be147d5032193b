// mavstore Exporter - Recorded telemetry replay
// Copyright (c) 2026 The mavstore authors
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Replay engine feeding recorded decoder output into a store.
//!
//! The input is a JSON Lines file: one decoded record per line, in the shape
//! `{"t":..., "sysid":..., "compid":..., "msgId":..., "payload":{...}}`.
//! Lines that do not parse are logged, counted and skipped; blank lines are
//! ignored.

use crate::metrics::{increment_malformed_records, increment_records_applied, update_replay_metrics};
use mavstore::{DecodedRecord, ManualClock, SharedStore};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for dataset replay.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path to the JSONL recording.
    pub path: String,
    /// Replay speed multiplier (1.0 = real-time, 0.0 = no pacing).
    pub speed: f64,
    /// Whether to loop the recording.
    pub loop_replay: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            speed: 1.0,
            loop_replay: false,
        }
    }
}

/// State of the replay engine.
#[derive(Debug)]
pub struct ReplayState {
    /// Current position in the recording (record index).
    pub position: AtomicUsize,
    /// Total records in the recording.
    pub total_records: AtomicUsize,
    /// Whether replay is running.
    pub running: AtomicBool,
    /// Whether replay is paused.
    pub paused: AtomicBool,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            position: AtomicUsize::new(0),
            total_records: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }
}

impl ReplayState {
    /// Ask the replay loop to exit after the current record.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Pause/resume the replay.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

/// Recording information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub record_count: usize,
    pub malformed_lines: usize,
    pub duration_ms: u64,
    pub system_count: usize,
}

/// Replay engine that feeds a recording through a shared store.
pub struct ReplayEngine {
    config: ReplayConfig,
    state: Arc<ReplayState>,
    store: SharedStore,
    /// Advanced to each replayed timestamp when staleness follows the replay
    clock: Option<ManualClock>,
    records: Vec<DecodedRecord>,
    malformed_lines: usize,
}

impl ReplayEngine {
    /// Create a new replay engine from a JSONL file.
    pub fn from_jsonl(
        config: ReplayConfig,
        store: SharedStore,
        clock: Option<ManualClock>,
    ) -> Result<Self, ReplayError> {
        let path = Path::new(&config.path);
        if !path.exists() {
            return Err(ReplayError::FileNotFound(config.path.clone()));
        }

        let (records, malformed_lines) = Self::parse_jsonl(path)?;
        if records.is_empty() {
            return Err(ReplayError::EmptyDataset);
        }

        let state = Arc::new(ReplayState::default());
        state.total_records.store(records.len(), Ordering::SeqCst);

        info!(
            "Loaded recording: {} records, {} malformed lines skipped",
            records.len(),
            malformed_lines
        );

        Ok(Self {
            config,
            state,
            store,
            clock,
            records,
            malformed_lines,
        })
    }

    /// Parse a JSONL file into records, counting lines that fail to parse.
    fn parse_jsonl(path: &Path) -> Result<(Vec<DecodedRecord>, usize), ReplayError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        let mut malformed = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<DecodedRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping line {}: {}", line_no + 1, e);
                    increment_malformed_records();
                    malformed += 1;
                }
            }
        }

        Ok((records, malformed))
    }

    /// Get the replay state.
    pub fn state(&self) -> Arc<ReplayState> {
        Arc::clone(&self.state)
    }

    /// Start the replay loop (runs until the recording ends or is stopped).
    pub async fn run(&self) {
        self.state.running.store(true, Ordering::SeqCst);
        info!(
            "Starting replay: speed={}, loop={}",
            self.config.speed, self.config.loop_replay
        );

        loop {
            if !self.state.running.load(Ordering::SeqCst) {
                break;
            }

            if self.state.paused.load(Ordering::SeqCst) {
                sleep(Duration::from_millis(100)).await;
                continue;
            }

            let position = self.state.position.load(Ordering::SeqCst);

            if position >= self.records.len() {
                if self.config.loop_replay {
                    info!("Recording complete, looping...");
                    self.restart();
                    continue;
                } else {
                    info!("Recording complete, stopping");
                    self.state.running.store(false, Ordering::SeqCst);
                    break;
                }
            }

            let record = &self.records[position];
            self.process_record(record, position);

            self.state.position.fetch_add(1, Ordering::SeqCst);
            update_replay_metrics(position + 1, self.records.len(), self.config.speed);

            let sleep_ms = self
                .records
                .get(position + 1)
                .map_or(0, |next| self.pacing_ms(record.t, next.t));
            if sleep_ms > 0 {
                sleep(Duration::from_millis(sleep_ms)).await;
            } else {
                // unpaced replay must still let handlers and the runtime run
                yield_now().await;
            }
        }
    }

    /// Milliseconds to wait between two records at the configured speed.
    fn pacing_ms(&self, current_t: u64, next_t: u64) -> u64 {
        if self.config.speed <= 0.0 {
            return 0;
        }
        (next_t.saturating_sub(current_t) as f64 / self.config.speed) as u64
    }

    /// Apply a single record.
    fn process_record(&self, record: &DecodedRecord, position: usize) {
        debug!(
            "Applying record {} sysid={} compid={} msg_id={} t={}",
            position, record.sysid, record.compid, record.msg_id, record.t
        );

        if let Some(ref clock) = self.clock {
            clock.advance_to(record.t);
        }
        self.store.apply(record.clone());
        increment_records_applied();
    }

    /// Rewind for another pass: timestamps restart, so stats are zeroed.
    fn restart(&self) {
        self.store.reset_stats();
        if let (Some(clock), Some(first)) = (&self.clock, self.records.first()) {
            clock.set(first.t);
        }
        self.state.position.store(0, Ordering::SeqCst);
    }

    /// Get recording info.
    pub fn dataset_info(&self) -> DatasetInfo {
        let (min_t, max_t) = self
            .records
            .iter()
            .fold((u64::MAX, 0u64), |(lo, hi), r| (lo.min(r.t), hi.max(r.t)));

        let mut systems: Vec<u8> = self.records.iter().map(|r| r.sysid).collect();
        systems.sort_unstable();
        systems.dedup();

        DatasetInfo {
            record_count: self.records.len(),
            malformed_lines: self.malformed_lines,
            duration_ms: max_t.saturating_sub(min_t),
            system_count: systems.len(),
        }
    }
}

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
