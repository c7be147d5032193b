// mavstore Exporter - HTTP query API and Prometheus exporter for mavstore
// Copyright (c) 2026 The mavstore authors
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! # mavstore Exporter
//!
//! Serves the telemetry store over HTTP, with Prometheus metrics and
//! optional replay of a recorded JSONL telemetry log.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a recording at 10x, staleness following the recording
//! mavstore-exporter --input flight.jsonl --speed 10.0 --clock replay
//!
//! # Run on custom port with a tighter staleness threshold
//! mavstore-exporter --input flight.jsonl --port 9090 --stale-ms 1000
//! ```

mod api;
mod metrics;

#[cfg(feature = "replay")]
mod replay;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use clap::{Parser, ValueEnum};
use mavstore::{ManualClock, SharedStore, StoreConfig, StoreSummary};
use metrics::{encode_metrics, update_store_metrics};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "replay")]
use replay::{DatasetInfo, ReplayConfig, ReplayEngine, ReplayState};

/// Time source used for staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClockMode {
    /// Wall-clock time
    Wall,
    /// Timestamp of the most recently replayed record
    Replay,
}

/// mavstore HTTP exporter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "9100")]
    port: u16,

    /// JSONL recording of decoded records to replay
    #[arg(short, long)]
    input: Option<String>,

    /// Replay speed multiplier (1.0 = real-time, 0 = as fast as possible)
    #[arg(short, long, default_value = "1.0")]
    speed: f64,

    /// Loop the replay when it reaches the end
    #[arg(short, long, default_value = "false")]
    loop_replay: bool,

    /// Time source for staleness decisions
    #[arg(long, value_enum, default_value = "wall")]
    clock: ClockMode,

    /// Staleness threshold in milliseconds
    #[arg(long, default_value_t = mavstore::DEFAULT_STALE_MS)]
    stale_ms: u64,

    /// Samples retained per message stream
    #[arg(long, default_value_t = mavstore::DEFAULT_HISTORY_SIZE)]
    history_size: usize,

    /// Smoothing factor for the rate estimate, in (0, 1]
    #[arg(long, default_value_t = mavstore::DEFAULT_EMA_ALPHA)]
    ema_alpha: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Application state shared across handlers.
pub(crate) struct AppState {
    pub(crate) store: SharedStore,
    #[cfg(feature = "replay")]
    pub(crate) replay_state: Option<Arc<ReplayState>>,
    #[cfg(feature = "replay")]
    dataset_info: Option<DatasetInfo>,
    start_time: Instant,
}

impl AppState {
    pub(crate) fn new(store: SharedStore) -> Self {
        Self {
            store,
            #[cfg(feature = "replay")]
            replay_state: None,
            #[cfg(feature = "replay")]
            dataset_info: None,
            start_time: Instant::now(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("mavstore Exporter v{}", env!("CARGO_PKG_VERSION"));

    let manual_clock = match args.clock {
        ClockMode::Wall => None,
        ClockMode::Replay => Some(ManualClock::new(0)),
    };

    let mut config = StoreConfig::default()
        .with_stale_ms(args.stale_ms)
        .with_history_size(args.history_size)
        .with_ema_alpha(args.ema_alpha);
    if let Some(clock) = &manual_clock {
        config = config.with_clock(clock.clone());
    }
    let store = SharedStore::with_config(config)?;

    info!(
        "Store configured: stale_ms={}, history_size={}, ema_alpha={}, clock={:?}",
        args.stale_ms, args.history_size, args.ema_alpha, args.clock
    );

    // Initialize replay engine if a recording was provided
    #[cfg(feature = "replay")]
    let (replay_state, dataset_info) = if let Some(path) = args.input.clone() {
        let config = ReplayConfig {
            path,
            speed: args.speed,
            loop_replay: args.loop_replay,
        };

        match ReplayEngine::from_jsonl(config, store.clone(), manual_clock) {
            Ok(engine) => {
                let state = engine.state();
                let info = engine.dataset_info();

                info!(
                    "Recording loaded: {} records from {} systems ({} malformed lines)",
                    info.record_count, info.system_count, info.malformed_lines
                );

                // Start replay in background
                tokio::spawn(async move {
                    engine.run().await;
                });

                (Some(state), Some(info))
            }
            Err(e) => {
                tracing::error!("Failed to load recording: {}", e);
                (None, None)
            }
        }
    } else {
        info!("No recording specified, serving an empty store");
        (None, None)
    };

    #[cfg(not(feature = "replay"))]
    if args.input.is_some() {
        tracing::warn!("Replay feature not enabled, ignoring --input argument");
    }

    let state = Arc::new(AppState {
        #[cfg(feature = "replay")]
        replay_state,
        #[cfg(feature = "replay")]
        dataset_info,
        ..AppState::new(store)
    });

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting server on http://{}", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the full router.
fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .merge(api::routes())
        .with_state(state)
}

/// Root handler - shows a simple HTML page.
async fn root_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>mavstore Exporter</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }
        h1 { color: #2c3e50; }
        a { color: #3498db; text-decoration: none; }
        .endpoints { background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .endpoint { margin: 10px 0; }
        code { background: #e9ecef; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>mavstore Exporter</h1>
    <p>Latest values and update rates of decoded MAVLink telemetry.</p>

    <div class="endpoints">
        <h2>Endpoints</h2>
        <div class="endpoint"><a href="/metrics">/metrics</a> - Prometheus metrics</div>
        <div class="endpoint"><a href="/health">/health</a> - Health check</div>
        <div class="endpoint"><a href="/status">/status</a> - Status information (JSON)</div>
        <div class="endpoint"><a href="/api/sysids">/api/sysids</a> - Systems seen</div>
        <div class="endpoint"><code>/api/sysids/{sysid}/compids</code> - Components of a system</div>
        <div class="endpoint"><code>/api/sysids/{sysid}/msgs?compid=</code> - Message ids of a system</div>
        <div class="endpoint"><code>/api/raw/{sysid}/{msg_id}?compid=</code> - Latest payload</div>
        <div class="endpoint"><code>/api/brief/{sysid}/{compid}/{msg_id}</code> - Stream summary</div>
        <div class="endpoint"><code>/api/detail/{sysid}/{compid}/{msg_id}?history=true</code> - Stream detail</div>
        <div class="endpoint"><code>POST /api/admin/replay/{pause,resume,stop}</code> - Replay control</div>
    </div>

    <h2>Metrics</h2>
    <ul>
        <li><code>mavstore_entries</code> - Message streams tracked</li>
        <li><code>mavstore_stale_entries</code> - Streams past the staleness threshold</li>
        <li><code>mavstore_message_rate_hz</code> - Smoothed rate per stream</li>
        <li><code>mavstore_message_count</code> - Messages per stream since reset</li>
        <li><code>mavstore_records_applied_total</code> - Records applied</li>
    </ul>
</body>
</html>"#,
    )
}

/// Metrics handler - returns Prometheus text format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_store_metrics(&state.store.lock());
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; charset=utf-8")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("Content-Type", "text/plain; charset=utf-8")],
            e.to_string(),
        ),
    }
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Status information response.
#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    stale_ms: u64,
    history_size: usize,
    store: StoreSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay: Option<ReplayStatus>,
}

/// Replay status information.
#[derive(Serialize)]
struct ReplayStatus {
    running: bool,
    paused: bool,
    position: usize,
    total_records: usize,
    progress_percent: f64,
    system_count: usize,
    malformed_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
}

/// Status handler - returns JSON status information.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    #[cfg(feature = "replay")]
    let replay = state.replay_state.as_ref().map(|replay_state| {
        use std::sync::atomic::Ordering;

        let position = replay_state.position.load(Ordering::SeqCst);
        let total = replay_state.total_records.load(Ordering::SeqCst);
        let progress = if total > 0 {
            (position as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        ReplayStatus {
            running: replay_state.running.load(Ordering::SeqCst),
            paused: replay_state.paused.load(Ordering::SeqCst),
            position,
            total_records: total,
            progress_percent: progress,
            system_count: state
                .dataset_info
                .as_ref()
                .map(|i| i.system_count)
                .unwrap_or(0),
            malformed_lines: state
                .dataset_info
                .as_ref()
                .map(|i| i.malformed_lines)
                .unwrap_or(0),
            duration_ms: state.dataset_info.as_ref().map(|i| i.duration_ms),
        }
    });

    #[cfg(not(feature = "replay"))]
    let replay: Option<ReplayStatus> = None;

    let (stale_ms, history_size, summary) = {
        let store = state.store.lock();
        (store.stale_ms(), store.history_size(), store.summary())
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        stale_ms,
        history_size,
        store: summary,
        replay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavstore::DecodedRecord;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["mavstore-exporter"]);
        assert_eq!(args.port, 9100);
        assert_eq!(args.clock, ClockMode::Wall);
        assert_eq!(args.stale_ms, mavstore::DEFAULT_STALE_MS);
        assert_eq!(args.history_size, mavstore::DEFAULT_HISTORY_SIZE);
        assert!(!args.loop_replay);
    }

    #[test]
    fn test_args_replay_clock() {
        let args = Args::parse_from([
            "mavstore-exporter",
            "--input",
            "flight.jsonl",
            "--clock",
            "replay",
            "--history-size",
            "8",
        ]);
        assert_eq!(args.input.as_deref(), Some("flight.jsonl"));
        assert_eq!(args.clock, ClockMode::Replay);
        assert_eq!(args.history_size, 8);
    }

    #[tokio::test]
    async fn test_status_handler_reports_store() {
        let store = SharedStore::with_config(StoreConfig::default().with_clock(|| 500u64)).unwrap();
        store.apply(DecodedRecord::new(100, 1, 1, 0));
        store.apply(DecodedRecord::new(200, 2, 1, 0));
        let state = Arc::new(AppState::new(store));

        let Json(status) = status_handler(State(state)).await;
        assert_eq!(status.store.systems, 2);
        assert_eq!(status.store.entries, 2);
        assert_eq!(status.stale_ms, mavstore::DEFAULT_STALE_MS);
        assert!(status.replay.is_none());
    }

    #[tokio::test]
    async fn test_metrics_handler_ok() {
        let state = Arc::new(AppState::new(SharedStore::default()));
        let response = metrics_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
