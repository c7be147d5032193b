// mavstore Exporter - HTTP query API
// Copyright (c) 2026 The mavstore authors
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! JSON endpoints over the store's read and write surface.
//!
//! Unknown (sysid, compid, msg_id) combinations answer 404; an invalid
//! history size answers 400.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use mavstore::{CompId, MsgBrief, MsgDetail, MsgId, RawValue, SharedStore, StoreError, SysId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// API errors mapped to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn not_found(sysid: SysId, compid: Option<CompId>, msg_id: MsgId) -> ApiError {
    match compid {
        Some(compid) => ApiError::NotFound(format!(
            "sysid={} compid={} msg_id={}",
            sysid, compid, msg_id
        )),
        None => ApiError::NotFound(format!("sysid={} msg_id={}", sysid, msg_id)),
    }
}

/// Routes under `/api`.
pub fn routes() -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/api/sysids", get(list_sysids))
        .route("/api/sysids/:sysid/compids", get(list_compids))
        .route("/api/sysids/:sysid/msgs", get(list_msg_ids))
        .route("/api/raw/:sysid/:msg_id", get(get_raw))
        .route("/api/brief/:sysid/:compid/:msg_id", get(get_brief))
        .route("/api/detail/:sysid/:compid/:msg_id", get(get_detail))
        .route("/api/admin/reset", post(reset_stats))
        .route("/api/admin/stale_ms", put(set_stale_ms))
        .route("/api/admin/history_size", put(set_history_size));

    #[cfg(feature = "replay")]
    let router = router
        .route("/api/admin/replay/pause", post(pause_replay))
        .route("/api/admin/replay/resume", post(resume_replay))
        .route("/api/admin/replay/stop", post(stop_replay));

    router
}

/// Optional component filter.
#[derive(Debug, Default, Deserialize)]
pub struct CompidQuery {
    pub compid: Option<CompId>,
}

/// Detail options.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    #[serde(default)]
    pub history: bool,
}

#[derive(Debug, Deserialize)]
pub struct StaleMsBody {
    pub ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct HistorySizeBody {
    pub size: usize,
}

fn store(state: &AppState) -> &SharedStore {
    &state.store
}

async fn list_sysids(State(state): State<Arc<AppState>>) -> Json<Vec<SysId>> {
    Json(store(&state).list_sysids())
}

async fn list_compids(
    State(state): State<Arc<AppState>>,
    Path(sysid): Path<SysId>,
) -> Json<Vec<CompId>> {
    Json(store(&state).list_compids(sysid))
}

async fn list_msg_ids(
    State(state): State<Arc<AppState>>,
    Path(sysid): Path<SysId>,
    Query(query): Query<CompidQuery>,
) -> Json<Vec<MsgId>> {
    Json(store(&state).list_msg_ids(sysid, query.compid))
}

async fn get_raw(
    State(state): State<Arc<AppState>>,
    Path((sysid, msg_id)): Path<(SysId, MsgId)>,
    Query(query): Query<CompidQuery>,
) -> Result<Json<RawValue>, ApiError> {
    store(&state)
        .get_raw(sysid, msg_id, query.compid)
        .map(Json)
        .ok_or_else(|| not_found(sysid, query.compid, msg_id))
}

async fn get_brief(
    State(state): State<Arc<AppState>>,
    Path((sysid, compid, msg_id)): Path<(SysId, CompId, MsgId)>,
) -> Result<Json<MsgBrief>, ApiError> {
    store(&state)
        .get_msg_brief(sysid, compid, msg_id)
        .map(Json)
        .ok_or_else(|| not_found(sysid, Some(compid), msg_id))
}

async fn get_detail(
    State(state): State<Arc<AppState>>,
    Path((sysid, compid, msg_id)): Path<(SysId, CompId, MsgId)>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<MsgDetail>, ApiError> {
    store(&state)
        .get_msg_detail(sysid, compid, msg_id, query.history)
        .map(Json)
        .ok_or_else(|| not_found(sysid, Some(compid), msg_id))
}

async fn reset_stats(State(state): State<Arc<AppState>>) -> StatusCode {
    store(&state).reset_stats();
    tracing::info!("Stats reset via API");
    StatusCode::NO_CONTENT
}

async fn set_stale_ms(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StaleMsBody>,
) -> StatusCode {
    store(&state).set_stale_ms(body.ms);
    tracing::info!("Staleness threshold set to {}ms", body.ms);
    StatusCode::NO_CONTENT
}

async fn set_history_size(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HistorySizeBody>,
) -> Result<StatusCode, ApiError> {
    store(&state).set_history_size(body.size)?;
    tracing::info!("History size set to {}", body.size);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "replay")]
fn replay_state(state: &AppState) -> Result<&crate::replay::ReplayState, ApiError> {
    state
        .replay_state
        .as_deref()
        .ok_or_else(|| ApiError::NotFound("no replay loaded".to_string()))
}

#[cfg(feature = "replay")]
async fn pause_replay(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    replay_state(&state)?.set_paused(true);
    tracing::info!("Replay paused via API");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "replay")]
async fn resume_replay(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    replay_state(&state)?.set_paused(false);
    tracing::info!("Replay resumed via API");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(feature = "replay")]
async fn stop_replay(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    replay_state(&state)?.stop();
    tracing::info!("Replay stopped via API");
    Ok(StatusCode::NO_CONTENT)
}
