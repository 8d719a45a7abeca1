//! Orchestrator probe endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info};

use super::{request_host, AppState};

/// `/alive` — always 200.
///
/// Failing this makes the orchestrator restart the process, so it keeps
/// passing during the shutdown drain.
pub async fn alive(headers: HeaderMap) -> StatusCode {
    debug!(host = request_host(&headers), "handling liveness request");
    StatusCode::OK
}

/// `/ready` — 200 until shutdown begins, then 500.
///
/// Failing this takes the process out of the service endpoint list, so no
/// new traffic arrives while it drains.
pub async fn ready(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if state.shutdown.is_shutting_down() {
        info!(host = request_host(&headers), "failing readiness request");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    debug!(host = request_host(&headers), "handling readiness request");
    StatusCode::OK
}
