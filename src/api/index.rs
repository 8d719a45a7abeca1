//! Index greeting, served for `/` and any path without its own route.

use anyhow::Context;
use axum::{extract::State, http::HeaderMap};
use tracing::info;

use super::{request_host, AppState};
use crate::error::AppError;

/// Greeting prefix; the machine hostname is appended.
const GREETING: &str = "Hello! I am here! - ";

/// `GET /` — `"Hello! I am here! - <hostname>"`, or 500 if the lookup fails.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<String, AppError> {
    info!(host = request_host(&headers), "handling web request");
    let hostname = state.host.hostname().context("looking up hostname")?;
    Ok(format!("{GREETING}{hostname}"))
}
