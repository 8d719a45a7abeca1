//! HTTP error type for axum handlers.
//!
//! [`AppError`] wraps [`anyhow::Error`] and renders as a 500 response, so a
//! handler can return `Result<T, AppError>` and use `?` on anything that
//! converts into `anyhow::Error` (hostname lookups return `io::Error`).
//! The error chain goes to the log only; callers get a fixed message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Body text for every handler failure.
const PUBLIC_MESSAGE: &str = "internal server error";

/// A handler failure. Always rendered as `500 Internal Server Error`.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let chain = format!("{:#}", self.0);
        tracing::warn!(error = %chain, "handler error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": PUBLIC_MESSAGE })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self(e.into())
    }
}
