pub mod auth;
pub mod publish;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Handler failure: status plus an `{"error": ...}` body.
pub type HandlerError = (StatusCode, Json<Value>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (status, Json(json!({ "error": message.into() })))
}

/// Map an unexpected failure to a 500 carrying the error's message.
pub fn internal_error(e: anyhow::Error) -> HandlerError {
    tracing::error!("Unexpected error: {:#}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
}
