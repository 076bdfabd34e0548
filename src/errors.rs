//! Crate-wide error taxonomy. Every fallible operation in the engine
//! resolves to one of these variants, which the HTTP layer turns into a
//! JSON error body via [`IntoResponse`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or invalid request: unknown effect name, out-of-range
    /// brightness, bad preset id, etc. Maps to 400.
    #[error("{0}")]
    Client(String),

    /// The request is well-formed but inconsistent with the engine's
    /// current state, e.g. applying a hex-only effect to a scale layout.
    /// Maps to 400.
    #[error("{0}")]
    State(String),

    /// A named resource (effect, preset) doesn't exist. Maps to 404.
    #[error("{0}")]
    NotFound(String),

    /// The pixel sink (mock or hardware) failed to accept a frame. Maps
    /// to 502 — the client's request was fine, the driver wasn't.
    #[error("driver error: {0}")]
    Driver(String),

    /// Loading or saving the persisted config blob failed. Maps to 500.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// An effect implementation panicked or produced an invalid frame.
    /// Contained by the render loop; surfaced here only when reported
    /// through an API that asks about effect health. Maps to 500.
    #[error("effect error: {0}")]
    Effect(String),
}

impl EngineError {
    fn status(&self) -> StatusCode {
        match self {
            EngineError::Client(_) => StatusCode::BAD_REQUEST,
            EngineError::State(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Driver(_) => StatusCode::BAD_GATEWAY,
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Effect(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Persistence(e.to_string())
    }
}
