//! services/api/src/web/mod.rs
//!
//! The axum web layer: handlers, auth middleware, shared state and the
//! OpenAPI master definition.

pub mod auth;
pub mod chatbot;
pub mod entries;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod stories;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use axum::http::StatusCode;
use life_calendar_core::ports::PortError;
use tracing::error;

/// Maps a core port error to an HTTP response pair. Unexpected storage
/// errors are logged and reported opaquely; everything else carries its
/// message to the caller.
pub fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::GenerationFailed(detail) => (
            StatusCode::BAD_GATEWAY,
            format!("AI failed to generate content: {}", detail),
        ),
        PortError::Unexpected(msg) => {
            error!("Unexpected storage error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
