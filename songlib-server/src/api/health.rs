//! Liveness probe for songlib-server

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /health`; fixed for the lifetime of the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

impl HealthResponse {
    /// Report for this build
    pub const fn current() -> Self {
        Self {
            status: "ok",
            module: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(|| async { Json(HealthResponse::current()) }))
}
