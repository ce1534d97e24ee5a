use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Stored migrations, or `None` if the store could not be read.
    pub migrations: Option<usize>,
    /// Stored evaluations, or `None` if the store could not be read.
    pub evaluations: Option<usize>,
}

/// GET /health -- returns service status and job counts.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.service.counts().await.ok();

    Json(HealthResponse {
        status: if counts.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        migrations: counts.map(|c| c.migrations),
        evaluations: counts.map(|c| c.evaluations),
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
