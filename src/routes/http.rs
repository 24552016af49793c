// GET handlers: version, system stats

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/system-stats: one collection cycle. Callers check `source` for mock data.
pub(super) async fn system_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.collector.collect().await {
        Ok(report) => axum::Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "system stats collection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
