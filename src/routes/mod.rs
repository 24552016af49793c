// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::collector::StatsCollector;
use crate::config::AppConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) collector: Arc<StatsCollector>,
    pub(crate) config: AppConfig,
}

pub fn app(collector: Arc<StatsCollector>, config: AppConfig) -> Router {
    let state = AppState { collector, config };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/system-stats", get(http::system_stats_handler)) // GET /api/system-stats
        .route("/ws/stats", get(ws::ws_stats)) // WS /ws/stats
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
