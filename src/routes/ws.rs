// WebSocket stats stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::collector::StatsCollector;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_stats(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let collector = state.collector.clone();
    let interval_ms = state.config.publishing.stats_frequency_ms;
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_stats(socket, collector, interval_ms).await {
            tracing::info!("Stats stream error: {}", e);
        }
    })
}

/// Pushes one freshly collected report per tick until the client goes away.
async fn stream_stats(
    mut socket: WebSocket,
    collector: Arc<StatsCollector>,
    interval_ms: u64,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to stats stream");
    let mut tick = tokio::time::interval(Duration::from_millis(interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let report = collector.collect().await?;
                let json = serde_json::to_string(&report)?;
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from stats stream");
    Ok(())
}
