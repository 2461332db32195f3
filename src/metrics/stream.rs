use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::AppState;

use super::collector::MetricsReport;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Returns a single JSON report — useful for curl / debugging.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<MetricsReport> {
    Json(state.collector.report())
}

// ─── GET /api/metrics/export ─────────────────────────────────────
/// Serialized textual form of the report, stamped with wall-clock
/// time, for saving to disk.

pub async fn export_metrics(State(state): State<Arc<AppState>>) -> String {
    state.collector.export()
}

// ─── POST /api/metrics/clear ─────────────────────────────────────
/// Resets every sequence, timer, and counter. Monitoring keeps going.

pub async fn clear_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    state.collector.clear();
    Json(serde_json::json!({ "cleared": true }))
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes a full `MetricsReport` as JSON every 500 ms.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_millis(500));

    let stream = IntervalStream::new(interval).map(move |_| {
        let report = state.collector.report();
        let json = serde_json::to_string(&report).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
