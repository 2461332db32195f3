use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the diagnostics `Router`: metrics queries, monitor lifecycle,
/// and simulated-workload control.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Metrics query surface ───────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .route("/api/metrics/export", get(stream::export_metrics))
        .route("/api/metrics/clear", post(stream::clear_metrics))
        // ── Monitor lifecycle ───────────────────────────────────
        .route("/api/monitor/start", post(handlers::monitor::start_monitor))
        .route("/api/monitor/stop", post(handlers::monitor::stop_monitor))
        .route("/api/monitor/status", get(handlers::monitor::monitor_status))
        // ── Simulated workload control ──────────────────────────
        .route("/api/sim/start", post(handlers::sim::start_sim))
        .route("/api/sim/stop", post(handlers::sim::stop_sim))
        .route("/api/sim/status", get(handlers::sim::sim_status))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
