use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MonitorStatus {
    pub monitoring: bool,
    pub message: String,
}

// ─── POST /api/monitor/start ─────────────────────────────────────

pub async fn start_monitor(
    State(state): State<Arc<AppState>>,
) -> Json<MonitorStatus> {
    state.collector.start().await;
    Json(MonitorStatus {
        monitoring: state.collector.is_monitoring(),
        message: if state.collector.is_monitoring() {
            "Monitoring started".into()
        } else {
            "Telemetry is disabled by configuration".into()
        },
    })
}

// ─── POST /api/monitor/stop ──────────────────────────────────────

pub async fn stop_monitor(
    State(state): State<Arc<AppState>>,
) -> Json<MonitorStatus> {
    state.collector.stop().await;
    Json(MonitorStatus {
        monitoring: false,
        message: "Monitoring stopped; records retained until clear".into(),
    })
}

// ─── GET /api/monitor/status ─────────────────────────────────────

pub async fn monitor_status(
    State(state): State<Arc<AppState>>,
) -> Json<MonitorStatus> {
    let monitoring = state.collector.is_monitoring();
    Json(MonitorStatus {
        monitoring,
        message: if monitoring {
            "Monitoring in progress".into()
        } else {
            "Idle".into()
        },
    })
}
