use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::sim::SimProfile;
use crate::AppState;

use super::AppError;

#[derive(Debug, Serialize)]
pub struct SimStatus {
    pub running: bool,
    pub message: String,
}

// ─── POST /api/sim/start ─────────────────────────────────────────

pub async fn start_sim(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<SimProfile>,
) -> Result<Json<SimStatus>, AppError> {
    // Guard: only one workload at a time
    if state.sim_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning("simulated workload"));
    }

    if profile.duration_secs == 0 || profile.duration_secs > 600 {
        return Err(AppError::BadRequest(
            "duration_secs must be between 1 and 600".into(),
        ));
    }
    if profile.target_fps == 0 || profile.target_fps > 240 {
        return Err(AppError::BadRequest(
            "target_fps must be between 1 and 240".into(),
        ));
    }
    if profile.error_rate_pct > 100 {
        return Err(AppError::BadRequest(
            "error_rate_pct must be between 0 and 100".into(),
        ));
    }

    // Flip the flag BEFORE spawning so the loops see it immediately
    state.sim_running.store(true, Ordering::SeqCst);

    let msg = format!(
        "Started: {}s at {} fps, {}% error rate",
        profile.duration_secs, profile.target_fps, profile.error_rate_pct,
    );

    let running = state.sim_running.clone();
    let collector = state.collector.clone();
    let dom = state.sim_dom.clone();

    let handle = tokio::spawn(async move {
        crate::sim::run(running, collector, dom, profile).await;
    });

    let mut guard = state.sim_handle.lock().await;
    *guard = Some(handle);

    Ok(Json(SimStatus { running: true, message: msg }))
}

// ─── POST /api/sim/stop ──────────────────────────────────────────

pub async fn stop_sim(
    State(state): State<Arc<AppState>>,
) -> Json<SimStatus> {
    if !state.sim_running.load(Ordering::SeqCst) {
        return Json(SimStatus {
            running: false,
            message: "No workload is running".into(),
        });
    }

    state.sim_running.store(false, Ordering::SeqCst);

    // Await the workload task so we know it's fully stopped
    let mut guard = state.sim_handle.lock().await;
    if let Some(handle) = guard.take() {
        let _ = handle.await;
    }

    Json(SimStatus {
        running: false,
        message: "Workload stopped".into(),
    })
}

// ─── GET /api/sim/status ─────────────────────────────────────────

pub async fn sim_status(State(state): State<Arc<AppState>>) -> Json<SimStatus> {
    let running = state.sim_running.load(Ordering::SeqCst);
    Json(SimStatus {
        running,
        message: if running {
            "Workload in progress".into()
        } else {
            "Idle".into()
        },
    })
}
