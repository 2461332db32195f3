use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use perf_telemetry::sim::{SimDomProbe, SimMemoryProbe};
use perf_telemetry::{AppState, TelemetryCollector, TelemetryConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   📈  RUNTIME PERFORMANCE OBSERVATORY            ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Build the collector with simulated probes ─────────────
    // The demo samples memory every 5 s instead of the production 30 s
    // so the dashboard moves.
    let config = TelemetryConfig::default()
        .with_sampling_interval(Duration::from_secs(5));

    let memory_probe = Arc::new(SimMemoryProbe::new(2024));
    let dom_probe = Arc::new(SimDomProbe::new(400));

    let collector = Arc::new(
        TelemetryCollector::new(config)
            .expect("default demo config is valid")
            .with_memory_probe(memory_probe)
            .with_dom_probe(dom_probe.clone()),
    );

    // ── 2. Arm the samplers ──────────────────────────────────────
    collector.start().await;
    info!("telemetry monitoring started");

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        collector,
        sim_dom: dom_probe,
        sim_running: Arc::new(AtomicBool::new(false)),
        sim_handle: tokio::sync::Mutex::new(None),
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = perf_telemetry::server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to port 3000 — is it already in use?");

    println!("Server listening on http://localhost:3000");
    println!("Metrics JSON    → http://localhost:3000/api/metrics");
    println!("Metrics SSE     → http://localhost:3000/api/metrics/stream");
    println!("Start workload  → POST http://localhost:3000/api/sim/start");
    println!();

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
