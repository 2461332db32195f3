//! Runtime performance telemetry for a desktop bookmark manager.
//!
//! The host's presentation layer delivers timing entries, DOM-mutation
//! batches, error events, and frame ticks; the collector retains them
//! in bounded per-signal buffers, fires threshold advisories, and
//! serves windowed summaries on demand.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod probes;
pub mod server;
pub mod sim;

pub use config::{ConfigError, TelemetryConfig};
pub use metrics::{
    Advisory, AdvisoryKind, AdvisoryReason, ErrorEvent, MetricsReport,
    TelemetryCollector, TimingEntry, TimingKind,
};
pub use probes::{
    DomProbe, MemoryProbe, MemoryReading, NoopDomProbe, NoopMemoryProbe,
};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Central telemetry engine — samplers push records, handlers read reports.
    pub collector: Arc<TelemetryCollector>,

    /// Simulated document the workload churns.
    pub sim_dom: Arc<sim::SimDomProbe>,

    /// Flag checked by every workload loop on each tick.
    pub sim_running: Arc<AtomicBool>,

    /// Handle to the spawned workload task so we can await clean shutdown.
    pub sim_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}
