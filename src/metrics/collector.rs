use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::{ConfigError, TelemetryConfig};
use crate::probes::{DomProbe, MemoryProbe, MemoryReading};

use super::advisory::{evaluate_fps, evaluate_memory, Advisory};
use super::fps::FrameWindow;
use super::store::{MetricStore, StoreSnapshot};
use super::summary::MetricsSummary;
use super::tables::{CounterTable, TimerTable};
use super::{
    DomSample, ErrorEvent, ErrorKind, MemorySample, NetworkSample,
    RenderSample, TimingEntry, TimingKind,
};

/// How many advisories the outbound channel buffers before slow
/// subscribers start lagging.
const ADVISORY_CHANNEL_CAPACITY: usize = 64;

/// Caller-owned telemetry engine.
///
/// The host delivers notifications (`on_timing_entry`, `on_dom_mutations`,
/// `on_error`, `on_frame`), the collector normalizes them into bounded
/// per-signal buffers, and the presentation layer subscribes to advisory
/// signals and polls `report()`/`export()`.
///
/// All mutable state sits behind one `Mutex`, so interleaved delivery
/// from timer tasks and notification callbacks serializes naturally;
/// append-then-prune is atomic under the lock.
pub struct TelemetryCollector {
    config: TelemetryConfig,
    /// Monotonic anchor; every timestamp is ms since construction.
    epoch: Instant,
    /// Gates every sampler write. Flipped by `start`/`stop`.
    monitoring: AtomicBool,
    inner: Mutex<Inner>,
    advisories: broadcast::Sender<Advisory>,
    memory_probe: Option<Arc<dyn MemoryProbe>>,
    dom_probe: Option<Arc<dyn DomProbe>>,
    /// Handle to the spawned memory poller so `stop` can cancel it.
    memory_task: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

struct Inner {
    store: MetricStore,
    timers: TimerTable,
    counters: CounterTable,
    frame_window: FrameWindow,
}

/// Full query-surface payload: every retained record plus the windowed
/// summary, counters, and lifecycle state.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub uptime_ms: u64,
    pub monitoring: bool,
    pub records: StoreSnapshot,
    pub counters: HashMap<String, u64>,
    pub summary: MetricsSummary,
}

/// Wrapper serialized by `export()`, stamped with wall-clock time.
#[derive(Debug, Serialize)]
struct ExportDocument {
    generated_at: DateTime<Utc>,
    report: MetricsReport,
}

impl TelemetryCollector {
    /// Validate the configuration and build an idle collector. With
    /// `enable_metrics` false the instance is permanently inert: every
    /// ingestion call is a no-op and reports come back empty.
    pub fn new(config: TelemetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (advisories, _) = broadcast::channel(ADVISORY_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Mutex::new(Inner {
                store: MetricStore::new(config.max_samples),
                timers: TimerTable::default(),
                counters: CounterTable::default(),
                frame_window: FrameWindow::new(0),
            }),
            config,
            epoch: Instant::now(),
            monitoring: AtomicBool::new(false),
            advisories,
            memory_probe: None,
            dom_probe: None,
            memory_task: tokio::sync::Mutex::new(None),
        })
    }

    /// Inject the heap-introspection capability. Without one the memory
    /// sampler never activates.
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    /// Inject the document-introspection capability. Without one the
    /// DOM-churn sampler never activates.
    pub fn with_dom_probe(mut self, probe: Arc<dyn DomProbe>) -> Self {
        self.dom_probe = Some(probe);
        self
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Arm every enabled sampler. Idempotent; a second call while
    /// running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        if !self.config.enable_metrics {
            debug!("telemetry disabled by config; start is a no-op");
            return;
        }
        if self.monitoring.swap(true, Ordering::SeqCst) {
            return;
        }

        // Fps windows restart from "now" so a stop/start cycle does not
        // inherit a stale window.
        self.inner.lock().frame_window.reset(self.now_ms());

        if self.config.enable_memory_monitoring {
            match &self.memory_probe {
                Some(probe) => {
                    let collector = Arc::clone(self);
                    let probe = Arc::clone(probe);
                    let interval = self.config.sampling_interval;

                    let handle = tokio::spawn(async move {
                        let mut ticker = tokio::time::interval(interval);
                        ticker.set_missed_tick_behavior(
                            MissedTickBehavior::Delay,
                        );
                        // interval fires immediately; skip that tick
                        ticker.tick().await;
                        loop {
                            ticker.tick().await;
                            if !collector.is_monitoring() {
                                break;
                            }
                            if let Some(reading) = probe.read() {
                                collector.record_memory(reading);
                            }
                        }
                    });

                    let mut guard = self.memory_task.lock().await;
                    *guard = Some(handle);
                }
                None => {
                    debug!("no memory probe; skipping memory sampler");
                }
            }
        }
    }

    /// Detach every sampler. Idempotent and safe to call before
    /// `start`; retained records survive until `clear`.
    pub async fn stop(&self) {
        if !self.monitoring.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut guard = self.memory_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
            // JoinError from the abort is expected
            let _ = handle.await;
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    /// Subscribe to outbound advisory signals. Best-effort: advisories
    /// emitted with no subscribers are dropped.
    pub fn subscribe_advisories(&self) -> broadcast::Receiver<Advisory> {
        self.advisories.subscribe()
    }

    // ── Event-driven samplers ───────────────────────────────────

    /// Ingest one performance-timing entry from the host's channel.
    pub fn on_timing_entry(&self, entry: TimingEntry) {
        if !self.ingesting() {
            return;
        }
        match entry.kind {
            TimingKind::Measure => {
                if !self.config.enable_render_monitoring {
                    return;
                }
                self.inner.lock().store.push_render(RenderSample {
                    name: entry.name,
                    duration_ms: entry.duration_ms,
                    start_ms: entry.start_ms,
                });
            }
            TimingKind::Resource => {
                let now = self.now_ms();
                self.inner.lock().store.push_network(NetworkSample {
                    name: entry.name,
                    duration_ms: entry.duration_ms,
                    transfer_size_bytes: entry
                        .transfer_size_bytes
                        .unwrap_or(0),
                    timestamp_ms: now,
                });
            }
            // Paint entries are observed but never retained.
            TimingKind::Paint => {
                debug!(
                    name = %entry.name,
                    duration_ms = entry.duration_ms,
                    "paint timing entry",
                );
            }
        }
    }

    /// Ingest one batched DOM-mutation notification. The document size
    /// comes from the injected probe; without one the sampler is off.
    pub fn on_dom_mutations(&self, batch_size: u64) {
        if !self.ingesting() {
            return;
        }
        let Some(probe) = &self.dom_probe else {
            debug!("no DOM probe; dropping mutation notification");
            return;
        };
        let sample = DomSample {
            node_count: probe.node_count(),
            mutation_count: batch_size,
            timestamp_ms: self.now_ms(),
        };
        self.inner.lock().store.push_dom(sample);
    }

    /// Ingest an uncaught error or unhandled rejection. These are data
    /// about the host app, never failures of the collector.
    pub fn on_error(&self, event: ErrorEvent) {
        if !self.ingesting() {
            return;
        }
        let sample = event.into_sample(self.now_ms());
        if sample.kind == ErrorKind::Runtime {
            warn!(
                message = %sample.message,
                location = sample.location.as_deref().unwrap_or("unknown"),
                "uncaught runtime error",
            );
        }
        self.inner.lock().store.push_error(sample);
    }

    // ── Polling samplers ────────────────────────────────────────

    /// Count one frame tick. Closes the ~1 s window when due, records
    /// the fps sample, and evaluates the low-fps threshold.
    pub fn on_frame(&self) {
        if !self.ingesting() {
            return;
        }
        let now = self.now_ms();
        let advisory = {
            let mut inner = self.inner.lock();
            match inner.frame_window.on_frame(now) {
                Some(sample) => {
                    inner.store.push_fps(sample);
                    evaluate_fps(&sample, self.config.fps_threshold)
                }
                None => None,
            }
        };
        if let Some(advisory) = advisory {
            self.dispatch(advisory);
        }
    }

    /// Append one heap reading and evaluate the memory threshold.
    /// Called by the spawned poller; hosts with their own memory tick
    /// source may call it directly.
    pub fn record_memory(&self, reading: MemoryReading) {
        if !self.ingesting() {
            return;
        }
        let sample = MemorySample {
            used_bytes: reading.used_bytes,
            total_bytes: reading.total_bytes,
            limit_bytes: reading.limit_bytes,
            timestamp_ms: self.now_ms(),
        };
        let advisory = {
            let mut inner = self.inner.lock();
            inner.store.push_memory(sample);
            evaluate_memory(&sample, self.config.memory_threshold_ratio)
        };
        if let Some(advisory) = advisory {
            self.dispatch(advisory);
        }
    }

    // ── Timer & counter utilities ───────────────────────────────

    /// Start (or restart) the named timer. Last start wins.
    pub fn start_timer(&self, name: &str) {
        if !self.config.enable_metrics {
            return;
        }
        let now = self.now_ms();
        self.inner.lock().timers.start_at(name, now);
    }

    /// Elapsed ms for the named timer; 0 when it was never started.
    pub fn end_timer(&self, name: &str) -> u64 {
        if !self.config.enable_metrics {
            return 0;
        }
        let now = self.now_ms();
        self.inner.lock().timers.end_at(name, now)
    }

    pub fn increment_counter(&self, name: &str) -> u64 {
        if !self.config.enable_metrics {
            return 0;
        }
        self.inner.lock().counters.increment(name)
    }

    pub fn get_counter(&self, name: &str) -> u64 {
        self.inner.lock().counters.get(name)
    }

    pub fn reset_counter(&self, name: &str) {
        self.inner.lock().counters.reset(name);
    }

    // ── Query surface ───────────────────────────────────────────

    /// Full store snapshot plus the windowed summary.
    pub fn report(&self) -> MetricsReport {
        if !self.config.enable_metrics {
            return MetricsReport {
                uptime_ms: self.now_ms(),
                monitoring: false,
                records: StoreSnapshot::empty(),
                counters: HashMap::new(),
                summary: MetricsSummary::empty(),
            };
        }

        let now = self.now_ms();
        let window_ms = self.config.summary_window.as_millis() as u64;
        let inner = self.inner.lock();
        MetricsReport {
            uptime_ms: now,
            monitoring: self.is_monitoring(),
            records: inner.store.snapshot(),
            counters: inner.counters.snapshot(),
            summary: MetricsSummary::compute(&inner.store, now, window_ms),
        }
    }

    /// Serialized textual form of `report()`, stamped with wall-clock
    /// time for offline inspection.
    pub fn export(&self) -> String {
        let doc = ExportDocument {
            generated_at: Utc::now(),
            report: self.report(),
        };
        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }

    /// Reset every sequence, timer, and counter. Monitoring state is
    /// untouched; samplers keep feeding the now-empty store.
    pub fn clear(&self) {
        let now = self.now_ms();
        let mut inner = self.inner.lock();
        inner.store.clear();
        inner.timers.clear();
        inner.counters.clear();
        inner.frame_window.reset(now);
    }

    // ── Internals ───────────────────────────────────────────────

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn ingesting(&self) -> bool {
        self.config.enable_metrics && self.is_monitoring()
    }

    fn dispatch(&self, advisory: Advisory) {
        debug!(
            kind = ?advisory.kind,
            reason = ?advisory.reason,
            observed = advisory.observed,
            "advisory dispatched",
        );
        // No subscribers is fine — advisories are fire-and-forget.
        let _ = self.advisories.send(advisory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::advisory::{AdvisoryKind, AdvisoryReason};

    fn collector(config: TelemetryConfig) -> Arc<TelemetryCollector> {
        Arc::new(TelemetryCollector::new(config).expect("valid config"))
    }

    fn measure(name: &str, duration_ms: f64) -> TimingEntry {
        TimingEntry {
            kind: TimingKind::Measure,
            name: name.into(),
            duration_ms,
            start_ms: 0,
            transfer_size_bytes: None,
        }
    }

    #[tokio::test]
    async fn ingestion_is_gated_on_start_and_stop() {
        let c = collector(TelemetryConfig::default());

        c.on_timing_entry(measure("before-start", 5.0));
        assert!(c.report().records.renders.is_empty());

        c.start().await;
        c.on_timing_entry(measure("while-running", 5.0));
        assert_eq!(c.report().records.renders.len(), 1);

        c.stop().await;
        c.on_timing_entry(measure("after-stop", 5.0));
        assert_eq!(c.report().records.renders.len(), 1);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_before_start() {
        let c = collector(TelemetryConfig::default());
        c.stop().await;
        c.start().await;
        c.stop().await;
        c.stop().await;
        assert!(!c.is_monitoring());
    }

    #[tokio::test]
    async fn start_twice_keeps_running() {
        let c = collector(TelemetryConfig::default());
        c.start().await;
        c.start().await;
        assert!(c.is_monitoring());
        c.stop().await;
    }

    #[tokio::test]
    async fn memory_breach_emits_exactly_one_advisory() {
        let c = collector(TelemetryConfig::default());
        let mut rx = c.subscribe_advisories();
        c.start().await;

        c.record_memory(MemoryReading {
            used_bytes: 900,
            total_bytes: 1000,
            limit_bytes: 1000,
        });

        let advisory = rx.try_recv().expect("breach must advise");
        assert_eq!(advisory.kind, AdvisoryKind::CleanupSuggested);
        assert_eq!(advisory.reason, AdvisoryReason::HighMemory);
        assert!(rx.try_recv().is_err(), "one advisory per breaching sample");

        c.stop().await;
    }

    #[tokio::test]
    async fn memory_below_threshold_is_silent() {
        let c = collector(TelemetryConfig::default());
        let mut rx = c.subscribe_advisories();
        c.start().await;

        c.record_memory(MemoryReading {
            used_bytes: 700,
            total_bytes: 1000,
            limit_bytes: 1000,
        });

        assert_eq!(c.report().records.memory.len(), 1);
        assert!(rx.try_recv().is_err());
        c.stop().await;
    }

    #[tokio::test]
    async fn paint_entries_are_not_retained() {
        let c = collector(TelemetryConfig::default());
        c.start().await;
        c.on_timing_entry(TimingEntry {
            kind: TimingKind::Paint,
            name: "first-contentful-paint".into(),
            duration_ms: 0.0,
            start_ms: 120,
            transfer_size_bytes: None,
        });

        let records = c.report().records;
        assert!(records.renders.is_empty());
        assert!(records.network.is_empty());
        c.stop().await;
    }

    #[tokio::test]
    async fn resource_entry_defaults_missing_transfer_size_to_zero() {
        let c = collector(TelemetryConfig::default());
        c.start().await;
        c.on_timing_entry(TimingEntry {
            kind: TimingKind::Resource,
            name: "/covers/42.png".into(),
            duration_ms: 18.5,
            start_ms: 10,
            transfer_size_bytes: None,
        });

        let network = c.report().records.network;
        assert_eq!(network.len(), 1);
        assert_eq!(network[0].transfer_size_bytes, 0);
        c.stop().await;
    }

    #[tokio::test]
    async fn render_monitoring_flag_drops_measure_entries() {
        let mut config = TelemetryConfig::default();
        config.enable_render_monitoring = false;
        let c = collector(config);
        c.start().await;

        c.on_timing_entry(measure("ignored", 3.0));
        assert!(c.report().records.renders.is_empty());
        c.stop().await;
    }

    #[tokio::test]
    async fn dom_mutations_without_probe_are_dropped() {
        let c = collector(TelemetryConfig::default());
        c.start().await;
        c.on_dom_mutations(12);
        assert!(c.report().records.dom.is_empty());
        c.stop().await;
    }

    #[tokio::test]
    async fn dom_mutations_record_probe_node_count() {
        struct FixedDom;
        impl crate::probes::DomProbe for FixedDom {
            fn node_count(&self) -> u64 {
                321
            }
        }

        let c = Arc::new(
            TelemetryCollector::new(TelemetryConfig::default())
                .expect("valid config")
                .with_dom_probe(Arc::new(FixedDom)),
        );
        c.start().await;
        c.on_dom_mutations(12);

        let dom = c.report().records.dom;
        assert_eq!(dom.len(), 1);
        assert_eq!(dom[0].node_count, 321);
        assert_eq!(dom[0].mutation_count, 12);
        c.stop().await;
    }

    #[tokio::test]
    async fn clear_resets_records_counters_and_timers() {
        let c = collector(TelemetryConfig::default());
        c.start().await;

        c.on_timing_entry(measure("pass", 4.0));
        c.increment_counter("modal-open");
        c.start_timer("render");
        c.clear();

        let report = c.report();
        assert!(report.records.renders.is_empty());
        assert!(report.records.memory.is_empty());
        assert!(report.records.fps.is_empty());
        assert!(report.records.errors.is_empty());
        assert!(report.counters.is_empty());
        assert!(report.summary.render.is_none());
        assert!(report.summary.fps.is_none());
        assert_eq!(report.summary.errors.total, 0);
        // Pending timer was discarded by clear
        assert_eq!(c.end_timer("render"), 0);
        c.stop().await;
    }

    #[tokio::test]
    async fn disabled_collector_is_inert() {
        let mut config = TelemetryConfig::default();
        config.enable_metrics = false;
        let c = collector(config);

        c.start().await;
        assert!(!c.is_monitoring());

        c.on_timing_entry(measure("ignored", 1.0));
        assert_eq!(c.increment_counter("n"), 0);
        assert_eq!(c.end_timer("t"), 0);

        let report = c.report();
        assert!(report.records.renders.is_empty());
        assert!(report.counters.is_empty());
    }

    #[tokio::test]
    async fn export_is_parseable_json() {
        let c = collector(TelemetryConfig::default());
        c.start().await;
        c.on_timing_entry(measure("card-grid-render", 7.2));
        c.increment_counter("bookmark-added");

        let text = c.export();
        let value: serde_json::Value =
            serde_json::from_str(&text).expect("export must be JSON");
        assert!(value["generated_at"].is_string());
        assert_eq!(
            value["report"]["counters"]["bookmark-added"],
            serde_json::json!(1)
        );
        c.stop().await;
    }
}
