//! Simulated bookmark-manager host.
//!
//! Stands in for the real presentation layer during development: it
//! drives frame ticks, timing entries, DOM churn, and the occasional
//! error into the collector so the dashboard has something to show.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::metrics::{ErrorEvent, TelemetryCollector, TimingEntry, TimingKind};
use crate::probes::{DomProbe, MemoryProbe, MemoryReading};

const MB: u64 = 1024 * 1024;

// ─── Workload profile ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SimProfile {
    /// How long the workload runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Steady-state frame rate the fake render loop aims for
    #[serde(default = "default_fps")]
    pub target_fps: u32,

    /// Percentage of activity ticks that raise an error (0–100)
    #[serde(default = "default_error_pct")]
    pub error_rate_pct: u8,
}

fn default_duration() -> u64 {
    120
}
fn default_fps() -> u32 {
    60
}
fn default_error_pct() -> u8 {
    3
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            target_fps: default_fps(),
            error_rate_pct: default_error_pct(),
        }
    }
}

// ─── Simulated probes ────────────────────────────────────────────

/// Heap probe with a random-walk used-bytes figure under a fixed limit.
pub struct SimMemoryProbe {
    rng: Mutex<StdRng>,
    used_bytes: AtomicU64,
    limit_bytes: u64,
}

impl SimMemoryProbe {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            used_bytes: AtomicU64::new(128 * MB),
            limit_bytes: 512 * MB,
        }
    }
}

impl MemoryProbe for SimMemoryProbe {
    fn read(&self) -> Option<MemoryReading> {
        let delta = self.rng.lock().gen_range(-8i64..=24) * MB as i64;
        let used = self
            .used_bytes
            .load(Ordering::Relaxed)
            .saturating_add_signed(delta)
            .clamp(32 * MB, self.limit_bytes - 16 * MB);
        self.used_bytes.store(used, Ordering::Relaxed);

        Some(MemoryReading {
            used_bytes: used,
            total_bytes: (used + 48 * MB).min(self.limit_bytes),
            limit_bytes: self.limit_bytes,
        })
    }
}

/// Document probe backed by a counter the churn task mutates.
pub struct SimDomProbe {
    nodes: AtomicU64,
}

impl SimDomProbe {
    pub fn new(initial_nodes: u64) -> Self {
        Self { nodes: AtomicU64::new(initial_nodes) }
    }

    pub fn apply_churn(&self, delta: i64) {
        let nodes = self
            .nodes
            .load(Ordering::Relaxed)
            .saturating_add_signed(delta)
            .max(50);
        self.nodes.store(nodes, Ordering::Relaxed);
    }
}

impl DomProbe for SimDomProbe {
    fn node_count(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }
}

// ─── Public entry point ──────────────────────────────────────────

/// Runs the workload until the deadline or until `running` is cleared.
pub async fn run(
    running: Arc<AtomicBool>,
    collector: Arc<TelemetryCollector>,
    dom: Arc<SimDomProbe>,
    profile: SimProfile,
) {
    let deadline = Instant::now() + Duration::from_secs(profile.duration_secs);

    let frame = tokio::spawn(frame_loop(
        running.clone(),
        collector.clone(),
        deadline,
        profile.target_fps,
    ));
    let activity = tokio::spawn(activity_loop(
        running.clone(),
        collector,
        dom,
        deadline,
        profile.error_rate_pct,
    ));

    let _ = frame.await;
    let _ = activity.await;

    running.store(false, Ordering::SeqCst);
}

// ─── Frame loop ──────────────────────────────────────────────────

/// Ticks the collector's frame counter at roughly the target rate,
/// with occasional stalls so low-fps windows actually happen.
async fn frame_loop(
    running: Arc<AtomicBool>,
    collector: Arc<TelemetryCollector>,
    deadline: Instant,
    target_fps: u32,
) {
    let mut rng = StdRng::seed_from_u64(7);
    let period = Duration::from_millis((1000 / target_fps.max(1)).max(1) as u64);
    let mut ticker = tokio::time::interval(period);

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        ticker.tick().await;
        collector.on_frame();

        // ~2 % of frames stall hard, as a heavy relayout would
        if rng.gen_range(0u16..100) < 2 {
            tokio::time::sleep(Duration::from_millis(rng.gen_range(40..160)))
                .await;
        }
    }
}

// ─── Activity loop ───────────────────────────────────────────────

/// Emits measure/resource entries, DOM churn, and errors at a human-ish
/// browsing pace.
async fn activity_loop(
    running: Arc<AtomicBool>,
    collector: Arc<TelemetryCollector>,
    dom: Arc<SimDomProbe>,
    deadline: Instant,
    error_rate_pct: u8,
) {
    let mut rng = StdRng::seed_from_u64(1042);
    let anchor = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_millis(120));

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        ticker.tick().await;
        let now_ms = anchor.elapsed().as_millis() as u64;

        // Every tick repaints something
        collector.on_timing_entry(render_entry(&mut rng, now_ms));

        if rng.gen_bool(0.4) {
            collector.on_timing_entry(resource_entry(&mut rng, now_ms));
        }

        if rng.gen_bool(0.5) {
            dom.apply_churn(rng.gen_range(-20i64..=40));
            collector.on_dom_mutations(rng.gen_range(1..30));
        }

        if rng.gen_range(0u8..100) < error_rate_pct {
            collector.on_error(error_event(&mut rng));
        }
    }
}

fn render_entry(rng: &mut StdRng, now_ms: u64) -> TimingEntry {
    let name = ["card-grid-render", "card-list-render", "modal-open-render"]
        [rng.gen_range(0..3)];
    TimingEntry {
        kind: TimingKind::Measure,
        name: name.into(),
        duration_ms: rng.gen_range(2.0..45.0),
        start_ms: now_ms,
        transfer_size_bytes: None,
    }
}

fn resource_entry(rng: &mut StdRng, now_ms: u64) -> TimingEntry {
    let (name, size) = if rng.gen_bool(0.6) {
        let id = rng.gen_range(1..=5000u32);
        (format!("/covers/{id}.png"), Some(rng.gen_range(4_000..180_000)))
    } else {
        let page = rng.gen_range(1..=40u32);
        (format!("/api/bookmarks?page={page}"), None)
    };
    TimingEntry {
        kind: TimingKind::Resource,
        name,
        duration_ms: rng.gen_range(5.0..140.0),
        start_ms: now_ms,
        transfer_size_bytes: size,
    }
}

fn error_event(rng: &mut StdRng) -> ErrorEvent {
    if rng.gen_bool(0.5) {
        ErrorEvent::Runtime {
            message: "Cannot read properties of undefined (reading 'favicon')"
                .into(),
            source: Some("cards.js".into()),
            line: Some(rng.gen_range(10..400)),
            column: Some(rng.gen_range(1..80)),
        }
    } else {
        ErrorEvent::UnhandledRejection {
            reason: if rng.gen_bool(0.5) {
                Some("fetch failed: /api/bookmarks".into())
            } else {
                None
            },
        }
    }
}
