use serde::Serialize;

use super::percentiles::PercentileSet;
use super::{ErrorKind, MetricStore};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Windowed aggregates over the store. Computed on demand from a
/// snapshot of "now"; ingestion is never blocked by summarization.
/// Every sub-summary is independently null-safe on an empty window.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub memory: Option<MemorySummary>,
    pub render: Option<RenderSummary>,
    pub errors: ErrorSummary,
    pub fps: Option<FpsSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    /// Most recent in-window usage, rounded to whole MB
    pub current_mb: u64,
    /// Most recent usage as a percentage of the heap limit
    pub percent_of_limit: f64,
    pub window_average_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub average_ms: f64,
    pub max_ms: f64,
    pub count: u64,
    pub percentiles: PercentileSet,
}

/// Always present; zeroed counts when the window holds no errors.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorSummary {
    pub total: u64,
    pub runtime: u64,
    pub unhandled_rejection: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FpsSummary {
    pub average: f64,
    pub min: u32,
    pub count: u64,
}

impl MetricsSummary {
    /// Aggregate everything inside the trailing `window_ms` ending at
    /// `now_ms`.
    pub fn compute(store: &MetricStore, now_ms: u64, window_ms: u64) -> Self {
        let cutoff = now_ms.saturating_sub(window_ms);
        Self {
            memory: memory_summary(store, cutoff),
            render: render_summary(store, cutoff),
            errors: error_summary(store, cutoff),
            fps: fps_summary(store, cutoff),
        }
    }

    /// Placeholder for a cleared or disabled collector.
    pub fn empty() -> Self {
        Self {
            memory: None,
            render: None,
            errors: ErrorSummary { total: 0, runtime: 0, unhandled_rejection: 0 },
            fps: None,
        }
    }
}

fn memory_summary(store: &MetricStore, cutoff: u64) -> Option<MemorySummary> {
    let in_window: Vec<_> = store
        .memory()
        .iter()
        .filter(|s| s.timestamp_ms >= cutoff)
        .collect();
    let latest = in_window.last()?;

    let percent_of_limit = if latest.limit_bytes > 0 {
        latest.used_bytes as f64 / latest.limit_bytes as f64 * 100.0
    } else {
        0.0
    };
    let avg_bytes = in_window.iter().map(|s| s.used_bytes as f64).sum::<f64>()
        / in_window.len() as f64;

    Some(MemorySummary {
        current_mb: (latest.used_bytes as f64 / BYTES_PER_MB).round() as u64,
        percent_of_limit,
        window_average_mb: avg_bytes / BYTES_PER_MB,
    })
}

fn render_summary(store: &MetricStore, cutoff: u64) -> Option<RenderSummary> {
    let durations: Vec<f64> = store
        .renders()
        .iter()
        .filter(|s| s.start_ms >= cutoff)
        .map(|s| s.duration_ms)
        .collect();
    if durations.is_empty() {
        return None;
    }

    let sum: f64 = durations.iter().sum();
    let max = durations.iter().copied().fold(f64::MIN, f64::max);
    Some(RenderSummary {
        average_ms: sum / durations.len() as f64,
        max_ms: max,
        count: durations.len() as u64,
        percentiles: PercentileSet::from_durations_ms(&durations),
    })
}

fn error_summary(store: &MetricStore, cutoff: u64) -> ErrorSummary {
    let mut summary = ErrorSummary { total: 0, runtime: 0, unhandled_rejection: 0 };
    for sample in store.errors().iter().filter(|s| s.timestamp_ms >= cutoff) {
        summary.total += 1;
        match sample.kind {
            ErrorKind::Runtime => summary.runtime += 1,
            ErrorKind::UnhandledRejection => summary.unhandled_rejection += 1,
        }
    }
    summary
}

fn fps_summary(store: &MetricStore, cutoff: u64) -> Option<FpsSummary> {
    let values: Vec<u32> = store
        .fps()
        .iter()
        .filter(|s| s.timestamp_ms >= cutoff)
        .map(|s| s.value)
        .collect();
    if values.is_empty() {
        return None;
    }

    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    Some(FpsSummary {
        average: sum as f64 / values.len() as f64,
        min: values.iter().copied().min().unwrap_or(0),
        count: values.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{
        ErrorEvent, FpsSample, MemorySample, RenderSample,
    };

    const MB: u64 = 1024 * 1024;
    const WINDOW: u64 = 300_000;

    #[test]
    fn empty_store_yields_null_sub_summaries() {
        let store = MetricStore::new(100);
        let summary = MetricsSummary::compute(&store, 1_000_000, WINDOW);
        assert!(summary.memory.is_none());
        assert!(summary.render.is_none());
        assert!(summary.fps.is_none());
        assert_eq!(summary.errors.total, 0);
    }

    #[test]
    fn fps_outside_window_yields_null() {
        let mut store = MetricStore::new(100);
        store.push_fps(FpsSample { value: 60, timestamp_ms: 1000 });
        // Query far past the sample
        let summary = MetricsSummary::compute(&store, 1_000_000, WINDOW);
        assert!(summary.fps.is_none());
    }

    #[test]
    fn fps_average_min_and_count() {
        let mut store = MetricStore::new(100);
        for (i, v) in [60u32, 58, 24, 58].iter().enumerate() {
            store.push_fps(FpsSample {
                value: *v,
                timestamp_ms: 1000 * (i as u64 + 1),
            });
        }
        let fps = MetricsSummary::compute(&store, 5000, WINDOW)
            .fps
            .expect("samples in window");
        assert_eq!(fps.count, 4);
        assert_eq!(fps.min, 24);
        assert!((fps.average - 50.0).abs() < 1e-9);
    }

    #[test]
    fn memory_uses_latest_for_current_and_window_for_average() {
        let mut store = MetricStore::new(100);
        for (ts, used) in [(1000u64, 100 * MB), (2000, 200 * MB)] {
            store.push_memory(MemorySample {
                used_bytes: used,
                total_bytes: 256 * MB,
                limit_bytes: 400 * MB,
                timestamp_ms: ts,
            });
        }
        let mem = MetricsSummary::compute(&store, 3000, WINDOW)
            .memory
            .expect("samples in window");
        assert_eq!(mem.current_mb, 200);
        assert!((mem.percent_of_limit - 50.0).abs() < 1e-9);
        assert!((mem.window_average_mb - 150.0).abs() < 1e-9);
    }

    #[test]
    fn old_memory_samples_fall_out_of_the_average() {
        let mut store = MetricStore::new(100);
        // Far in the past, outside any 5-minute window ending at now
        store.push_memory(MemorySample {
            used_bytes: 900 * MB,
            total_bytes: 1024 * MB,
            limit_bytes: 1024 * MB,
            timestamp_ms: 10,
        });
        store.push_memory(MemorySample {
            used_bytes: 100 * MB,
            total_bytes: 1024 * MB,
            limit_bytes: 1024 * MB,
            timestamp_ms: 600_000,
        });
        let mem = MetricsSummary::compute(&store, 600_000, WINDOW)
            .memory
            .expect("one sample in window");
        assert!((mem.window_average_mb - 100.0).abs() < 1e-9);
    }

    #[test]
    fn render_average_and_max() {
        let mut store = MetricStore::new(100);
        for (i, d) in [10.0f64, 30.0, 20.0].iter().enumerate() {
            store.push_render(RenderSample {
                name: format!("pass-{i}"),
                duration_ms: *d,
                start_ms: 1000 + i as u64,
            });
        }
        let render = MetricsSummary::compute(&store, 2000, WINDOW)
            .render
            .expect("samples in window");
        assert_eq!(render.count, 3);
        assert!((render.average_ms - 20.0).abs() < 1e-9);
        assert!((render.max_ms - 30.0).abs() < 1e-9);
        assert!(render.percentiles.has_data());
    }

    #[test]
    fn errors_counted_per_kind() {
        let mut store = MetricStore::new(100);
        store.push_error(
            ErrorEvent::Runtime {
                message: "boom".into(),
                source: None,
                line: None,
                column: None,
            }
            .into_sample(1000),
        );
        store.push_error(
            ErrorEvent::UnhandledRejection { reason: None }.into_sample(1001),
        );
        store.push_error(
            ErrorEvent::UnhandledRejection { reason: None }.into_sample(1002),
        );
        let errors = MetricsSummary::compute(&store, 2000, WINDOW).errors;
        assert_eq!(errors.total, 3);
        assert_eq!(errors.runtime, 1);
        assert_eq!(errors.unhandled_rejection, 2);
    }
}
