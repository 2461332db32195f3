use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

/// A percentile breakdown over a set of durations, in milliseconds.
/// Serialized straight into the summary JSON.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileSet {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub count: u64,
}

impl PercentileSet {
    /// Build a breakdown from millisecond durations. The histogram is
    /// recorded in whole microseconds (clamped to ≥ 1 μs) and converted
    /// back on extraction. Returns zeroed values for an empty slice.
    pub fn from_durations_ms(durations_ms: &[f64]) -> Self {
        if durations_ms.is_empty() {
            return Self::empty();
        }

        let mut hist =
            Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("histogram creation");
        for &ms in durations_ms {
            let us = (ms * 1000.0).max(1.0) as u64;
            let _ = hist.record(us.min(HIST_HIGH));
        }

        let to_ms = |us: u64| us as f64 / 1000.0;
        Self {
            min_ms: to_ms(hist.min()),
            max_ms: to_ms(hist.max()),
            mean_ms: hist.mean() / 1000.0,
            p50_ms: to_ms(hist.value_at_percentile(50.0)),
            p95_ms: to_ms(hist.value_at_percentile(95.0)),
            p99_ms: to_ms(hist.value_at_percentile(99.0)),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used when no durations were observed.
    pub fn empty() -> Self {
        Self {
            min_ms: 0.0,
            max_ms: 0.0,
            mean_ms: 0.0,
            p50_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}
