use serde::Serialize;

use super::{FpsSample, MemorySample};

/// Advisory signal pushed to the presentation layer. Best-effort and
/// un-acknowledged: one advisory per breaching sample, no cooldown.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub reason: AdvisoryReason,
    /// The value that breached (used/limit ratio, or fps)
    pub observed: f64,
    pub threshold: f64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryKind {
    /// The app should consider releasing caches / detached views
    CleanupSuggested,
    /// The app should consider cheaper rendering paths
    OptimizationSuggested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryReason {
    HighMemory,
    LowFps,
}

/// Memory path of the threshold evaluator. Pure function of the latest
/// sample and the configured ratio; a zero limit never breaches.
pub fn evaluate_memory(
    sample: &MemorySample,
    threshold_ratio: f64,
) -> Option<Advisory> {
    if sample.limit_bytes == 0 {
        return None;
    }
    let ratio = sample.used_bytes as f64 / sample.limit_bytes as f64;
    if ratio > threshold_ratio {
        Some(Advisory {
            kind: AdvisoryKind::CleanupSuggested,
            reason: AdvisoryReason::HighMemory,
            observed: ratio,
            threshold: threshold_ratio,
            timestamp_ms: sample.timestamp_ms,
        })
    } else {
        None
    }
}

/// Fps path of the threshold evaluator.
pub fn evaluate_fps(sample: &FpsSample, threshold: u32) -> Option<Advisory> {
    if sample.value < threshold {
        Some(Advisory {
            kind: AdvisoryKind::OptimizationSuggested,
            reason: AdvisoryReason::LowFps,
            observed: sample.value as f64,
            threshold: threshold as f64,
            timestamp_ms: sample.timestamp_ms,
        })
    } else {
        None
    }
}
