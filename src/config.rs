use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subsystem configuration. Immutable once handed to the collector —
/// changing thresholds at runtime is not supported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Master switch. When false the collector is constructed disabled:
    /// every ingestion call is a no-op and reports come back empty.
    pub enable_metrics: bool,
    /// Run the periodic memory sampler (requires a memory probe).
    pub enable_memory_monitoring: bool,
    /// Retain `measure`-kind timing entries as render samples.
    pub enable_render_monitoring: bool,
    /// Interval between memory snapshots.
    #[serde(with = "duration_ms")]
    pub sampling_interval: Duration,
    /// Memory advisory fires when used/limit exceeds this ratio (0–1).
    pub memory_threshold_ratio: f64,
    /// Fps advisory fires when a window sample drops below this value.
    pub fps_threshold: u32,
    /// Per-signal retention cap (FIFO eviction beyond this).
    pub max_samples: usize,
    /// Trailing window used by the summarizer.
    #[serde(with = "duration_ms")]
    pub summary_window: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            enable_memory_monitoring: true,
            enable_render_monitoring: true,
            sampling_interval: Duration::from_secs(30),
            memory_threshold_ratio: 0.8,
            fps_threshold: 30,
            max_samples: 1000,
            summary_window: Duration::from_secs(300),
        }
    }
}

impl TelemetryConfig {
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    pub fn with_memory_threshold_ratio(mut self, ratio: f64) -> Self {
        self.memory_threshold_ratio = ratio;
        self
    }

    pub fn with_fps_threshold(mut self, fps: u32) -> Self {
        self.fps_threshold = fps;
        self
    }

    pub fn with_max_samples(mut self, cap: usize) -> Self {
        self.max_samples = cap;
        self
    }

    /// Range-check the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.memory_threshold_ratio) {
            return Err(ConfigError::MemoryThresholdOutOfRange(
                self.memory_threshold_ratio,
            ));
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroSampleCap);
        }
        if self.sampling_interval.is_zero() {
            return Err(ConfigError::ZeroSamplingInterval);
        }
        if self.summary_window.is_zero() {
            return Err(ConfigError::ZeroSummaryWindow);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("memory_threshold_ratio must be within 0..=1, got {0}")]
    MemoryThresholdOutOfRange(f64),
    #[error("max_samples must be greater than zero")]
    ZeroSampleCap,
    #[error("sampling_interval must be greater than zero")]
    ZeroSamplingInterval,
    #[error("summary_window must be greater than zero")]
    ZeroSummaryWindow,
}

/// Serialize `Duration` fields as plain millisecond integers so the
/// config round-trips through the JSON surface.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TelemetryConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg =
            TelemetryConfig::default().with_memory_threshold_ratio(1.5);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MemoryThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_zero_cap() {
        let cfg = TelemetryConfig::default().with_max_samples(0);
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroSampleCap)));
    }
}
