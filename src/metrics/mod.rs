pub mod advisory;
pub mod collector;
pub mod fps;
pub mod percentiles;
pub mod store;
pub mod stream;
pub mod summary;
pub mod tables;

use serde::{Deserialize, Serialize};

pub use advisory::{Advisory, AdvisoryKind, AdvisoryReason};
pub use collector::{MetricsReport, TelemetryCollector};
pub use store::{MetricStore, StoreSnapshot};
pub use summary::MetricsSummary;

/// Fixed message recorded when an unhandled rejection carries no reason.
pub const REJECTION_FALLBACK_MESSAGE: &str = "Unhandled promise rejection";

// ─── Retained records ────────────────────────────────────────────
// One variant struct per signal kind. These are the "read" side —
// samplers normalize inbound notifications into these and push them
// into the store. All timestamps are monotonic milliseconds since
// collector construction.

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemorySample {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderSample {
    /// Measure name, e.g. "card-grid-render"
    pub name: String,
    pub duration_ms: f64,
    /// When the measured span began
    pub start_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FpsSample {
    pub value: u32,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DomSample {
    /// Total element count in the document at sample time
    pub node_count: u64,
    /// Size of the mutation batch that triggered this sample
    pub mutation_count: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSample {
    /// Resource URL or identifier
    pub name: String,
    pub duration_ms: f64,
    pub transfer_size_bytes: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSample {
    pub kind: ErrorKind,
    pub message: String,
    /// "source:line:col" for runtime errors, absent for rejections
    pub location: Option<String>,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Runtime,
    UnhandledRejection,
}

// ─── Inbound notifications ───────────────────────────────────────
// The host runtime / presentation layer delivers these; samplers
// turn them into the retained records above.

/// A performance-timing entry delivered by the host's timing channel.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingEntry {
    pub kind: TimingKind,
    pub name: String,
    pub duration_ms: f64,
    pub start_ms: u64,
    /// Only meaningful for `Resource` entries; treated as 0 when absent
    pub transfer_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimingKind {
    Measure,
    Resource,
    Paint,
}

/// An uncaught error or unhandled rejection observed in the host app.
#[derive(Debug, Clone)]
pub enum ErrorEvent {
    Runtime {
        message: String,
        source: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
    },
    UnhandledRejection {
        /// Stringified rejection reason, when the host could extract one
        reason: Option<String>,
    },
}

impl ErrorEvent {
    /// Normalize into a retained record at the given timestamp.
    pub fn into_sample(self, timestamp_ms: u64) -> ErrorSample {
        match self {
            ErrorEvent::Runtime { message, source, line, column } => {
                let location = source.map(|src| match (line, column) {
                    (Some(l), Some(c)) => format!("{src}:{l}:{c}"),
                    (Some(l), None) => format!("{src}:{l}"),
                    _ => src,
                });
                ErrorSample {
                    kind: ErrorKind::Runtime,
                    message,
                    location,
                    timestamp_ms,
                }
            }
            ErrorEvent::UnhandledRejection { reason } => ErrorSample {
                kind: ErrorKind::UnhandledRejection,
                message: reason
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| REJECTION_FALLBACK_MESSAGE.into()),
                location: None,
                timestamp_ms,
            },
        }
    }
}
