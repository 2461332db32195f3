//! Capability injection for platform-dependent readings.
//!
//! The collector never probes the environment itself; the host hands it
//! trait objects for whatever introspection the platform supports. An
//! unsupported capability is expressed by not supplying a probe (or by
//! supplying the no-op one), and the matching sampler simply stays off.

/// A point-in-time heap reading from the host runtime.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
    pub limit_bytes: u64,
}

/// Heap introspection capability, polled by the memory sampler.
pub trait MemoryProbe: Send + Sync {
    /// `None` means the reading is momentarily unavailable; the sampler
    /// skips that tick rather than recording a placeholder.
    fn read(&self) -> Option<MemoryReading>;
}

/// Document introspection capability, consulted by the DOM-churn sampler.
/// Counting is O(document size), so it runs once per mutation batch.
pub trait DomProbe: Send + Sync {
    fn node_count(&self) -> u64;
}

/// Stand-in for an absent memory capability; never yields a reading.
pub struct NoopMemoryProbe;

impl MemoryProbe for NoopMemoryProbe {
    fn read(&self) -> Option<MemoryReading> {
        None
    }
}

/// Stand-in for an absent document capability; reports an empty document.
pub struct NoopDomProbe;

impl DomProbe for NoopDomProbe {
    fn node_count(&self) -> u64 {
        0
    }
}
