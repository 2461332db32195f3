use std::collections::VecDeque;

use serde::Serialize;

use super::{
    DomSample, ErrorSample, FpsSample, MemorySample, NetworkSample,
    RenderSample,
};

/// Bounded per-signal retention. This is the single mutation point for
/// every sampler: append, then prune inline so `len <= cap` holds after
/// every insertion, never eventually.
#[derive(Debug)]
pub struct MetricStore {
    cap: usize,
    memory: VecDeque<MemorySample>,
    renders: VecDeque<RenderSample>,
    fps: VecDeque<FpsSample>,
    dom: VecDeque<DomSample>,
    network: VecDeque<NetworkSample>,
    errors: VecDeque<ErrorSample>,
}

/// Cloned, serializable view of every sequence, shipped out of the lock.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    pub memory: Vec<MemorySample>,
    pub renders: Vec<RenderSample>,
    pub fps: Vec<FpsSample>,
    pub dom: Vec<DomSample>,
    pub network: Vec<NetworkSample>,
    pub errors: Vec<ErrorSample>,
}

impl StoreSnapshot {
    /// Snapshot of a store that holds nothing.
    pub fn empty() -> Self {
        Self {
            memory: Vec::new(),
            renders: Vec::new(),
            fps: Vec::new(),
            dom: Vec::new(),
            network: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl MetricStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            memory: VecDeque::with_capacity(cap.min(64) + 1),
            renders: VecDeque::with_capacity(cap.min(64) + 1),
            fps: VecDeque::with_capacity(cap.min(64) + 1),
            dom: VecDeque::with_capacity(cap.min(64) + 1),
            network: VecDeque::with_capacity(cap.min(64) + 1),
            errors: VecDeque::with_capacity(cap.min(64) + 1),
        }
    }

    pub fn push_memory(&mut self, sample: MemorySample) {
        push_bounded(&mut self.memory, sample, self.cap);
    }

    pub fn push_render(&mut self, sample: RenderSample) {
        push_bounded(&mut self.renders, sample, self.cap);
    }

    pub fn push_fps(&mut self, sample: FpsSample) {
        push_bounded(&mut self.fps, sample, self.cap);
    }

    pub fn push_dom(&mut self, sample: DomSample) {
        push_bounded(&mut self.dom, sample, self.cap);
    }

    pub fn push_network(&mut self, sample: NetworkSample) {
        push_bounded(&mut self.network, sample, self.cap);
    }

    pub fn push_error(&mut self, sample: ErrorSample) {
        push_bounded(&mut self.errors, sample, self.cap);
    }

    pub fn memory(&self) -> &VecDeque<MemorySample> {
        &self.memory
    }

    pub fn renders(&self) -> &VecDeque<RenderSample> {
        &self.renders
    }

    pub fn fps(&self) -> &VecDeque<FpsSample> {
        &self.fps
    }

    pub fn dom(&self) -> &VecDeque<DomSample> {
        &self.dom
    }

    pub fn network(&self) -> &VecDeque<NetworkSample> {
        &self.network
    }

    pub fn errors(&self) -> &VecDeque<ErrorSample> {
        &self.errors
    }

    /// Drop every retained record; the cap is unchanged.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.renders.clear();
        self.fps.clear();
        self.dom.clear();
        self.network.clear();
        self.errors.clear();
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            memory: self.memory.iter().copied().collect(),
            renders: self.renders.iter().cloned().collect(),
            fps: self.fps.iter().copied().collect(),
            dom: self.dom.iter().copied().collect(),
            network: self.network.iter().cloned().collect(),
            errors: self.errors.iter().cloned().collect(),
        }
    }
}

fn push_bounded<T>(seq: &mut VecDeque<T>, item: T, cap: usize) {
    seq.push_back(item);
    while seq.len() > cap {
        seq.pop_front();
    }
}
