//! Configuration types for stream evaluation and chunked reads

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of bytes per chunk for the resource reader
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Evaluation limits for the trampolined engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Nodes a synchronous fast path may walk before deferring the rest
    pub sync_budget: usize,
    /// Nodes a traversal visits between cooperative yields
    pub yield_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_budget: 256,
            yield_interval: 1024,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the synchronous fast-path budget (at least one node)
    pub fn sync_budget(mut self, budget: usize) -> Self {
        self.sync_budget = budget.max(1);
        self
    }

    /// Set the yield interval (at least one node)
    pub fn yield_interval(mut self, interval: usize) -> Self {
        self.yield_interval = interval.max(1);
        self
    }

    /// The configuration currently in effect for this process
    pub fn current() -> Self {
        Self {
            sync_budget: SYNC_BUDGET.load(Ordering::Relaxed),
            yield_interval: YIELD_INTERVAL.load(Ordering::Relaxed),
        }
    }
}

lazy_static::lazy_static! {
    static ref SYNC_BUDGET: AtomicUsize = AtomicUsize::new(EngineConfig::default().sync_budget);
    static ref YIELD_INTERVAL: AtomicUsize = AtomicUsize::new(EngineConfig::default().yield_interval);
}

/// Install `config` as the process-wide engine configuration
pub fn configure(config: EngineConfig) {
    SYNC_BUDGET.store(config.sync_budget.max(1), Ordering::Relaxed);
    YIELD_INTERVAL.store(config.yield_interval.max(1), Ordering::Relaxed);
    log::debug!("engine configured: {:?}", config);
}

/// Configuration for chunked resource reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadConfig {
    pub chunk_size: usize,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size; zero falls back to the default
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = if size == 0 { DEFAULT_CHUNK_SIZE } else { size };
        self
    }
}
