use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::read::HandleState;

/// Snapshot of resource handle accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMetrics {
    pub opened: u64,
    pub exhausted: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub open_failures: u64,
    pub bytes_read: u64,
}

impl ResourceMetrics {
    /// Handles opened but not yet released
    pub fn active(&self) -> u64 {
        self.opened
            .saturating_sub(self.exhausted + self.failed + self.abandoned)
    }
}

/// Process-wide accounting of resource handles held by chunk streams
#[derive(Debug, Default)]
pub struct ResourceTracker {
    opened: AtomicU64,
    exhausted: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
    open_failures: AtomicU64,
    bytes_read: AtomicU64,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_open(&self) {
        self.opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn track_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn track_bytes(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a release; non-terminal states are ignored
    pub fn track_release(&self, outcome: HandleState) {
        let counter = match outcome {
            HandleState::Exhausted => &self.exhausted,
            HandleState::Failed => &self.failed,
            HandleState::Abandoned => &self.abandoned,
            HandleState::Opening | HandleState::Reading => {
                log::error!("release recorded for non-terminal state {:?}", outcome);
                return;
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if outcome == HandleState::Abandoned {
            log::info!(
                "{} chunk stream handle(s) released by abandonment so far",
                self.abandoned.load(Ordering::Relaxed)
            );
        }
    }

    pub fn metrics(&self) -> ResourceMetrics {
        ResourceMetrics {
            opened: self.opened.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }
}

lazy_static::lazy_static! {
    pub static ref GLOBAL_RESOURCE_TRACKER: Arc<ResourceTracker> = Arc::new(ResourceTracker::new());
}

/// Get the global resource tracker
pub fn get_global_resource_tracker() -> Arc<ResourceTracker> {
    GLOBAL_RESOURCE_TRACKER.clone()
}
