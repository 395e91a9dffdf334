//! Run-wide atomic counters
//!
//! Read by the progress reporter only. The pending result table remains the
//! source of truth for completion; these are best-effort observability.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counters shared between the dispatcher, the collector and the progress thread
pub struct RunCounters {
    /// Jobs handed to a worker
    pub dispatched: AtomicU64,

    /// Results received from workers
    pub completed: AtomicU64,

    /// Results that carried an error
    pub errors: AtomicU64,

    /// Stop signal for the progress reporter
    pub shutdown: AtomicBool,
}

impl RunCounters {
    pub fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_completed(&self, is_error: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Signal shutdown to the progress reporter
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// (completed, dispatched, errors)
    pub fn progress(&self) -> (u64, u64, u64) {
        (
            self.completed.load(Ordering::Relaxed),
            self.dispatched.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

impl Default for RunCounters {
    fn default() -> Self {
        Self::new()
    }
}
