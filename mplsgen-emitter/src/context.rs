//! Run context shared between an emitter task and its controller

use mplsgen_core::EmitterStatsCounters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Longest slice the inter-cycle pause sleeps before re-checking the
/// running flag
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Running flag and statistics for one emitter run
#[derive(Debug, Clone)]
pub struct EmitterContext {
    /// Running flag (the emitter stops when this is false)
    pub running: Arc<AtomicBool>,
    /// Statistics counters
    pub stats: Arc<EmitterStatsCounters>,
}

impl Default for EmitterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EmitterContext {
    /// Create a context in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(EmitterStatsCounters::new()),
        }
    }

    /// Check if the emitter should keep running
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the emitter to stop after the current packet
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Sleep for `duration`, returning early once the context is stopped
    ///
    /// Returns `true` if the full duration elapsed while still running.
    pub async fn sleep_while_running(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;

        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            sleep((deadline - now).min(STOP_POLL_INTERVAL)).await;
        }

        false
    }
}
