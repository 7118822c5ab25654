//! Send statistics

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Snapshot of emitter statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitterStats {
    /// Completed cycles
    pub cycles: u64,
    /// Packets handed to the network stack
    pub packets_sent: u64,
    /// Bytes handed to the network stack
    pub bytes_sent: u64,
    /// Failed transmissions
    pub errors: u64,
    /// Time since the emitter started
    pub elapsed: Duration,
}

impl fmt::Display for EmitterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} packets, {} bytes, {} errors in {:.1}s",
            self.cycles,
            self.packets_sent,
            self.bytes_sent,
            self.errors,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Thread-safe emitter statistics counters
#[derive(Debug)]
pub struct EmitterStatsCounters {
    pub cycles: AtomicU64,
    pub packets_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub errors: AtomicU64,
    started_at: Instant,
}

impl Default for EmitterStatsCounters {
    fn default() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }
}

impl EmitterStatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_cycles(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self, bytes: usize) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EmitterStats {
        EmitterStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            elapsed: self.started_at.elapsed(),
        }
    }
}
