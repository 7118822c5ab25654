//! MPLS packet generator core library
//!
//! This crate provides the error type, the emitter configuration, send
//! statistics and the transport seam shared by the packet generator crates.

pub mod config;
pub mod error;
pub mod stats;
pub mod transport;

// Re-export commonly used types
pub use config::{EmitterConfig, Flow, MAX_MPLS_LABEL, MPLS_OVER_UDP_PORT};
pub use error::{Error, Result};
pub use stats::{EmitterStats, EmitterStatsCounters};
pub use transport::{DryRunTransmitter, RawIpTransmitter, Transmitter};
