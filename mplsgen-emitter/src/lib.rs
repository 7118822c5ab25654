//! Periodic emitter for MPLS-over-UDP test traffic
//!
//! This crate drives the packet generator:
//!
//! - `Emitter`: builds one packet per flow each cycle, traces and sends them
//!   in order, then pauses for the configured interval
//! - `EmitterContext`: running flag and statistics shared with a controller
//! - `EmitterHandle`: stop/join handle for an emitter spawned on Tokio
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mplsgen_core::{EmitterConfig, RawIpTransmitter};
//! use mplsgen_emitter::{Emitter, EmitterContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(EmitterConfig::default().with_max_cycles(1));
//!     let emitter = Emitter::new(config, RawIpTransmitter::open()?, std::io::stdout())?;
//!
//!     let stats = emitter.spawn(EmitterContext::new()).join().await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod emitter;

pub use context::EmitterContext;
pub use emitter::{build_cycle, Emitter, EmitterHandle};
