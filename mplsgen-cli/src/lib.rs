//! Command-line front end for the MPLS-over-UDP packet generator
//!
//! This crate provides argument parsing into an `EmitterConfig`, logging
//! setup, and the `mpls-packet-gen` binary.

pub mod args;
pub mod logging;

pub use args::Cli;
