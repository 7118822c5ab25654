//! Packet emitter
//!
//! Every cycle builds one encapsulated echo request per configured flow,
//! writes a trace line for it and hands it to the transmitter, in flow
//! order. The emitter then pauses for the configured interval. The pause
//! starts after the last send, so send time is not subtracted from it.

use crate::context::EmitterContext;
use mplsgen_core::{EmitterConfig, EmitterStats, EmitterStatsCounters, Error, Result, Transmitter};
use mplsgen_packet::{EncapsulatedPacket, EncapsulatedPacketBuilder};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Build the packets of one cycle, one per flow, in flow order
pub fn build_cycle(config: &EmitterConfig) -> Result<Vec<EncapsulatedPacket>> {
    config
        .flows
        .iter()
        .map(|flow| EncapsulatedPacketBuilder::for_flow(config, flow).build())
        .collect()
}

/// Periodic emitter of MPLS-over-UDP echo requests
pub struct Emitter<T, W> {
    config: Arc<EmitterConfig>,
    transmitter: T,
    trace: W,
}

impl<T, W> Emitter<T, W>
where
    T: Transmitter,
    W: Write + Send,
{
    /// Create an emitter, rejecting configurations that cannot be encoded
    pub fn new(config: Arc<EmitterConfig>, transmitter: T, trace: W) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            transmitter,
            trace,
        })
    }

    /// Build and send one cycle
    ///
    /// Returns the number of packets sent. If the context is stopped
    /// mid-cycle the remaining packets are dropped and the cycle is not
    /// counted. A transmitter failure aborts the cycle with
    /// [`Error::Transmission`].
    pub fn run_cycle(&mut self, ctx: &EmitterContext) -> Result<usize> {
        let packets = build_cycle(&self.config)?;
        let destination = self.config.outer_destination;
        let mut sent = 0;

        for (index, packet) in packets.iter().enumerate() {
            if !ctx.is_running() {
                debug!(sent, "Stopped mid-cycle");
                return Ok(sent);
            }

            let flow = index + 1;
            let bytes = packet.to_bytes()?;

            writeln!(self.trace, "Send: {}", packet)?;
            self.trace.flush()?;

            match self.transmitter.send(&bytes, destination) {
                Ok(accepted) => {
                    ctx.stats.record_sent(accepted);
                    sent += 1;
                    debug!(
                        flow,
                        inner_source = %packet.inner.source,
                        source_port = packet.udp.source_port,
                        size = accepted,
                        "Packet sent"
                    );
                }
                Err(source) => {
                    ctx.stats.increment_errors();
                    return Err(Error::Transmission {
                        flow,
                        destination,
                        source,
                    });
                }
            }
        }

        ctx.stats.increment_cycles();
        Ok(sent)
    }

    /// Run cycles until the context is stopped, `max_cycles` is reached, or a
    /// send fails
    pub async fn run(mut self, ctx: EmitterContext) -> Result<EmitterStats> {
        info!(
            transmitter = self.transmitter.name(),
            outer_source = %self.config.outer_source,
            outer_destination = %self.config.outer_destination,
            destination_port = self.config.destination_port,
            label = self.config.label,
            flows = self.config.flows.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            "Starting emitter"
        );

        let mut cycles = 0u64;

        while ctx.is_running() {
            match self.run_cycle(&ctx) {
                // Stopped mid-cycle
                Ok(sent) if sent < self.config.flows.len() => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Emitter failed");
                    ctx.stop();
                    return Err(e);
                }
            }
            cycles += 1;
            debug!(cycle = cycles, "Cycle complete");

            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            if !ctx.sleep_while_running(self.config.interval).await {
                break;
            }
        }

        ctx.stop();
        let stats = ctx.stats.snapshot();
        info!(%stats, "Emitter stopped");

        Ok(stats)
    }

    /// Run the emitter on a Tokio task
    pub fn spawn(self, ctx: EmitterContext) -> EmitterHandle
    where
        T: 'static,
        W: 'static,
    {
        let running = ctx.running.clone();
        let stats = ctx.stats.clone();
        let task = tokio::spawn(self.run(ctx));

        EmitterHandle {
            running,
            stats,
            task,
        }
    }
}

/// Handle to a spawned emitter
pub struct EmitterHandle {
    running: Arc<AtomicBool>,
    stats: Arc<EmitterStatsCounters>,
    task: JoinHandle<Result<EmitterStats>>,
}

impl EmitterHandle {
    /// Ask the emitter to stop
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Current statistics
    pub fn stats(&self) -> EmitterStats {
        self.stats.snapshot()
    }

    /// Wait for the emitter task to end
    ///
    /// Cancel-safe: dropping the future leaves the handle usable.
    pub async fn wait(&mut self) -> Result<EmitterStats> {
        (&mut self.task)
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    /// Wait for the emitter task and return its final statistics
    pub async fn join(mut self) -> Result<EmitterStats> {
        self.wait().await
    }
}
