//! Emitter configuration
//!
//! All traffic parameters live in one immutable [`EmitterConfig`] that is
//! built once at startup and shared with the emitter. The defaults describe
//! a vRouter at 192.168.57.30 tunnelling three tenant hosts towards the
//! gateway at 192.168.57.10 with MPLS local label 1004051.

use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

/// Well-known UDP destination port for MPLS-in-UDP (RFC 7510)
pub const MPLS_OVER_UDP_PORT: u16 = 6635;

/// Largest value representable in the 20-bit MPLS label field
pub const MAX_MPLS_LABEL: u32 = 0xF_FFFF;

/// Default MPLS local label announced by the gateway
pub const DEFAULT_LABEL: u32 = 1_004_051;

/// Default MPLS TTL
pub const DEFAULT_MPLS_TTL: u8 = 64;

/// Default ICMP echo payload
pub const DEFAULT_PAYLOAD: &[u8] = b"123456789012345678901234567890";

/// Default pause between cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Bytes of headers wrapped around the payload: outer IPv4, UDP, MPLS,
/// inner IPv4 and ICMP echo.
pub const ENCAPSULATION_OVERHEAD: usize = 20 + 8 + 4 + 20 + 8;

/// One simulated originating host and the UDP source port its tunnel uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    /// Inner (tenant) source address
    pub inner_source: Ipv4Addr,
    /// Outer UDP source port
    pub source_port: u16,
}

impl Flow {
    pub const fn new(inner_source: Ipv4Addr, source_port: u16) -> Self {
        Self {
            inner_source,
            source_port,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.inner_source, self.source_port)
    }
}

/// Parses `ADDR:PORT`, e.g. `100.64.0.1:5001`
impl FromStr for Flow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_parameter("flow", "expected ADDR:PORT"))?;

        let inner_source = addr
            .parse::<Ipv4Addr>()
            .map_err(|e| Error::invalid_parameter("flow", format!("bad address '{addr}': {e}")))?;
        let source_port = port
            .parse::<u16>()
            .map_err(|e| Error::invalid_parameter("flow", format!("bad port '{port}': {e}")))?;

        Ok(Flow::new(inner_source, source_port))
    }
}

/// Immutable emitter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Address of the local encapsulating node (outer IPv4 source)
    pub outer_source: Ipv4Addr,
    /// Address of the remote decapsulating node (outer IPv4 destination)
    pub outer_destination: Ipv4Addr,
    /// External target of the encapsulated echo requests
    pub inner_destination: Ipv4Addr,
    /// Outer UDP destination port
    pub destination_port: u16,
    /// Simulated flows, emitted in this order every cycle
    pub flows: Vec<Flow>,
    /// MPLS label (20 bits)
    pub label: u32,
    /// MPLS time to live
    pub mpls_ttl: u8,
    /// ICMP echo payload
    pub payload: Vec<u8>,
    /// Pause after the last packet of a cycle
    pub interval: Duration,
    /// Stop after this many cycles; `None` runs until stopped
    pub max_cycles: Option<u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            outer_source: Ipv4Addr::new(192, 168, 57, 30),
            outer_destination: Ipv4Addr::new(192, 168, 57, 10),
            inner_destination: Ipv4Addr::new(1, 1, 1, 1),
            destination_port: MPLS_OVER_UDP_PORT,
            flows: vec![
                Flow::new(Ipv4Addr::new(100, 64, 0, 1), 5001),
                Flow::new(Ipv4Addr::new(100, 64, 0, 2), 5002),
                Flow::new(Ipv4Addr::new(100, 64, 0, 3), 5003),
            ],
            label: DEFAULT_LABEL,
            mpls_ttl: DEFAULT_MPLS_TTL,
            payload: DEFAULT_PAYLOAD.to_vec(),
            interval: DEFAULT_INTERVAL,
            max_cycles: None,
        }
    }
}

impl EmitterConfig {
    /// Set the MPLS label
    pub fn with_label(mut self, label: u32) -> Self {
        self.label = label;
        self
    }

    /// Replace the flow list
    pub fn with_flows(mut self, flows: Vec<Flow>) -> Self {
        self.flows = flows;
        self
    }

    /// Set the pause between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Bound the number of cycles
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Set the ICMP payload
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Check that every packet this configuration describes can be encoded
    pub fn validate(&self) -> Result<()> {
        if self.label > MAX_MPLS_LABEL {
            return Err(Error::invalid_parameter(
                "label",
                format!("{} does not fit in 20 bits", self.label),
            ));
        }

        if self.flows.is_empty() {
            return Err(Error::invalid_parameter("flows", "at least one flow is required"));
        }

        let mut ports = HashSet::new();
        for flow in &self.flows {
            if !ports.insert(flow.source_port) {
                return Err(Error::invalid_parameter(
                    "flows",
                    format!("source port {} used by more than one flow", flow.source_port),
                ));
            }
        }

        if self.destination_port == 0 {
            return Err(Error::invalid_parameter("destination_port", "must be non-zero"));
        }

        if self.payload.len() + ENCAPSULATION_OVERHEAD > u16::MAX as usize {
            return Err(Error::invalid_parameter(
                "payload",
                format!("{} bytes overflows the outer IPv4 length", self.payload.len()),
            ));
        }

        Ok(())
    }

    /// Size of one encapsulated packet on the wire
    pub fn packet_len(&self) -> usize {
        self.payload.len() + ENCAPSULATION_OVERHEAD
    }
}
