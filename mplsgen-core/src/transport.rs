//! Packet transmission
//!
//! The emitter hands fully serialized IPv4 packets to a [`Transmitter`].
//! [`RawIpTransmitter`] writes them to a raw socket that carries the
//! caller's IPv4 header, so the kernel routes the outer destination and
//! picks the egress interface.

use crate::{Error, Result};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_transport::{transport_channel, TransportChannelType, TransportSender};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, info};

/// Socket buffer size for the raw channel
const CHANNEL_BUFFER_SIZE: usize = 4096;

/// Sink for serialized packets
pub trait Transmitter: Send {
    /// Hand one complete IPv4 packet to the network stack
    ///
    /// Returns the number of bytes accepted. The call blocks until the stack
    /// takes the packet; delivery is never confirmed.
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// Short name for logging
    fn name(&self) -> &str;
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        (**self).send(packet, destination)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Layer 3 raw socket with a caller-supplied IPv4 header
pub struct RawIpTransmitter {
    tx: TransportSender,
}

impl RawIpTransmitter {
    /// Open the raw socket
    ///
    /// Requires CAP_NET_RAW (or root); without it this fails with
    /// [`Error::InsufficientPrivileges`].
    pub fn open() -> Result<Self> {
        let channel_type = TransportChannelType::Layer3(IpNextHeaderProtocols::Udp);

        let (tx, _) = transport_channel(CHANNEL_BUFFER_SIZE, channel_type).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                Error::InsufficientPrivileges(format!(
                    "opening a raw IPv4 socket requires CAP_NET_RAW: {}",
                    e
                ))
            } else {
                Error::Transport(format!("failed to open raw IPv4 socket: {}", e))
            }
        })?;

        info!("Opened raw IPv4 socket");

        Ok(Self { tx })
    }
}

impl Transmitter for RawIpTransmitter {
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let ip = Ipv4Packet::new(packet).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes is shorter than an IPv4 header", packet.len()),
            )
        })?;

        self.tx.send_to(ip, IpAddr::V4(destination))
    }

    fn name(&self) -> &str {
        "raw-ipv4"
    }
}

/// Accepts and discards every packet
#[derive(Debug, Default)]
pub struct DryRunTransmitter;

impl DryRunTransmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Transmitter for DryRunTransmitter {
    fn send(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        debug!(
            destination = %destination,
            size = packet.len(),
            "Dry run, packet discarded"
        );
        Ok(packet.len())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
