//! Packet construction and parsing for MPLS-over-UDP test traffic
//!
//! This crate builds the packets the generator emits: an outer IPv4/UDP
//! envelope addressed to the MPLS-in-UDP port, one MPLS label stack entry,
//! and a tunnelled IPv4 ICMP echo request with a fixed payload.
//!
//! - [`builder`] - Fluent API for assembling an encapsulated packet
//! - [`encap`] - The layered packet, its serializer, decoder and trace line
//! - [`mpls`] - MPLS shim header, label stacks, local-label derivation
//! - [`ip`] - IPv4 packets
//! - [`udp`] - UDP datagrams with pseudo-header checksum
//! - [`icmp`] - ICMP echo messages
//! - [`checksum`] - Internet checksum
//!
//! # Quick Start
//!
//! ```rust
//! use mplsgen_core::EmitterConfig;
//! use mplsgen_packet::{EncapsulatedPacket, EncapsulatedPacketBuilder};
//!
//! let config = EmitterConfig::default();
//! let packet = EncapsulatedPacketBuilder::for_flow(&config, &config.flows[0])
//!     .build()
//!     .unwrap();
//!
//! let bytes = packet.to_bytes().unwrap();
//! let decoded = EncapsulatedPacket::parse(&bytes).unwrap();
//! assert_eq!(decoded.mpls.label, 1004051);
//! ```

pub mod builder;
pub mod checksum;
pub mod encap;
pub mod icmp;
pub mod ip;
pub mod mpls;
pub mod udp;

pub use builder::EncapsulatedPacketBuilder;
pub use checksum::{internet_checksum, transport_checksum};
pub use encap::{EncapsulatedPacket, IcmpLayer, Ipv4Layer, UdpLayer};
pub use icmp::{IcmpEcho, IcmpType};
pub use ip::{IpProtocol, Ipv4Packet};
pub use mpls::{local_label_for_prefix, MplsHeader};
pub use udp::UdpDatagram;
