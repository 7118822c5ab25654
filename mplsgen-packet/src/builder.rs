//! Fluent builder for encapsulated packets
//!
//! Layers are added outermost first and checked for completeness in
//! [`EncapsulatedPacketBuilder::build`].

use crate::encap::{EncapsulatedPacket, IcmpLayer, Ipv4Layer, UdpLayer};
use crate::mpls::MplsHeader;
use mplsgen_core::{EmitterConfig, Error, Flow, Result, MAX_MPLS_LABEL};
use std::net::Ipv4Addr;

/// Builder for [`EncapsulatedPacket`]
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use mplsgen_packet::EncapsulatedPacketBuilder;
///
/// let packet = EncapsulatedPacketBuilder::new()
///     .outer_ipv4(Ipv4Addr::new(192, 168, 57, 30), Ipv4Addr::new(192, 168, 57, 10))
///     .udp(5001, 6635)
///     .mpls(1004051, 64)
///     .inner_ipv4(Ipv4Addr::new(100, 64, 0, 1), Ipv4Addr::new(1, 1, 1, 1))
///     .icmp_echo_request()
///     .payload(b"123456789012345678901234567890".to_vec())
///     .build()
///     .unwrap();
///
/// assert_eq!(packet.to_bytes().unwrap().len(), 90);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EncapsulatedPacketBuilder {
    outer: Option<Ipv4Layer>,
    udp: Option<UdpLayer>,
    mpls: Option<(u32, u8)>,
    inner: Option<Ipv4Layer>,
    icmp: Option<IcmpLayer>,
    payload: Vec<u8>,
}

impl EncapsulatedPacketBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with every layer for one flow of `config`
    pub fn for_flow(config: &EmitterConfig, flow: &Flow) -> Self {
        Self::new()
            .outer_ipv4(config.outer_source, config.outer_destination)
            .udp(flow.source_port, config.destination_port)
            .mpls(config.label, config.mpls_ttl)
            .inner_ipv4(flow.inner_source, config.inner_destination)
            .icmp_echo_request()
            .payload(config.payload.clone())
    }

    /// Add the outer (transport envelope) IPv4 layer
    pub fn outer_ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.outer = Some(Ipv4Layer::new(src, dst));
        self
    }

    /// Add the UDP tunnel layer
    pub fn udp(mut self, src_port: u16, dst_port: u16) -> Self {
        self.udp = Some(UdpLayer {
            source_port: src_port,
            destination_port: dst_port,
        });
        self
    }

    /// Add a bottom-of-stack MPLS label
    pub fn mpls(mut self, label: u32, ttl: u8) -> Self {
        self.mpls = Some((label, ttl));
        self
    }

    /// Add the inner (tenant) IPv4 layer
    pub fn inner_ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.inner = Some(Ipv4Layer::new(src, dst));
        self
    }

    /// Add an ICMP echo request with zero identifier and sequence
    pub fn icmp_echo_request(mut self) -> Self {
        self.icmp = Some(IcmpLayer::default());
        self
    }

    /// Set the payload data
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Assemble the packet
    ///
    /// # Errors
    ///
    /// Returns an error if a layer is missing or the label does not fit in
    /// 20 bits.
    pub fn build(self) -> Result<EncapsulatedPacket> {
        let outer = self
            .outer
            .ok_or_else(|| Error::construction("outer IPv4 layer is required"))?;
        let udp = self
            .udp
            .ok_or_else(|| Error::construction("UDP layer is required"))?;
        let (label, ttl) = self
            .mpls
            .ok_or_else(|| Error::construction("MPLS layer is required"))?;
        let inner = self
            .inner
            .ok_or_else(|| Error::construction("inner IPv4 layer is required"))?;
        let icmp = self
            .icmp
            .ok_or_else(|| Error::construction("ICMP layer is required"))?;

        if label > MAX_MPLS_LABEL {
            return Err(Error::construction(format!(
                "MPLS label {} does not fit in 20 bits",
                label
            )));
        }

        Ok(EncapsulatedPacket {
            outer,
            udp,
            mpls: MplsHeader::bottom(label, ttl),
            inner,
            icmp,
            payload: self.payload,
        })
    }
}
