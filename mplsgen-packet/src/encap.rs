//! MPLS-over-UDP encapsulated ICMP echo packet
//!
//! Layer order on the wire:
//!
//! ```text
//! +-----------+-----+------+-----------+-----------+---------+
//! | outer IP  | UDP | MPLS | inner IP  | ICMP echo | payload |
//! +-----------+-----+------+-----------+-----------+---------+
//!    20 B      8 B    4 B     20 B         8 B
//! ```

use crate::icmp::{IcmpEcho, IcmpType};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::mpls::{parse_label_stack, MplsHeader};
use crate::udp::UdpDatagram;
use mplsgen_core::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// IPv4 header fields of one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Layer {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub ttl: u8,
    pub identification: u16,
}

impl Ipv4Layer {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            source,
            destination,
            ttl: Ipv4Packet::DEFAULT_TTL,
            identification: Ipv4Packet::DEFAULT_IDENTIFICATION,
        }
    }

    fn wrap(&self, protocol: IpProtocol, payload: Vec<u8>) -> Ipv4Packet {
        Ipv4Packet::new(self.source, self.destination, protocol, payload)
            .with_ttl(self.ttl)
            .with_identification(self.identification)
    }

    fn from_packet(packet: &Ipv4Packet) -> Self {
        Self {
            source: packet.source,
            destination: packet.destination,
            ttl: packet.ttl,
            identification: packet.identification,
        }
    }
}

/// UDP ports of the tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpLayer {
    pub source_port: u16,
    pub destination_port: u16,
}

/// ICMP echo header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpLayer {
    pub icmp_type: IcmpType,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
}

impl Default for IcmpLayer {
    fn default() -> Self {
        Self {
            icmp_type: IcmpType::EchoRequest,
            code: 0,
            identifier: 0,
            sequence: 0,
        }
    }
}

/// A complete MPLS-over-UDP encapsulated ICMP echo packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedPacket {
    pub outer: Ipv4Layer,
    pub udp: UdpLayer,
    pub mpls: MplsHeader,
    pub inner: Ipv4Layer,
    pub icmp: IcmpLayer,
    pub payload: Vec<u8>,
}

impl EncapsulatedPacket {
    /// Serialize every layer, innermost first, computing lengths and checksums
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let icmp = IcmpEcho {
            icmp_type: self.icmp.icmp_type,
            code: self.icmp.code,
            identifier: self.icmp.identifier,
            sequence: self.icmp.sequence,
            checksum: 0,
            payload: self.payload.clone(),
        }
        .to_bytes();

        let inner = self.inner.wrap(IpProtocol::ICMP, icmp).to_bytes()?;

        let mut labelled = Vec::with_capacity(MplsHeader::SIZE + inner.len());
        labelled.extend_from_slice(&self.mpls.serialize());
        labelled.extend_from_slice(&inner);

        let udp = UdpDatagram::new(self.udp.source_port, self.udp.destination_port, labelled)
            .to_bytes(self.outer.source, self.outer.destination)?;

        self.outer.wrap(IpProtocol::UDP, udp).to_bytes()
    }

    /// Decode a serialized packet back into its layers
    ///
    /// Exactly one MPLS label is expected; stacked labels are rejected.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let outer = Ipv4Packet::from_bytes(data)?;
        if outer.protocol != IpProtocol::UDP {
            return Err(Error::parsing(format!(
                "outer IPv4 protocol is {}, expected udp",
                outer.protocol
            )));
        }

        let udp = UdpDatagram::from_bytes(&outer.payload)?;

        let (stack, consumed) = parse_label_stack(&udp.payload)?;
        if stack.len() != 1 {
            return Err(Error::parsing(format!(
                "expected a single MPLS label, found {}",
                stack.len()
            )));
        }

        let inner = Ipv4Packet::from_bytes(&udp.payload[consumed..])?;
        if inner.protocol != IpProtocol::ICMP {
            return Err(Error::parsing(format!(
                "inner IPv4 protocol is {}, expected icmp",
                inner.protocol
            )));
        }

        let icmp = IcmpEcho::from_bytes(&inner.payload)?;

        Ok(Self {
            outer: Ipv4Layer::from_packet(&outer),
            udp: UdpLayer {
                source_port: udp.source_port,
                destination_port: udp.destination_port,
            },
            mpls: stack[0],
            inner: Ipv4Layer::from_packet(&inner),
            icmp: IcmpLayer {
                icmp_type: icmp.icmp_type,
                code: icmp.code,
                identifier: icmp.identifier,
                sequence: icmp.sequence,
            },
            payload: icmp.payload,
        })
    }

    /// Size on the wire in bytes
    pub fn len(&self) -> usize {
        Ipv4Packet::HEADER_SIZE * 2
            + UdpDatagram::HEADER_SIZE
            + MplsHeader::SIZE
            + IcmpEcho::HEADER_SIZE
            + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Escape non-printable payload bytes the way a byte string literal would
struct PayloadRepr<'a>(&'a [u8]);

impl fmt::Display for PayloadRepr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            for c in std::ascii::escape_default(byte) {
                write!(f, "{}", c as char)?;
            }
        }
        Ok(())
    }
}

/// One-line layer summary for trace output
impl fmt::Display for EncapsulatedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<IP src={} dst={} proto=udp ttl={} |<UDP sport={} dport={} |<{} |<IP src={} dst={} proto=icmp ttl={} |<ICMP type={} code={} id={} seq={} |<Raw load='{}' ({} bytes) |>>>>>>",
            self.outer.source,
            self.outer.destination,
            self.outer.ttl,
            self.udp.source_port,
            self.udp.destination_port,
            self.mpls,
            self.inner.source,
            self.inner.destination,
            self.inner.ttl,
            self.icmp.icmp_type,
            self.icmp.code,
            self.icmp.identifier,
            self.icmp.sequence,
            PayloadRepr(&self.payload),
            self.payload.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::validate_checksum;

    fn sample() -> EncapsulatedPacket {
        EncapsulatedPacket {
            outer: Ipv4Layer::new(Ipv4Addr::new(192, 168, 57, 30), Ipv4Addr::new(192, 168, 57, 10)),
            udp: UdpLayer {
                source_port: 5001,
                destination_port: 6635,
            },
            mpls: MplsHeader::bottom(1_004_051, 64),
            inner: Ipv4Layer::new(Ipv4Addr::new(100, 64, 0, 1), Ipv4Addr::new(1, 1, 1, 1)),
            icmp: IcmpLayer::default(),
            payload: b"123456789012345678901234567890".to_vec(),
        }
    }

    #[test]
    fn test_wire_offsets() {
        let packet = sample();
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(bytes.len(), 90);
        assert_eq!(packet.len(), 90);

        // Outer IPv4
        assert_eq!(bytes[0], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 90);
        assert_eq!(bytes[9], 17);
        assert_eq!(&bytes[12..16], &[192, 168, 57, 30]);
        assert_eq!(&bytes[16..20], &[192, 168, 57, 10]);
        assert!(validate_checksum(&bytes[0..20]));

        // UDP
        assert_eq!(u16::from_be_bytes([bytes[20], bytes[21]]), 5001);
        assert_eq!(u16::from_be_bytes([bytes[22], bytes[23]]), 6635);
        assert_eq!(u16::from_be_bytes([bytes[24], bytes[25]]), 70);
        assert!(UdpDatagram::checksum_valid(
            &bytes[20..],
            Ipv4Addr::new(192, 168, 57, 30),
            Ipv4Addr::new(192, 168, 57, 10)
        ));

        // MPLS
        assert_eq!(&bytes[28..32], &[0xF5, 0x21, 0x31, 0x40]);

        // Inner IPv4
        assert_eq!(bytes[32], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[34], bytes[35]]), 58);
        assert_eq!(bytes[41], 1);
        assert_eq!(&bytes[44..48], &[100, 64, 0, 1]);
        assert_eq!(&bytes[48..52], &[1, 1, 1, 1]);
        assert!(validate_checksum(&bytes[32..52]));

        // ICMP echo request
        assert_eq!(bytes[52], 8);
        assert_eq!(bytes[53], 0);
        assert!(validate_checksum(&bytes[52..]));
        assert_eq!(&bytes[60..], b"123456789012345678901234567890");
    }

    #[test]
    fn test_parse_recovers_layers() {
        let packet = sample();
        let parsed = EncapsulatedPacket::parse(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_parse_rejects_non_udp_outer() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[9] = 6;
        assert!(EncapsulatedPacket::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_rejects_stacked_labels() {
        let packet = sample();
        let inner = packet.to_bytes().unwrap()[32..].to_vec();

        let mut labelled = Vec::new();
        labelled.extend_from_slice(&MplsHeader::new(16, 0, false, 64).serialize());
        labelled.extend_from_slice(&packet.mpls.serialize());
        labelled.extend_from_slice(&inner);

        let udp = UdpDatagram::new(5001, 6635, labelled)
            .to_bytes(packet.outer.source, packet.outer.destination)
            .unwrap();
        let bytes = Ipv4Packet::new(
            packet.outer.source,
            packet.outer.destination,
            IpProtocol::UDP,
            udp,
        )
        .to_bytes()
        .unwrap();

        assert!(EncapsulatedPacket::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_truncated() {
        let bytes = sample().to_bytes().unwrap();
        assert!(EncapsulatedPacket::parse(&bytes[..40]).is_err());
    }

    #[test]
    fn test_display_summarizes_layers() {
        let line = sample().to_string();

        assert!(line.starts_with("<IP src=192.168.57.30 dst=192.168.57.10 proto=udp"));
        assert!(line.contains("<UDP sport=5001 dport=6635"));
        assert!(line.contains("<MPLS label=1004051 exp=0 s=1 ttl=64"));
        assert!(line.contains("<IP src=100.64.0.1 dst=1.1.1.1 proto=icmp"));
        assert!(line.contains("<ICMP type=echo-request code=0 id=0 seq=0"));
        assert!(line.contains("load='123456789012345678901234567890' (30 bytes)"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_display_escapes_binary_payload() {
        let mut packet = sample();
        packet.payload = vec![b'a', 0x00, b'\n'];
        assert!(packet.to_string().contains("load='a\\x00\\n' (3 bytes)"));
    }
}
