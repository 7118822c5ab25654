//! IPv4 packet construction and parsing
//!
//! Both the outer transport envelope and the tunnelled tenant packet are
//! plain 20-byte IPv4 headers without options.

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use mplsgen_core::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// IP protocol numbers carried by generated packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// UDP (17)
    UDP,
    /// Any other protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::UDP => 17,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Custom(val),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::ICMP => write!(f, "icmp"),
            IpProtocol::UDP => write!(f, "udp"),
            IpProtocol::Custom(val) => write!(f, "{}", val),
        }
    }
}

/// IP Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// No flags set
    pub const NONE: IpFlags = IpFlags {
        dont_fragment: false,
        more_fragments: false,
    };

    /// Convert to the 3-bit field (reserved bit always clear)
    pub fn to_u8(self) -> u8 {
        ((self.dont_fragment as u8) << 1) | (self.more_fragments as u8)
    }

    /// Parse from the 3-bit field
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

/// IPv4 packet without options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    /// Type of Service / DSCP
    pub tos: u8,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Time to Live
    pub ttl: u8,
    /// Protocol
    pub protocol: IpProtocol,
    /// Header checksum as last serialized or parsed
    pub checksum: u16,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Payload data
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// IPv4 header size without options
    pub const HEADER_SIZE: usize = 20;

    /// Default Time to Live
    pub const DEFAULT_TTL: u8 = 64;

    /// Default identification, the value crafted-packet tools conventionally use
    pub const DEFAULT_IDENTIFICATION: u16 = 1;

    /// Create a new IPv4 packet with default header values
    pub fn new(
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: IpProtocol,
        payload: Vec<u8>,
    ) -> Self {
        Ipv4Packet {
            tos: 0,
            identification: Self::DEFAULT_IDENTIFICATION,
            flags: IpFlags::NONE,
            ttl: Self::DEFAULT_TTL,
            protocol,
            checksum: 0,
            source,
            destination,
            payload,
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Total length field value (header + payload)
    pub fn total_length(&self) -> Result<u16> {
        u16::try_from(Self::HEADER_SIZE + self.payload.len()).map_err(|_| {
            Error::construction(format!(
                "IPv4 payload of {} bytes exceeds the maximum packet size",
                self.payload.len()
            ))
        })
    }

    fn write_header(&self, buffer: &mut BytesMut, total_length: u16, checksum: u16) {
        // Version 4, IHL 5
        buffer.put_u8(0x45);
        buffer.put_u8(self.tos);
        buffer.put_u16(total_length);
        buffer.put_u16(self.identification);
        // Flags + zero fragment offset
        buffer.put_u16((self.flags.to_u8() as u16) << 13);
        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol.to_u8());
        buffer.put_u16(checksum);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());
    }

    /// Serialize the header (with computed checksum) followed by the payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let total_length = self.total_length()?;

        let mut header = BytesMut::with_capacity(Self::HEADER_SIZE);
        self.write_header(&mut header, total_length, 0);
        let checksum = internet_checksum(&header);

        let mut buffer = BytesMut::with_capacity(total_length as usize);
        self.write_header(&mut buffer, total_length, checksum);
        buffer.put_slice(&self.payload);

        Ok(buffer.to_vec())
    }

    /// Parse an IPv4 packet
    ///
    /// The payload is bounded by the total length field, so trailing link
    /// padding is discarded.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::parsing(format!(
                "IPv4 header needs {} bytes, got {}",
                Self::HEADER_SIZE,
                data.len()
            )));
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(Error::parsing(format!("IP version {} is not IPv4", version)));
        }

        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if header_len < Self::HEADER_SIZE || data.len() < header_len {
            return Err(Error::parsing(format!("bad IPv4 header length {}", header_len)));
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]) as usize;
        if total_length < header_len || data.len() < total_length {
            return Err(Error::parsing(format!(
                "IPv4 total length {} does not match {} available bytes",
                total_length,
                data.len()
            )));
        }

        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);

        Ok(Ipv4Packet {
            tos: data[1],
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            ttl: data[8],
            protocol: IpProtocol::from_u8(data[9]),
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            payload: data[header_len..total_length].to_vec(),
        })
    }

    /// Total packet size in bytes
    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// An IPv4 packet always carries a header
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::validate_checksum;

    fn sample() -> Ipv4Packet {
        Ipv4Packet::new(
            Ipv4Addr::new(100, 64, 0, 1),
            Ipv4Addr::new(1, 1, 1, 1),
            IpProtocol::ICMP,
            vec![0x01, 0x02, 0x03, 0x04],
        )
    }

    #[test]
    fn test_ip_protocol_conversion() {
        assert_eq!(IpProtocol::ICMP.to_u8(), 1);
        assert_eq!(IpProtocol::UDP.to_u8(), 17);
        assert_eq!(IpProtocol::from_u8(17), IpProtocol::UDP);
        assert_eq!(IpProtocol::from_u8(47), IpProtocol::Custom(47));
    }

    #[test]
    fn test_ip_flags() {
        let flags = IpFlags {
            dont_fragment: true,
            more_fragments: false,
        };
        assert_eq!(flags.to_u8(), 0b010);
        assert_eq!(IpFlags::from_u8(0b010), flags);
        assert_eq!(IpFlags::NONE.to_u8(), 0);
    }

    #[test]
    fn test_ipv4_defaults() {
        let packet = sample();
        assert_eq!(packet.ttl, 64);
        assert_eq!(packet.identification, 1);
        assert_eq!(packet.flags, IpFlags::NONE);
        assert_eq!(packet.len(), 24);
    }

    #[test]
    fn test_ipv4_to_bytes() {
        let bytes = sample().to_bytes().unwrap();

        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 24);
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 0);
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 1);
        assert_eq!(&bytes[12..16], &[100, 64, 0, 1]);
        assert_eq!(&bytes[16..20], &[1, 1, 1, 1]);
        assert_eq!(&bytes[20..], &[0x01, 0x02, 0x03, 0x04]);
        assert!(validate_checksum(&bytes[..20]));
    }

    #[test]
    fn test_ipv4_parse_keeps_fields() {
        let packet = sample().with_ttl(9).with_identification(0x1234);
        let bytes = packet.to_bytes().unwrap();
        let parsed = Ipv4Packet::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.source, packet.source);
        assert_eq!(parsed.destination, packet.destination);
        assert_eq!(parsed.ttl, 9);
        assert_eq!(parsed.identification, 0x1234);
        assert_eq!(parsed.protocol, IpProtocol::ICMP);
        assert_eq!(parsed.payload, packet.payload);
    }

    #[test]
    fn test_ipv4_parse_discards_trailing_padding() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.extend_from_slice(&[0u8; 6]);

        let parsed = Ipv4Packet::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.payload, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_ipv4_parse_errors() {
        assert!(Ipv4Packet::from_bytes(&[0x45; 10]).is_err());

        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = 0x65;
        assert!(Ipv4Packet::from_bytes(&bytes).is_err());

        let bytes = sample().to_bytes().unwrap();
        assert!(Ipv4Packet::from_bytes(&bytes[..22]).is_err());
    }

    #[test]
    fn test_ipv4_payload_too_large() {
        let packet = Ipv4Packet::new(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::LOCALHOST,
            IpProtocol::UDP,
            vec![0u8; 65516],
        );
        assert!(packet.to_bytes().is_err());
    }
}
