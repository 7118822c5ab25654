//! UDP datagram construction and parsing

use crate::checksum::transport_checksum;
use crate::ip::IpProtocol;
use bytes::{BufMut, BytesMut};
use mplsgen_core::{Error, Result};
use std::net::Ipv4Addr;

/// UDP datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Checksum as last serialized or parsed (0 = not computed)
    pub checksum: u16,
    /// Payload data
    pub payload: Vec<u8>,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Create a new UDP datagram
    pub fn new(source_port: u16, destination_port: u16, payload: Vec<u8>) -> Self {
        UdpDatagram {
            source_port,
            destination_port,
            checksum: 0,
            payload,
        }
    }

    /// Length field value (header + payload)
    pub fn length(&self) -> Result<u16> {
        u16::try_from(Self::HEADER_SIZE + self.payload.len()).map_err(|_| {
            Error::construction(format!(
                "UDP payload of {} bytes exceeds the maximum datagram size",
                self.payload.len()
            ))
        })
    }

    fn write(&self, buffer: &mut BytesMut, length: u16, checksum: u16) {
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u16(length);
        buffer.put_u16(checksum);
        buffer.put_slice(&self.payload);
    }

    /// Serialize with the pseudo-header checksum for the given IPv4 endpoints
    pub fn to_bytes(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<Vec<u8>> {
        let length = self.length()?;

        let mut buffer = BytesMut::with_capacity(length as usize);
        self.write(&mut buffer, length, 0);

        let checksum = transport_checksum(src_ip, dst_ip, IpProtocol::UDP.to_u8(), &buffer);
        // A computed zero is transmitted as all ones; zero means "no checksum"
        let checksum = if checksum == 0 { 0xFFFF } else { checksum };
        buffer[6..8].copy_from_slice(&checksum.to_be_bytes());

        Ok(buffer.to_vec())
    }

    /// Parse a UDP datagram, bounding the payload by the length field
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::parsing(format!(
                "UDP header needs {} bytes, got {}",
                Self::HEADER_SIZE,
                data.len()
            )));
        }

        let length = u16::from_be_bytes([data[4], data[5]]) as usize;
        if length < Self::HEADER_SIZE || data.len() < length {
            return Err(Error::parsing(format!(
                "UDP length {} does not match {} available bytes",
                length,
                data.len()
            )));
        }

        Ok(UdpDatagram {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
            payload: data[Self::HEADER_SIZE..length].to_vec(),
        })
    }

    /// Validate a serialized datagram against its IPv4 endpoints
    ///
    /// A zero checksum field means the sender skipped the checksum.
    pub fn checksum_valid(data: &[u8], src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> bool {
        if data.len() < Self::HEADER_SIZE {
            return false;
        }
        if data[6] == 0 && data[7] == 0 {
            return true;
        }

        let result = transport_checksum(src_ip, dst_ip, IpProtocol::UDP.to_u8(), data);
        result == 0 || result == 0xFFFF
    }

    /// Total datagram size in bytes
    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// A UDP datagram always carries a header
    pub fn is_empty(&self) -> bool {
        false
    }
}
