//! ICMP echo messages

use crate::checksum::{internet_checksum, validate_checksum};
use bytes::{BufMut, BytesMut};
use mplsgen_core::{Error, Result};
use std::fmt;

/// ICMP message types this generator knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    /// Echo reply (0)
    EchoReply,
    /// Echo request (8)
    EchoRequest,
    /// Any other type
    Other(u8),
}

impl IcmpType {
    pub fn to_u8(self) -> u8 {
        match self {
            IcmpType::EchoReply => 0,
            IcmpType::EchoRequest => 8,
            IcmpType::Other(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => IcmpType::EchoReply,
            8 => IcmpType::EchoRequest,
            val => IcmpType::Other(val),
        }
    }
}

impl fmt::Display for IcmpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcmpType::EchoReply => write!(f, "echo-reply"),
            IcmpType::EchoRequest => write!(f, "echo-request"),
            IcmpType::Other(val) => write!(f, "type-{}", val),
        }
    }
}

/// ICMP echo request/reply message
///
/// ```text
///  0       8       16              31
/// +-------+-------+---------------+
/// | Type  | Code  |   Checksum    |
/// +-------+-------+---------------+
/// |  Identifier   |   Sequence    |
/// +---------------+---------------+
/// |     Data ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpEcho {
    pub icmp_type: IcmpType,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
    /// Checksum as last serialized or parsed
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl IcmpEcho {
    /// Echo header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Echo request with code, identifier and sequence all zero
    pub fn request(payload: Vec<u8>) -> Self {
        Self {
            icmp_type: IcmpType::EchoRequest,
            code: 0,
            identifier: 0,
            sequence: 0,
            checksum: 0,
            payload,
        }
    }

    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    /// Serialize with the checksum over header and payload
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());
        buffer.put_u8(self.icmp_type.to_u8());
        buffer.put_u8(self.code);
        buffer.put_u16(0);
        buffer.put_u16(self.identifier);
        buffer.put_u16(self.sequence);
        buffer.put_slice(&self.payload);

        let checksum = internet_checksum(&buffer);
        buffer[2..4].copy_from_slice(&checksum.to_be_bytes());

        buffer.to_vec()
    }

    /// Parse an echo message; everything after the header is payload
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::parsing(format!(
                "ICMP echo header needs {} bytes, got {}",
                Self::HEADER_SIZE,
                data.len()
            )));
        }

        Ok(Self {
            icmp_type: IcmpType::from_u8(data[0]),
            code: data[1],
            checksum: u16::from_be_bytes([data[2], data[3]]),
            identifier: u16::from_be_bytes([data[4], data[5]]),
            sequence: u16::from_be_bytes([data[6], data[7]]),
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }

    /// Check the checksum of a serialized message
    pub fn checksum_valid(data: &[u8]) -> bool {
        data.len() >= Self::HEADER_SIZE && validate_checksum(data)
    }

    pub fn len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_request_defaults() {
        let echo = IcmpEcho::request(b"abc".to_vec());
        assert_eq!(echo.icmp_type, IcmpType::EchoRequest);
        assert_eq!(echo.code, 0);
        assert_eq!(echo.identifier, 0);
        assert_eq!(echo.sequence, 0);
        assert_eq!(echo.len(), 11);
    }

    #[test]
    fn test_echo_request_bytes() {
        let bytes = IcmpEcho::request(vec![]).to_bytes();

        // Type 8, code 0, checksum !0x0800
        assert_eq!(bytes, vec![0x08, 0x00, 0xF7, 0xFF, 0x00, 0x00, 0x00, 0x00]);
        assert!(IcmpEcho::checksum_valid(&bytes));
    }

    #[test]
    fn test_echo_checksum_covers_payload() {
        let bytes = IcmpEcho::request(b"123456789012345678901234567890".to_vec())
            .with_identifier(7)
            .with_sequence(3)
            .to_bytes();
        assert!(IcmpEcho::checksum_valid(&bytes));

        let mut corrupted = bytes.clone();
        corrupted[10] = b'X';
        assert!(!IcmpEcho::checksum_valid(&corrupted));

        let parsed = IcmpEcho::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.identifier, 7);
        assert_eq!(parsed.sequence, 3);
        assert_eq!(parsed.payload, b"123456789012345678901234567890");
    }

    #[test]
    fn test_icmp_type_names() {
        assert_eq!(IcmpType::EchoRequest.to_string(), "echo-request");
        assert_eq!(IcmpType::from_u8(0), IcmpType::EchoReply);
        assert_eq!(IcmpType::from_u8(3).to_string(), "type-3");
    }

    #[test]
    fn test_echo_too_short() {
        assert!(IcmpEcho::from_bytes(&[0x08, 0x00, 0x00]).is_err());
    }
}
