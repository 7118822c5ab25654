//! MPLS shim header and label stack
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                Label                  | Exp |S|       TTL     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use ipnetwork::Ipv4Network;
use mplsgen_core::{Error, Result, MAX_MPLS_LABEL};
use std::fmt;

/// Base of the local label range assigned per VRF prefix
pub const LOCAL_LABEL_BASE: u32 = 1_000_000;

/// One MPLS label stack entry (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MplsHeader {
    /// Label value (20 bits)
    pub label: u32,
    /// Traffic class / experimental bits (3 bits)
    pub exp: u8,
    /// Bottom of stack flag
    pub bottom_of_stack: bool,
    /// Time to Live
    pub ttl: u8,
}

impl MplsHeader {
    /// Header size in bytes
    pub const SIZE: usize = 4;

    /// Create a new header, masking label and exp to their field widths
    pub fn new(label: u32, exp: u8, bottom_of_stack: bool, ttl: u8) -> Self {
        Self {
            label: label & MAX_MPLS_LABEL,
            exp: exp & 0x07,
            bottom_of_stack,
            ttl,
        }
    }

    /// Single-entry stack header: exp 0, bottom of stack set
    pub fn bottom(label: u32, ttl: u8) -> Self {
        Self::new(label, 0, true, ttl)
    }

    /// Parse one header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::parsing(format!(
                "MPLS header needs {} bytes, got {}",
                Self::SIZE,
                data.len()
            )));
        }

        let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);

        Ok(Self {
            label: word >> 12,
            exp: ((word >> 9) & 0x07) as u8,
            bottom_of_stack: (word >> 8) & 0x01 == 1,
            ttl: (word & 0xFF) as u8,
        })
    }

    /// Serialize to the 4-byte wire form
    pub fn serialize(&self) -> [u8; 4] {
        let word = ((self.label & MAX_MPLS_LABEL) << 12)
            | (((self.exp & 0x07) as u32) << 9)
            | ((self.bottom_of_stack as u32) << 8)
            | self.ttl as u32;
        word.to_be_bytes()
    }
}

impl fmt::Display for MplsHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MPLS label={} exp={} s={} ttl={}",
            self.label, self.exp, self.bottom_of_stack as u8, self.ttl
        )
    }
}

/// Parse a label stack up to and including the bottom-of-stack entry
///
/// Returns the entries and the number of bytes they occupy.
pub fn parse_label_stack(data: &[u8]) -> Result<(Vec<MplsHeader>, usize)> {
    let mut stack = Vec::new();
    let mut offset = 0;

    loop {
        let header = MplsHeader::parse(&data[offset..]).map_err(|_| {
            Error::parsing(format!(
                "MPLS label stack truncated after {} entries",
                stack.len()
            ))
        })?;
        offset += MplsHeader::SIZE;
        stack.push(header);

        if header.bottom_of_stack {
            return Ok((stack, offset));
        }
    }
}

/// Derive the MPLS local label announced for a VRF prefix.
///
/// The label is `1000000` plus the last four decimal digits of the prefix
/// address written without dots, so `10.11.12.13/24` maps to `1001213`.
/// The prefix must be IPv4 CIDR notation including its length.
pub fn local_label_for_prefix(prefix: &str) -> Result<u32> {
    if !prefix.contains('/') {
        return Err(Error::invalid_parameter(
            "prefix",
            format!("'{}' is not in CIDR notation", prefix),
        ));
    }

    let network: Ipv4Network = prefix.parse().map_err(|e| {
        Error::invalid_parameter("prefix", format!("'{}' is not an IPv4 prefix: {}", prefix, e))
    })?;

    let digits: String = network.ip().to_string().chars().filter(|c| *c != '.').collect();
    let number: u64 = digits
        .parse()
        .map_err(|e| Error::invalid_parameter("prefix", format!("'{}': {}", prefix, e)))?;

    Ok(LOCAL_LABEL_BASE + (number % 10_000) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpls_header_new_masks_fields() {
        let header = MplsHeader::new(0x1F_FFFF, 0xFF, true, 64);
        assert_eq!(header.label, 0xF_FFFF);
        assert_eq!(header.exp, 0x07);
    }

    #[test]
    fn test_mpls_header_wire_layout() {
        // 1004051 = 0xF5213
        let bytes = MplsHeader::bottom(1_004_051, 64).serialize();
        assert_eq!(bytes, [0xF5, 0x21, 0x31, 0x40]);

        let parsed = MplsHeader::parse(&bytes).unwrap();
        assert_eq!(parsed.label, 1_004_051);
        assert_eq!(parsed.exp, 0);
        assert!(parsed.bottom_of_stack);
        assert_eq!(parsed.ttl, 64);
    }

    #[test]
    fn test_mpls_header_exp_bits() {
        let bytes = MplsHeader::new(1, 5, false, 255).serialize();
        assert_eq!(bytes, [0x00, 0x00, 0x1A, 0xFF]);
    }

    #[test]
    fn test_mpls_header_too_short() {
        assert!(MplsHeader::parse(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_parse_label_stack() {
        let mut data = Vec::new();
        data.extend_from_slice(&MplsHeader::new(100, 1, false, 64).serialize());
        data.extend_from_slice(&MplsHeader::new(200, 2, true, 32).serialize());
        data.extend_from_slice(&[0x45, 0x00]);

        let (stack, consumed) = parse_label_stack(&data).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0].label, 100);
        assert_eq!(stack[1].label, 200);
        assert!(stack[1].bottom_of_stack);
    }

    #[test]
    fn test_parse_label_stack_without_bottom() {
        let data = MplsHeader::new(100, 0, false, 64).serialize();
        assert!(parse_label_stack(&data).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MplsHeader::bottom(1_004_051, 64).to_string(),
            "MPLS label=1004051 exp=0 s=1 ttl=64"
        );
    }

    #[test]
    fn test_local_label_for_prefix() {
        let cases = [
            ("1.2.3.4/24", 1_001_234),
            ("1.2.3.4/32", 1_001_234),
            ("0.0.0.0/0", 1_000_000),
            ("128.192.224.240/32", 1_004_240),
            ("10.11.12.13/24", 1_001_213),
            ("10.66.199.255/32", 1_009_255),
            ("192.0.1.2/29", 1_002_012),
        ];

        for (prefix, expected) in cases {
            let label = local_label_for_prefix(prefix).unwrap();
            assert_eq!(label, expected, "prefix {}", prefix);
            assert!(label <= MAX_MPLS_LABEL);
        }
    }

    #[test]
    fn test_local_label_for_prefix_rejects_malformed() {
        for prefix in [
            "1.2.3.4",
            "1.2.3.4/24/24",
            "1.2.3.1.24",
            "1.2.3.1\\24",
            "1.2.3./24",
            "1.2.3.4/33",
        ] {
            assert!(
                local_label_for_prefix(prefix).is_err(),
                "prefix {} should be rejected",
                prefix
            );
        }
    }
}
