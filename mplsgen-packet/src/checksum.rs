//! Internet checksum (RFC 1071)
//!
//! Used by the outer and inner IPv4 headers, the UDP datagram (with its
//! pseudo-header) and the ICMP echo message.

use std::net::Ipv4Addr;

/// Sum 16-bit big-endian words into a 32-bit accumulator
fn accumulate(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }

    // Odd trailing byte is padded with zero on the right
    if let Some(&byte) = chunks.remainder().first() {
        sum += (byte as u32) << 8;
    }

    sum
}

/// Fold carries and take the one's complement
fn finish(mut sum: u32) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !sum as u16
}

/// Calculates the Internet checksum of `data`.
///
/// # Examples
///
/// ```
/// use mplsgen_packet::checksum::internet_checksum;
///
/// let header = [0x45, 0x00, 0x00, 0x1c];
/// let checksum = internet_checksum(&header);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    finish(accumulate(0, data))
}

/// Calculates a TCP/UDP checksum including the IPv4 pseudo-header.
///
/// `data` is the transport header (with a zeroed checksum field) followed by
/// its payload.
pub fn transport_checksum(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, data: &[u8]) -> u16 {
    let mut pseudo_header = [0u8; 12];
    pseudo_header[0..4].copy_from_slice(&src_ip.octets());
    pseudo_header[4..8].copy_from_slice(&dst_ip.octets());
    pseudo_header[9] = protocol;
    pseudo_header[10..12].copy_from_slice(&(data.len() as u16).to_be_bytes());

    let sum = accumulate(0, &pseudo_header);
    finish(accumulate(sum, data))
}

/// Validates data that already contains its checksum field.
///
/// A correct checksum sums to zero (or 0xFFFF, its one's complement twin).
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}
