//! Example: Building an MPLS-over-UDP encapsulated echo request
//!
//! Builds the first packet of the default cycle, prints its layer summary
//! and a hex dump, then decodes the bytes again.

use mplsgen_core::EmitterConfig;
use mplsgen_packet::{EncapsulatedPacket, EncapsulatedPacketBuilder, MplsHeader};

fn main() {
    let config = EmitterConfig::default();

    let packet = EncapsulatedPacketBuilder::for_flow(&config, &config.flows[0])
        .build()
        .expect("Failed to build encapsulated packet");
    let bytes = packet.to_bytes().expect("Failed to serialize packet");

    println!("{}", packet);
    println!("Total size: {} bytes", bytes.len());
    println!("Outer IPv4 header: {:02X?}", &bytes[..20]);
    println!("UDP header: {:02X?}", &bytes[20..28]);
    println!("MPLS shim: {:02X?}", &bytes[28..32]);

    let shim = MplsHeader::parse(&bytes[28..32]).expect("Failed to parse MPLS shim");
    println!("Decoded shim: {}", shim);

    for (row, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:04x}  {}", row * 16, hex.join(" "));
    }

    let decoded = EncapsulatedPacket::parse(&bytes).expect("Failed to decode packet");
    assert_eq!(decoded, packet);
    println!("Decoded packet matches the original");
}
