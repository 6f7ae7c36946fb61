// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A byte-exact encoder/decoder for Diameter (RFC 6733) messages.
//!
//! A [`Packet`] is a [`PacketHeader`] followed by an ordered list of [`Avp`]s. Decoding
//! keeps every field as it appeared on the wire (reserved flag bits included), so a
//! decoded message re-encodes to the identical bytes. Validity is checked separately via
//! the `is_valid()` methods rather than enforced while decoding.
//!
//! ```
//! use diameter::{Avp, AvpData, AvpFlags, AvpHeader, CommandFlags, Packet, PacketHeader};
//! use diameter::packet::DIAM_BASE_COMM_DEV_WATCHDOG;
//!
//! let origin = Avp::new()
//!     .with_header(AvpHeader::new().with_code(264).with_flags(AvpFlags::MANDATORY))
//!     .with_data(AvpData::new().with_octet_string("peer.example.net"))
//!     .with_updated_length();
//!
//! let dwr = Packet::new()
//!     .with_header(
//!         PacketHeader::new()
//!             .with_command_flags(CommandFlags::REQUEST)
//!             .with_command_code(DIAM_BASE_COMM_DEV_WATCHDOG)?,
//!     )
//!     .with_avp(origin)
//!     .with_updated_length()?;
//!
//! let bytes = dwr.to_bytes(true)?;
//! assert_eq!(Packet::from_bytes(&bytes)?, dwr);
//! # Ok::<(), diameter::DiameterError>(())
//! ```
//!
//! The crate is `no_std` compatible (with `alloc`) when the default `std` feature is
//! disabled.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![allow(clippy::len_without_is_empty)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod avp;
pub mod error;
pub mod flags;
pub mod packet;
mod utils;
pub mod writer;

pub use avp::{Avp, AvpData, AvpHeader, AvpIter};
pub use error::{DiameterError, ErrorClass};
pub use flags::{AvpFlags, CommandFlags};
pub use packet::{Packet, PacketHeader};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{DIAM_BASE_COMM_CAP_EXCHANGE, DIAM_BASE_COMM_DISCONNECT_PEER};

    // Capabilities-Exchange-Request
    const CER: &str = "010001b880000101000000007ddf9e97c15f0a0a000001084000000f64726532303137\
                       00000001024000000c00000000000001024000000c00000004000001024000000c0100\
                       0016000001024000000c01000014000001024000000c01000032000001024000000c01\
                       000023000001024000000c01000024000001024000000c01000033000001024000000c\
                       01000001000001024000000c01000000000001024000000c0100005600000102400000\
                       0c01000057000001024000000c0000000a000001024000000c01000006000001024000\
                       000c00000003000001024000000c01000066000001024000000c010000380000010240\
                       00000c01000030000001024000000c01000031000001024000000c0000d90500000128\
                       400000256d6e633030322e6d63633235302e336770706e6574776f726b2e6f72670000\
                       000000010d000000144954532d4469616d657465720000012b4000000c000000010000\
                       012b4000000c00000000000001014000000e0001c0a806610000000001014000000e00\
                       01c0a8066100000000010a4000000c000000000000010b0000000c0000000100000109\
                       4000000c000028af000001034000000c00000003";

    // Disconnect-Peer-Request
    const DPR: &str = "010000648000011a000000007ddf9367c15ecb1200000108400000206e312e637573746f\
                       6d2e7463702e7365727665722e636f6d000001114000000c0000000000000128400000\
                       21637573746f6d2e74657374696e672e7365727665722e636f6d000000";

    const CER_APPLICATIONS: [u32; 20] = [
        0, 4, 16777238, 16777236, 16777266, 16777251, 16777252, 16777267, 16777217, 16777216,
        16777302, 16777303, 10, 16777222, 3, 16777318, 16777272, 16777264, 16777265, 55557,
    ];

    fn fixture(hex_str: &str) -> Vec<u8> {
        hex::decode(hex_str).unwrap()
    }

    fn avp(code: u32, flags: AvpFlags, data: AvpData) -> Avp {
        Avp::new()
            .with_header(AvpHeader::new().with_code(code).with_flags(flags))
            .with_data(data)
            .with_updated_length()
    }

    fn octets(code: u32, flags: AvpFlags, value: &[u8]) -> Avp {
        avp(code, flags, AvpData::new().with_octet_string(value))
    }

    fn unsigned(code: u32, flags: AvpFlags, value: u32) -> Avp {
        avp(code, flags, AvpData::new().with_unsigned32(value))
    }

    #[test]
    fn parse_capabilities_exchange_request() {
        let bytes = fixture(CER);
        assert_eq!(bytes.len(), 440);

        let packet = Packet::from_bytes(&bytes).unwrap();
        let header = packet.header();
        assert_eq!(header.version(), 1);
        assert_eq!(header.message_length(), 440);
        assert_eq!(header.command_code(), DIAM_BASE_COMM_CAP_EXCHANGE);
        assert_eq!(header.command_flags(), CommandFlags::REQUEST);
        assert_eq!(header.application_id(), 0);
        assert_eq!(header.hop_by_hop(), 0x7ddf_9e97);
        assert_eq!(header.end_to_end(), 0xc15f_0a0a);

        assert_eq!(packet.avp_count(), 31);
        assert!(packet.is_valid());

        let origin_host = packet.avp(0).unwrap();
        assert_eq!(origin_host.header().code(), 264);
        assert_eq!(origin_host.header().length(), 15);
        assert_eq!(origin_host.data().to_octet_string(), b"dre2017");

        let applications: Vec<u32> = packet.avps()[1..21]
            .iter()
            .map(|a| {
                assert_eq!(a.header().code(), 258);
                a.data().to_unsigned32().unwrap()
            })
            .collect();
        assert_eq!(applications, CER_APPLICATIONS);

        let product = packet.avp(22).unwrap();
        assert_eq!(product.header().code(), 269);
        assert_eq!(product.header().flags(), AvpFlags::empty());
        assert_eq!(product.data().as_bytes(), b"ITS-Diameter");

        let host_ip = packet.avp(25).unwrap();
        assert_eq!(host_ip.header().code(), 257);
        assert_eq!(host_ip.header().length(), 14);
        assert_eq!(host_ip.data().as_bytes(), [0x00, 0x01, 0xc0, 0xa8, 0x06, 0x61]);

        let vendor = packet.avp(29).unwrap();
        assert_eq!(vendor.header().code(), 265);
        assert_eq!(vendor.data().to_unsigned32(), Ok(10415));

        for avp in packet.avps() {
            assert!(!avp.header().flags().contains(AvpFlags::VENDOR_SPECIFIC));
            assert_eq!(
                avp.header().vendor_id().unwrap_err().class(),
                ErrorClass::InvalidStateAccess
            );
        }

        assert_eq!(packet.to_bytes(true).unwrap(), bytes);
    }

    #[test]
    fn build_capabilities_exchange_request() {
        let m = AvpFlags::MANDATORY;
        let host_ip: [u8; 6] = [0x00, 0x01, 0xc0, 0xa8, 0x06, 0x61];

        let mut packet = Packet::new()
            .with_header(
                PacketHeader::new()
                    .with_command_flags(CommandFlags::REQUEST)
                    .with_command_code(DIAM_BASE_COMM_CAP_EXCHANGE)
                    .unwrap()
                    .with_hop_by_hop(0x7ddf_9e97)
                    .with_end_to_end(0xc15f_0a0a),
            )
            .with_avp(octets(264, m, b"dre2017"));

        for id in CER_APPLICATIONS {
            packet.add_avp(unsigned(258, m, id));
        }

        let packet = packet
            .with_avp(octets(296, m, b"mnc002.mcc250.3gppnetwork.org"))
            .with_avp(octets(269, AvpFlags::empty(), b"ITS-Diameter"))
            .with_avp(unsigned(299, m, 1))
            .with_avp(unsigned(299, m, 0))
            .with_avp(octets(257, m, &host_ip))
            .with_avp(octets(257, m, &host_ip))
            .with_avp(unsigned(266, m, 0))
            .with_avp(unsigned(267, AvpFlags::empty(), 1))
            .with_avp(unsigned(265, m, 10415))
            .with_avp(unsigned(259, m, 3))
            .with_updated_length()
            .unwrap();

        assert!(packet.is_valid());
        assert_eq!(packet.calculate_length(), 440);
        assert_eq!(packet.to_bytes(true).unwrap(), fixture(CER));
    }

    #[test]
    fn parse_disconnect_peer_request() {
        let bytes = fixture(DPR);
        let packet = Packet::from_bytes(&bytes).unwrap();

        let header = packet.header();
        assert_eq!(header.message_length(), 100);
        assert_eq!(header.command_code(), DIAM_BASE_COMM_DISCONNECT_PEER);
        assert_eq!(header.command_flags(), CommandFlags::REQUEST);
        assert_eq!(header.application_id(), 0);
        assert_eq!(header.hop_by_hop(), 0x7ddf_9367);
        assert_eq!(header.end_to_end(), 0xc15e_cb12);

        let summary: Vec<(u32, u32)> = packet
            .avps()
            .iter()
            .map(|a| (a.header().code(), a.header().length()))
            .collect();
        assert_eq!(summary, [(264, 32), (273, 12), (296, 33)]);

        assert_eq!(
            packet.avp(0).unwrap().data().to_octet_string(),
            b"n1.custom.tcp.server.com"
        );
        assert_eq!(packet.avp(1).unwrap().data().to_unsigned32(), Ok(0));
        assert_eq!(
            packet.avp(2).unwrap().data().to_octet_string(),
            b"custom.testing.server.com"
        );
        for avp in packet.avps() {
            assert_eq!(avp.header().flags(), AvpFlags::MANDATORY);
            assert!(avp.header().vendor_id().is_err());
        }

        assert!(packet.is_valid());
        assert_eq!(packet.to_bytes(true).unwrap(), bytes);
    }

    #[test]
    fn build_disconnect_peer_request() {
        let m = AvpFlags::MANDATORY;
        let packet = Packet::new()
            .with_header(
                PacketHeader::new()
                    .with_command_flags(CommandFlags::REQUEST)
                    .with_command_code(DIAM_BASE_COMM_DISCONNECT_PEER)
                    .unwrap()
                    .with_hop_by_hop(0x7ddf_9367)
                    .with_end_to_end(0xc15e_cb12),
            )
            .with_avp(octets(264, m, b"n1.custom.tcp.server.com"))
            .with_avp(unsigned(273, m, 0))
            .with_avp(octets(296, m, b"custom.testing.server.com"))
            .with_updated_length()
            .unwrap();

        let mut buf = [0xffu8; 128];
        let written = packet.to_bytes_into(&mut buf, true).unwrap();
        assert_eq!(written, 100);
        assert_eq!(&buf[..written], fixture(DPR).as_slice());
    }

    #[test]
    fn truncated_messages_are_rejected() {
        let bytes = fixture(DPR);

        let err = Packet::from_bytes(&bytes[..19]).unwrap_err();
        assert_eq!(err.class(), ErrorClass::MalformedInput);
        assert_eq!(err.component, "PacketHeader");

        // Cut inside the final AVP's padding
        let err = Packet::from_bytes(&bytes[..98]).unwrap_err();
        assert_eq!(err.class(), ErrorClass::MalformedInput);
    }

    #[test]
    fn edited_message_reencodes() {
        let mut packet = Packet::from_bytes(&fixture(DPR)).unwrap();
        packet.avp_mut(1).unwrap().data_mut().set_unsigned32(2);
        packet.erase_avp(2).unwrap();
        assert!(!packet.is_valid());
        assert!(packet.to_bytes(true).is_err());

        packet.update_length().unwrap();
        let bytes = packet.to_bytes(true).unwrap();
        assert_eq!(bytes.len(), 64);

        let reparsed = Packet::from_bytes(&bytes).unwrap();
        assert_eq!(reparsed.avp_count(), 2);
        assert_eq!(reparsed.avp(1).unwrap().data().to_unsigned32(), Ok(2));
    }
}
