// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Flag bytes carried in the AVP header and the Diameter message header.
//!
//! Both flag sets keep any reserved bits they were decoded with so that a message can be
//! re-encoded byte-for-byte; [`AvpFlags::is_valid()`] and [`CommandFlags::is_valid()`]
//! report whether a reserved bit is set.

use bitflags::bitflags;

bitflags! {
    /// ```text
    ///  0 1 2 3 4 5 6 7
    /// +-+-+-+-+-+-+-+-+
    /// |V M P r r r r r|
    /// +-+-+-+-+-+-+-+-+
    /// ```
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AvpFlags: u8 {
        /// The optional Vendor-ID field is present in the AVP header.
        const VENDOR_SPECIFIC = 0b_1000_0000;
        const MANDATORY = 0b_0100_0000;
        /// The AVP is protected for end-to-end security.
        const PROTECTED = 0b_0010_0000;
    }
}

impl AvpFlags {
    /// Bits with no assigned meaning; all must be zero.
    pub const RESERVED: u8 = 0b_0001_1111;

    /// Returns the flags with `flag` set or cleared, for use in builder chains.
    #[inline]
    pub fn with(mut self, flag: AvpFlags, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Indicates whether all reserved bits are clear.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bits() & Self::RESERVED == 0
    }
}

bitflags! {
    /// ```text
    ///  0 1 2 3 4 5 6 7
    /// +-+-+-+-+-+-+-+-+
    /// |R P E T r r r r|
    /// +-+-+-+-+-+-+-+-+
    /// ```
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u8 {
        /// The message is a request (as opposed to an answer).
        const REQUEST = 0b_1000_0000;
        const PROXIABLE = 0b_0100_0000;
        /// The message contains a protocol error.
        const ERROR = 0b_0010_0000;
        /// The request is a potential retransmission.
        const RETRANSMITTED = 0b_0001_0000;
    }
}

impl CommandFlags {
    /// Bits with no assigned meaning; all must be zero.
    pub const RESERVED: u8 = 0b_0000_1111;

    /// Returns the flags with `flag` set or cleared, for use in builder chains.
    #[inline]
    pub fn with(mut self, flag: CommandFlags, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Indicates whether all reserved bits are clear.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.bits() & Self::RESERVED == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_bits_toggle_independently() {
        let flags = AvpFlags::empty()
            .with(AvpFlags::MANDATORY, true)
            .with(AvpFlags::VENDOR_SPECIFIC, true)
            .with(AvpFlags::MANDATORY, false);
        assert!(flags.contains(AvpFlags::VENDOR_SPECIFIC));
        assert!(!flags.contains(AvpFlags::MANDATORY));
        assert!(!flags.contains(AvpFlags::PROTECTED));
        assert_eq!(flags.bits(), 0x80);

        let flags = CommandFlags::REQUEST.with(CommandFlags::RETRANSMITTED, true);
        assert_eq!(flags.bits(), 0x90);
        assert!(flags.is_valid());
    }

    #[test]
    fn reserved_bits_survive_decoding() {
        let flags = CommandFlags::from_bits_retain(0x81);
        assert!(flags.contains(CommandFlags::REQUEST));
        assert!(!flags.is_valid());
        assert_eq!(flags.bits(), 0x81);
        assert!(AvpFlags::default().is_valid());
    }

    #[test]
    fn reserved_bit_law_holds_for_every_byte() {
        for byte in 0..=u8::MAX {
            let avp = AvpFlags::from_bits_retain(byte);
            assert_eq!(avp.is_valid(), byte & 0b_0001_1111 == 0, "AVP flags {byte:#04x}");
            assert_eq!(avp.bits(), byte);

            let command = CommandFlags::from_bits_retain(byte);
            assert_eq!(command.is_valid(), byte & 0b_0000_1111 == 0, "command flags {byte:#04x}");
            assert_eq!(command.bits(), byte);
        }
    }
}
