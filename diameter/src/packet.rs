// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Diameter messages: a fixed 20-byte header followed by an ordered list of AVPs.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use diameter_common::be::{self, U24_MAX};
use diameter_common::SliceBuffer;

use crate::avp::{Avp, AvpIter};
use crate::error::{ComponentName, DiameterError, ErrorClass};
use crate::flags::CommandFlags;
use crate::writer::{PacketWritable, PacketWriter};

// Command codes of the base Diameter protocol

pub const DIAM_BASE_COMM_ABORT_SESSION: u32 = 274;
pub const DIAM_BASE_COMM_ACCOUNTING: u32 = 271;
pub const DIAM_BASE_COMM_CAP_EXCHANGE: u32 = 257;
pub const DIAM_BASE_COMM_DEV_WATCHDOG: u32 = 280;
pub const DIAM_BASE_COMM_DISCONNECT_PEER: u32 = 282;
pub const DIAM_BASE_COMM_RE_AUTH: u32 = 258;
pub const DIAM_BASE_COMM_SESSION_TERM: u32 = 275;

const HEADER_SIZE: usize = 20;

/// The header of a Diameter message.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    Version    |                 Message Length                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | command flags |                  Command-Code                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Application-ID                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      Hop-by-Hop Identifier                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      End-to-End Identifier                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    version: u8,
    message_length: u32,
    command_flags: CommandFlags,
    command_code: u32,
    application_id: u32,
    hop_by_hop: u32,
    end_to_end: u32,
}

impl PacketHeader {
    /// The encoded size of the header.
    pub const SIZE: u32 = HEADER_SIZE as u32;
    /// The only protocol version this codec accepts as valid.
    pub const VERSION: u8 = 1;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the header from the first 20 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DiameterError> {
        let bytes: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                DiameterError::malformed::<Self>("insufficient bytes in Diameter packet for header")
            })?;

        // Every field lies within the 20 bytes checked above
        let field = |start: usize| be::read_u32(bytes, start).unwrap_or_default();

        Ok(PacketHeader {
            version: bytes[0],
            message_length: field(0) & U24_MAX,
            command_flags: CommandFlags::from_bits_retain(bytes[4]),
            command_code: field(4) & U24_MAX,
            application_id: field(8),
            hop_by_hop: field(12),
            end_to_end: field(16),
        })
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    #[inline]
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// The Message Length field: header plus padded AVPs, in bytes.
    #[inline]
    pub fn message_length(&self) -> u32 {
        self.message_length
    }

    /// Sets the Message Length field, failing if `length` does not fit in 24 bits.
    pub fn set_message_length(&mut self, length: u32) -> Result<(), DiameterError> {
        if length > U24_MAX {
            return Err(DiameterError::out_of_range::<Self>(
                "Message Length is out of range [0, 16777215]",
            ));
        }

        self.message_length = length;
        Ok(())
    }

    #[inline]
    pub fn with_message_length(mut self, length: u32) -> Result<Self, DiameterError> {
        self.set_message_length(length)?;
        Ok(self)
    }

    #[inline]
    pub fn command_flags(&self) -> CommandFlags {
        self.command_flags
    }

    #[inline]
    pub fn set_command_flags(&mut self, flags: CommandFlags) {
        self.command_flags = flags;
    }

    #[inline]
    pub fn with_command_flags(mut self, flags: CommandFlags) -> Self {
        self.command_flags = flags;
        self
    }

    #[inline]
    pub fn command_code(&self) -> u32 {
        self.command_code
    }

    /// Sets the Command-Code field, failing if `code` does not fit in 24 bits.
    pub fn set_command_code(&mut self, code: u32) -> Result<(), DiameterError> {
        if code > U24_MAX {
            return Err(DiameterError::out_of_range::<Self>(
                "Command Code is out of range [0, 16777215]",
            ));
        }

        self.command_code = code;
        Ok(())
    }

    #[inline]
    pub fn with_command_code(mut self, code: u32) -> Result<Self, DiameterError> {
        self.set_command_code(code)?;
        Ok(self)
    }

    #[inline]
    pub fn application_id(&self) -> u32 {
        self.application_id
    }

    #[inline]
    pub fn set_application_id(&mut self, application_id: u32) {
        self.application_id = application_id;
    }

    #[inline]
    pub fn with_application_id(mut self, application_id: u32) -> Self {
        self.application_id = application_id;
        self
    }

    #[inline]
    pub fn hop_by_hop(&self) -> u32 {
        self.hop_by_hop
    }

    #[inline]
    pub fn set_hop_by_hop(&mut self, hop_by_hop: u32) {
        self.hop_by_hop = hop_by_hop;
    }

    #[inline]
    pub fn with_hop_by_hop(mut self, hop_by_hop: u32) -> Self {
        self.hop_by_hop = hop_by_hop;
        self
    }

    #[inline]
    pub fn end_to_end(&self) -> u32 {
        self.end_to_end
    }

    #[inline]
    pub fn set_end_to_end(&mut self, end_to_end: u32) {
        self.end_to_end = end_to_end;
    }

    #[inline]
    pub fn with_end_to_end(mut self, end_to_end: u32) -> Self {
        self.end_to_end = end_to_end;
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.command_flags.is_valid()
            && self.command_code <= U24_MAX
            && self.version == Self::VERSION
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let ml = be::u24_bytes(self.message_length);
        let cc = be::u24_bytes(self.command_code);
        let app = self.application_id.to_be_bytes();
        let hop = self.hop_by_hop.to_be_bytes();
        let end = self.end_to_end.to_be_bytes();

        [
            self.version,
            ml[0],
            ml[1],
            ml[2],
            self.command_flags.bits(),
            cc[0],
            cc[1],
            cc[2],
            app[0],
            app[1],
            app[2],
            app[3],
            hop[0],
            hop[1],
            hop[2],
            hop[3],
            end[0],
            end[1],
            end[2],
            end[3],
        ]
    }

    #[inline]
    pub fn to_bytes_extended<T: PacketWritable>(
        &self,
        writer: &mut PacketWriter<'_, T>,
    ) -> Result<(), DiameterError> {
        writer.update_component::<Self>();
        writer.write_slice(&self.to_bytes())
    }
}

impl Default for PacketHeader {
    #[inline]
    fn default() -> Self {
        PacketHeader {
            version: Self::VERSION,
            message_length: 0,
            command_flags: CommandFlags::empty(),
            command_code: 0,
            application_id: 0,
            hop_by_hop: 0,
            end_to_end: 0,
        }
    }
}

impl ComponentName for PacketHeader {
    #[inline]
    fn name() -> &'static str {
        "PacketHeader"
    }
}

/// A complete Diameter message.
///
/// AVPs are kept in wire order and addressed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Packet {
    header: PacketHeader,
    avps: Vec<Avp>,
}

impl Packet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a message: the 20-byte header, then AVP records until `bytes` is exhausted.
    ///
    /// The Message Length field is not used to bound decoding; a mismatch is reported by
    /// [`is_valid()`](Self::is_valid).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DiameterError> {
        let header = PacketHeader::from_bytes(bytes)?;
        let avps = AvpIter::new(&bytes[HEADER_SIZE..])
            .collect::<Result<Vec<_>, _>>()?;

        log::trace!(
            "decoded Diameter packet: command {} with {} AVPs",
            header.command_code(),
            avps.len()
        );

        Ok(Packet { header, avps })
    }

    #[inline]
    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    #[inline]
    pub fn header_mut(&mut self) -> &mut PacketHeader {
        &mut self.header
    }

    #[inline]
    pub fn set_header(&mut self, header: PacketHeader) {
        self.header = header;
    }

    #[inline]
    pub fn with_header(mut self, header: PacketHeader) -> Self {
        self.header = header;
        self
    }

    /// Appends an AVP. Validity is not checked until [`is_valid()`](Self::is_valid).
    #[inline]
    pub fn add_avp(&mut self, avp: Avp) {
        self.avps.push(avp);
    }

    #[inline]
    pub fn with_avp(mut self, avp: Avp) -> Self {
        self.avps.push(avp);
        self
    }

    #[inline]
    pub fn avps(&self) -> &[Avp] {
        &self.avps
    }

    #[inline]
    pub fn avp_count(&self) -> usize {
        self.avps.len()
    }

    pub fn avp(&self, index: usize) -> Result<&Avp, DiameterError> {
        self.avps
            .get(index)
            .ok_or_else(|| DiameterError::invalid_access::<Self>("AVP index out of bounds"))
    }

    pub fn avp_mut(&mut self, index: usize) -> Result<&mut Avp, DiameterError> {
        self.avps
            .get_mut(index)
            .ok_or_else(|| DiameterError::invalid_access::<Self>("AVP index out of bounds"))
    }

    /// Overwrites the AVP at `index` in place, returning the AVP it replaced.
    pub fn replace_avp(&mut self, avp: Avp, index: usize) -> Result<Avp, DiameterError> {
        let slot = self.avp_mut(index)?;
        Ok(core::mem::replace(slot, avp))
    }

    /// Removes the AVP at `index`, shifting every following AVP down by one.
    pub fn erase_avp(&mut self, index: usize) -> Result<Avp, DiameterError> {
        if index >= self.avps.len() {
            return Err(DiameterError::invalid_access::<Self>(
                "AVP index out of bounds",
            ));
        }

        Ok(self.avps.remove(index))
    }

    /// The header size plus the padded size of every AVP.
    pub fn calculate_length(&self) -> u32 {
        self.avps.iter().fold(PacketHeader::SIZE, |len, avp| {
            len.saturating_add(avp.calculate_length(true))
        })
    }

    /// Stores [`calculate_length()`](Self::calculate_length) in the Message Length field.
    #[inline]
    pub fn update_length(&mut self) -> Result<(), DiameterError> {
        self.header.set_message_length(self.calculate_length())
    }

    #[inline]
    pub fn with_updated_length(mut self) -> Result<Self, DiameterError> {
        self.update_length()?;
        Ok(self)
    }

    /// Indicates whether the header and every AVP are valid and the Message Length matches
    /// the message's contents.
    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
            && self.avps.iter().all(Avp::is_valid)
            && self.header.message_length() == self.calculate_length()
    }

    /// Encodes the message, first checking [`is_valid()`](Self::is_valid) if `check_valid`
    /// is set.
    pub fn to_bytes(&self, check_valid: bool) -> Result<Vec<u8>, DiameterError> {
        let mut v = Vec::with_capacity(self.calculate_length() as usize);
        self.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut v), check_valid)?;
        Ok(v)
    }

    /// Encodes the message into `buf`, returning the number of bytes written.
    pub fn to_bytes_into(&self, buf: &mut [u8], check_valid: bool) -> Result<usize, DiameterError> {
        let mut slice = SliceBuffer::new(buf);
        self.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut slice), check_valid)?;
        Ok(slice.len())
    }

    pub fn to_bytes_extended<T: PacketWritable>(
        &self,
        writer: &mut PacketWriter<'_, T>,
        check_valid: bool,
    ) -> Result<(), DiameterError> {
        if check_valid && !self.is_valid() {
            log::debug!(
                "refusing to serialize invalid Diameter packet (command {})",
                self.header.command_code()
            );
            return Err(DiameterError::new::<Self>(
                ErrorClass::PreconditionViolation,
                "Packet is not valid",
            ));
        }

        self.header.to_bytes_extended(writer)?;
        for avp in self.avps.iter() {
            avp.to_bytes_extended(writer)?;
        }

        Ok(())
    }
}

impl ComponentName for Packet {
    #[inline]
    fn name() -> &'static str {
        "Packet"
    }
}
