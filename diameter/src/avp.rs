// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Attribute-Value Pairs: the self-describing fields that make up a Diameter message body.
//!
//! AVP codes and Vendor-IDs are opaque integers here. [`AvpData`] stores the raw payload
//! and offers typed views of it (octet string, integers, floats, or a nested sequence of
//! AVPs for the _Grouped_ format), but which view applies is decided by the caller.

use core::iter::{FusedIterator, Iterator};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use diameter_common::{be, FixedBuffer, SliceBuffer};

use crate::error::{ComponentName, DiameterError};
use crate::flags::AvpFlags;
use crate::utils;
use crate::writer::{PacketWritable, PacketWriter};

const HEADER_MAX_SIZE: usize = 12;

/// The header of an AVP.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           AVP Code                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V M P r r r r r|                  AVP Length                   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Vendor-ID (opt)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The Vendor-ID field is only present (and only accessible) while the
/// [`AvpFlags::VENDOR_SPECIFIC`] bit is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AvpHeader {
    code: u32,
    flags: AvpFlags,
    length: u32,
    vendor_id: u32,
}

impl AvpHeader {
    /// Size of a header without the Vendor-ID field.
    pub const MIN_SIZE: u32 = 8;
    /// Size of a header carrying the Vendor-ID field.
    pub const MAX_SIZE: u32 = HEADER_MAX_SIZE as u32;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a header from the start of `bytes`.
    ///
    /// The Vendor-ID is read only when the Vendor-Specific bit is set and at least
    /// [`MAX_SIZE`](Self::MAX_SIZE) bytes are available; otherwise it is left as zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DiameterError> {
        let (Some(code), Some(flags), Some(length)) = (
            be::read_u32(bytes, 0),
            be::read_u8(bytes, 4),
            be::read_u24(bytes, 5),
        ) else {
            return Err(DiameterError::malformed::<Self>(
                "insufficient bytes in Diameter AVP for header",
            ));
        };

        let flags = AvpFlags::from_bits_retain(flags);
        let vendor_id = if flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            be::read_u32(bytes, 8).unwrap_or(0)
        } else {
            0
        };

        Ok(AvpHeader {
            code,
            flags,
            length,
            vendor_id,
        })
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[inline]
    pub fn set_code(&mut self, code: u32) {
        self.code = code;
    }

    #[inline]
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    #[inline]
    pub fn flags(&self) -> AvpFlags {
        self.flags
    }

    /// Replaces the header's flags.
    ///
    /// Setting [`AvpFlags::VENDOR_SPECIFIC`] does not populate the Vendor-ID; use
    /// [`set_vendor_id()`](Self::set_vendor_id) afterwards.
    #[inline]
    pub fn set_flags(&mut self, flags: AvpFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn with_flags(mut self, flags: AvpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The AVP Length field: header size plus unpadded data size.
    ///
    /// Only the low 24 bits are carried on the wire.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    #[inline]
    pub fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    #[inline]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// The Vendor-ID field, if the Vendor-Specific bit is set.
    pub fn vendor_id(&self) -> Result<u32, DiameterError> {
        if self.flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            Ok(self.vendor_id)
        } else {
            Err(DiameterError::invalid_access::<Self>(
                "Vendor-Specific bit is not set in AVP flags",
            ))
        }
    }

    /// Sets the Vendor-ID field, failing if the Vendor-Specific bit is not set.
    pub fn set_vendor_id(&mut self, vendor_id: u32) -> Result<(), DiameterError> {
        if !self.flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            return Err(DiameterError::invalid_access::<Self>(
                "Vendor-Specific bit is not set in AVP flags",
            ));
        }

        self.vendor_id = vendor_id;
        Ok(())
    }

    #[inline]
    pub fn with_vendor_id(mut self, vendor_id: u32) -> Result<Self, DiameterError> {
        self.set_vendor_id(vendor_id)?;
        Ok(self)
    }

    /// The encoded size of the header: 12 bytes with a Vendor-ID, 8 without.
    #[inline]
    pub fn size(&self) -> u32 {
        if self.flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            Self::MAX_SIZE
        } else {
            Self::MIN_SIZE
        }
    }

    /// Indicates whether the header's flags have all reserved bits clear.
    ///
    /// The Length field is not checked here; see [`Avp::is_valid()`].
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags.is_valid()
    }

    /// Encodes the header into a stack buffer of exactly [`size()`](Self::size) bytes.
    pub fn to_bytes(&self) -> FixedBuffer<HEADER_MAX_SIZE> {
        let mut buf = FixedBuffer::new();
        // 12 bytes always fit
        let _ = self.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut buf));
        buf
    }

    pub fn to_bytes_extended<T: PacketWritable>(
        &self,
        writer: &mut PacketWriter<'_, T>,
    ) -> Result<(), DiameterError> {
        // AVP Code
        writer.write_slice(&self.code.to_be_bytes())?;
        // Flags
        writer.write_slice(&[self.flags.bits()])?;
        // AVP Length
        writer.write_slice(&be::u24_bytes(self.length))?;
        // Vendor-ID
        if self.flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            writer.write_slice(&self.vendor_id.to_be_bytes())?;
        }
        Ok(())
    }
}

impl ComponentName for AvpHeader {
    #[inline]
    fn name() -> &'static str {
        "AvpHeader"
    }
}

/// The payload of an AVP.
///
/// The payload is kept as raw bytes. Setters overwrite it with the encoding of one data
/// format and the `to_*` accessors reinterpret it; no format tag is stored, since the
/// format of an AVP is assigned by its code in an external dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AvpData {
    value: Vec<u8>,
}

impl AvpData {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the given bytes without interpreting them.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        AvpData {
            value: Vec::from(bytes),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.value
    }

    /// The payload as an OctetString (the raw bytes).
    #[inline]
    pub fn to_octet_string(&self) -> Vec<u8> {
        self.value.clone()
    }

    #[inline]
    pub fn set_octet_string<B: Into<Vec<u8>>>(&mut self, value: B) {
        self.value = value.into();
    }

    #[inline]
    pub fn with_octet_string<B: Into<Vec<u8>>>(mut self, value: B) -> Self {
        self.set_octet_string(value);
        self
    }

    #[inline]
    pub fn set_integer32(&mut self, value: i32) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_integer32(mut self, value: i32) -> Self {
        self.set_integer32(value);
        self
    }

    #[inline]
    pub fn set_integer64(&mut self, value: i64) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_integer64(mut self, value: i64) -> Self {
        self.set_integer64(value);
        self
    }

    #[inline]
    pub fn set_unsigned32(&mut self, value: u32) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_unsigned32(mut self, value: u32) -> Self {
        self.set_unsigned32(value);
        self
    }

    #[inline]
    pub fn set_unsigned64(&mut self, value: u64) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_unsigned64(mut self, value: u64) -> Self {
        self.set_unsigned64(value);
        self
    }

    #[inline]
    pub fn set_float32(&mut self, value: f32) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_float32(mut self, value: f32) -> Self {
        self.set_float32(value);
        self
    }

    #[inline]
    pub fn set_float64(&mut self, value: f64) {
        self.replace_with(&value.to_be_bytes());
    }

    #[inline]
    pub fn with_float64(mut self, value: f64) -> Self {
        self.set_float64(value);
        self
    }

    #[inline]
    pub fn to_integer32(&self) -> Result<i32, DiameterError> {
        Ok(i32::from_be_bytes(self.exact("Data size is not equal 4")?))
    }

    #[inline]
    pub fn to_integer64(&self) -> Result<i64, DiameterError> {
        Ok(i64::from_be_bytes(self.exact("Data size is not equal 8")?))
    }

    #[inline]
    pub fn to_unsigned32(&self) -> Result<u32, DiameterError> {
        Ok(u32::from_be_bytes(self.exact("Data size is not equal 4")?))
    }

    #[inline]
    pub fn to_unsigned64(&self) -> Result<u64, DiameterError> {
        Ok(u64::from_be_bytes(self.exact("Data size is not equal 8")?))
    }

    #[inline]
    pub fn to_float32(&self) -> Result<f32, DiameterError> {
        Ok(f32::from_be_bytes(self.exact("Data size is not equal 4")?))
    }

    #[inline]
    pub fn to_float64(&self) -> Result<f64, DiameterError> {
        Ok(f64::from_be_bytes(self.exact("Data size is not equal 8")?))
    }

    /// Appends the full encoding of `avp` (header, data and padding) to the payload.
    ///
    /// Repeated calls build the payload of a Grouped AVP.
    pub fn add_avp(&mut self, avp: &Avp) {
        self.value.reserve(avp.calculate_length(true) as usize);
        // Writes into a `Vec` cannot fail
        let _ = avp.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut self.value));
    }

    #[inline]
    pub fn with_avp(mut self, avp: &Avp) -> Self {
        self.add_avp(avp);
        self
    }

    /// Decodes the payload as a sequence of complete, padded AVPs.
    ///
    /// An empty payload yields an empty sequence. Any truncated or overrunning record fails
    /// the whole decode.
    pub fn to_avps(&self) -> Result<Vec<Avp>, DiameterError> {
        self.avp_iter().collect()
    }

    /// Lazily decodes the payload as a sequence of AVPs.
    #[inline]
    pub fn avp_iter(&self) -> AvpIter<'_> {
        AvpIter::new(&self.value)
    }

    /// The unpadded payload size in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        utils::wire_len(self.value.len())
    }

    /// Always `true`: a payload has no structure of its own until a typed view is requested.
    #[inline]
    pub fn is_valid(&self) -> bool {
        true
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.value.clone()
    }

    #[inline]
    pub fn to_bytes_extended<T: PacketWritable>(
        &self,
        writer: &mut PacketWriter<'_, T>,
    ) -> Result<(), DiameterError> {
        writer.write_slice(&self.value)
    }

    #[inline]
    fn replace_with(&mut self, bytes: &[u8]) {
        self.value.clear();
        self.value.extend_from_slice(bytes);
    }

    #[inline]
    fn exact<const N: usize>(&self, reason: &'static str) -> Result<[u8; N], DiameterError> {
        self.value
            .as_slice()
            .try_into()
            .map_err(|_| DiameterError::malformed::<Self>(reason))
    }
}

impl ComponentName for AvpData {
    #[inline]
    fn name() -> &'static str {
        "AvpData"
    }
}

impl From<Vec<u8>> for AvpData {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        AvpData { value }
    }
}

impl From<&[u8]> for AvpData {
    #[inline]
    fn from(value: &[u8]) -> Self {
        AvpData::from_bytes(value)
    }
}

/// A single Attribute-Value Pair: a header followed by its data and zero padding up to a
/// 4-byte boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Avp {
    header: AvpHeader,
    data: AvpData,
}

impl Avp {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a single AVP from `bytes`.
    ///
    /// The header size is chosen from the Vendor-Specific bit, and the data spans from the
    /// end of the header to the AVP Length. Bytes past the AVP Length (padding) are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DiameterError> {
        // Read the flags first so the header is only decoded once at the right size
        let flags = match be::read_u8(bytes, 4) {
            Some(flags) if bytes.len() >= AvpHeader::MIN_SIZE as usize => {
                AvpFlags::from_bits_retain(flags)
            }
            _ => {
                return Err(DiameterError::malformed::<Self>(
                    "insufficient bytes in Diameter AVP for header",
                ))
            }
        };

        let header_size = if flags.contains(AvpFlags::VENDOR_SPECIFIC) {
            AvpHeader::MAX_SIZE as usize
        } else {
            AvpHeader::MIN_SIZE as usize
        };

        let header_bytes = bytes.get(..header_size).ok_or_else(|| {
            DiameterError::malformed::<Self>("insufficient bytes in Diameter AVP for Vendor-ID")
        })?;
        let header = AvpHeader::from_bytes(header_bytes)?;

        let length = header.length() as usize;
        if length < header_size {
            return Err(DiameterError::malformed::<Self>(
                "Diameter AVP Length field was too small for header",
            ));
        }

        let data = bytes.get(header_size..length).ok_or_else(|| {
            DiameterError::malformed::<Self>("insufficient bytes in Diameter AVP for Data payload")
        })?;

        Ok(Avp {
            header,
            data: AvpData::from_bytes(data),
        })
    }

    #[inline]
    pub fn header(&self) -> &AvpHeader {
        &self.header
    }

    #[inline]
    pub fn header_mut(&mut self) -> &mut AvpHeader {
        &mut self.header
    }

    #[inline]
    pub fn set_header(&mut self, header: AvpHeader) {
        self.header = header;
    }

    #[inline]
    pub fn with_header(mut self, header: AvpHeader) -> Self {
        self.header = header;
        self
    }

    #[inline]
    pub fn data(&self) -> &AvpData {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut AvpData {
        &mut self.data
    }

    #[inline]
    pub fn set_data(&mut self, data: AvpData) {
        self.data = data;
    }

    #[inline]
    pub fn with_data(mut self, data: AvpData) -> Self {
        self.data = data;
        self
    }

    /// Header size plus data size, with the data size rounded up to a multiple of 4 when
    /// `include_padding` is set.
    ///
    /// The AVP Length field carries the unpadded value; the padded value is the number of
    /// bytes the AVP occupies on the wire.
    #[inline]
    pub fn calculate_length(&self, include_padding: bool) -> u32 {
        let data_size = self.data.size();
        let data_size = if include_padding {
            utils::wire_len(utils::padded_length::<4>(data_size as usize))
        } else {
            data_size
        };

        self.header.size().saturating_add(data_size)
    }

    /// Stores the unpadded length in the header's AVP Length field.
    #[inline]
    pub fn update_length(&mut self) {
        self.header.set_length(self.calculate_length(false));
    }

    #[inline]
    pub fn with_updated_length(mut self) -> Self {
        self.update_length();
        self
    }

    /// Indicates whether the header is valid and its AVP Length matches the header and
    /// data actually present.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
            && self.data.is_valid()
            && self.header.length() == self.calculate_length(false)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.calculate_length(true) as usize);
        // Writes into a `Vec` cannot fail
        let _ = self.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut v));
        v
    }

    /// Encodes the AVP into `buf`, returning the number of bytes written.
    pub fn to_bytes_into(&self, buf: &mut [u8]) -> Result<usize, DiameterError> {
        let mut slice = SliceBuffer::new(buf);
        self.to_bytes_extended(&mut PacketWriter::new::<Self>(&mut slice))?;
        Ok(slice.len())
    }

    pub fn to_bytes_extended<T: PacketWritable>(
        &self,
        writer: &mut PacketWriter<'_, T>,
    ) -> Result<(), DiameterError> {
        writer.update_component::<Self>();
        self.header.to_bytes_extended(writer)?;
        self.data.to_bytes_extended(writer)?;
        // Padding
        writer.write_zeros(utils::padding_for::<4>(self.data.as_bytes().len()))
    }
}

impl ComponentName for Avp {
    #[inline]
    fn name() -> &'static str {
        "Avp"
    }
}

/// Decodes a concatenation of padded AVP records one at a time.
///
/// Each record must hold at least an 8-byte header, and its AVP Length rounded up to a
/// multiple of 4 must fit in the remaining bytes. The iterator yields at most one error and
/// then stops.
#[derive(Clone, Debug)]
pub struct AvpIter<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> AvpIter<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        AvpIter { bytes, offset: 0 }
    }

    /// The bytes not yet decoded.
    #[inline]
    pub fn remainder(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    fn next_record(&mut self) -> Result<Avp, DiameterError> {
        let remainder = self.remainder();

        if remainder.len() < AvpHeader::MIN_SIZE as usize {
            return Err(DiameterError::malformed::<Avp>(
                "insufficient bytes remain for an AVP header",
            ));
        }

        let header = AvpHeader::from_bytes(remainder)?;
        let len = utils::padded_length::<4>(header.length() as usize);

        if len < AvpHeader::MIN_SIZE as usize {
            return Err(DiameterError::malformed::<Avp>(
                "Diameter AVP Length field was too small for header",
            ));
        }

        let record = remainder.get(..len).ok_or_else(|| {
            DiameterError::malformed::<Avp>("Diameter AVP Length exceeds the remaining bytes")
        })?;

        let avp = Avp::from_bytes(record)?;
        self.offset += len;
        Ok(avp)
    }
}

impl Iterator for AvpIter<'_> {
    type Item = Result<Avp, DiameterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let res = self.next_record();
        if let Err(e) = &res {
            log::debug!("rejecting AVP at offset {}: {}", self.offset, e);
            self.offset = self.bytes.len();
        }

        Some(res)
    }
}

impl FusedIterator for AvpIter<'_> {}
