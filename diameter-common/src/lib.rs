// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Byte buffers and big-endian field helpers used by the `diameter` codec.
//!
//! Diameter headers mix full-width (32-bit) and partial-width (24-bit) big-endian fields.
//! The [`be`] module covers reading and writing both; [`FixedBuffer`] and [`SliceBuffer`]
//! are bounded sinks that serialized headers and messages can be appended to without
//! touching the heap.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

use core::ops::Deref;

/// A stack-allocated byte buffer with a fixed capacity of `N` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedBuffer<const N: usize> {
    buf: [u8; N],
    buf_len: usize,
}

impl<const N: usize> FixedBuffer<N> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.buf_len]
    }

    /// Appends the provided bytes to the buffer, returning `None` if insufficient space is
    /// available in the buffer.
    #[inline]
    pub fn try_append(&mut self, bytes: &[u8]) -> Option<()> {
        let dst = self.buf.get_mut(self.buf_len..self.buf_len + bytes.len())?;
        dst.copy_from_slice(bytes);
        self.buf_len += bytes.len();
        Some(())
    }

    /// The length of the stored buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf_len == 0
    }

    /// The number of unused bytes in the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        N - self.buf_len
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    #[inline]
    fn default() -> Self {
        Self {
            buf: [0; N],
            buf_len: 0,
        }
    }
}

impl<const N: usize> Deref for FixedBuffer<N> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBuffer<N> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// A cursor that appends bytes into caller-provided storage.
#[derive(Debug)]
pub struct SliceBuffer<'a> {
    buf: &'a mut [u8],
    buf_len: usize,
}

impl<'a> SliceBuffer<'a> {
    #[inline]
    pub fn new(slice: &'a mut [u8]) -> Self {
        Self {
            buf: slice,
            buf_len: 0,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.buf_len]
    }

    /// Appends the provided bytes to the buffer, returning `error` if insufficient space is
    /// available in the buffer. Nothing is written on failure.
    #[inline]
    pub fn append_or<T>(&mut self, bytes: &[u8], error: T) -> Result<(), T> {
        let buf_slice = self
            .buf
            .get_mut(self.buf_len..self.buf_len + bytes.len())
            .ok_or(error)?;
        buf_slice.copy_from_slice(bytes);
        self.buf_len += bytes.len();
        Ok(())
    }

    /// The number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf_len == 0
    }

    /// The number of unused bytes in the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.buf_len
    }

    /// Consumes the cursor, returning the written portion of the underlying storage.
    #[inline]
    pub fn into_written(self) -> &'a mut [u8] {
        &mut self.buf[..self.buf_len]
    }
}

/// Big-endian reads and writes of fixed- and partial-width unsigned fields.
///
/// Every read returns `None` when the requested bytes extend past the end of the slice.
pub mod be {
    /// The largest value representable by a 24-bit field.
    pub const U24_MAX: u32 = 0x_00FF_FFFF;

    #[inline]
    pub fn array<const T: usize>(bytes: &[u8], start: usize) -> Option<[u8; T]> {
        bytes.get(start..start.checked_add(T)?)?.try_into().ok()
    }

    #[inline]
    pub fn read_u8(bytes: &[u8], start: usize) -> Option<u8> {
        bytes.get(start).copied()
    }

    /// Reads a 3-byte big-endian field into the low bits of a `u32`.
    #[inline]
    pub fn read_u24(bytes: &[u8], start: usize) -> Option<u32> {
        let [b0, b1, b2] = array::<3>(bytes, start)?;
        Some(u32::from_be_bytes([0, b0, b1, b2]))
    }

    #[inline]
    pub fn read_u32(bytes: &[u8], start: usize) -> Option<u32> {
        Some(u32::from_be_bytes(array(bytes, start)?))
    }

    #[inline]
    pub fn read_u64(bytes: &[u8], start: usize) -> Option<u64> {
        Some(u64::from_be_bytes(array(bytes, start)?))
    }

    /// The low 3 bytes of `value` in network order. The high byte is discarded.
    #[inline]
    pub fn u24_bytes(value: u32) -> [u8; 3] {
        let [_, b0, b1, b2] = value.to_be_bytes();
        [b0, b1, b2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_buffer_rejects_overflow() {
        let mut buf = FixedBuffer::<4>::new();
        assert_eq!(buf.try_append(&[1, 2, 3]), Some(()));
        assert_eq!(buf.try_append(&[4, 5]), None);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        assert_eq!(buf.remaining(), 1);
        assert_eq!(buf.try_append(&[4]), Some(()));
        assert_eq!(&*buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn slice_buffer_leaves_storage_untouched_on_failure() {
        let mut storage = [0xAA; 5];
        let mut buf = SliceBuffer::new(&mut storage);
        buf.append_or(&[1, 2, 3], "full").unwrap();
        assert_eq!(buf.append_or(&[4, 5, 6], "full"), Err("full"));
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.remaining(), 2);
        assert_eq!(buf.into_written(), &[1, 2, 3]);
        assert_eq!(storage, [1, 2, 3, 0xAA, 0xAA]);
    }

    #[test]
    fn partial_width_fields() {
        let bytes = [0x01, 0x00, 0x01, 0xb8, 0x80];
        assert_eq!(be::read_u24(&bytes, 1), Some(0x1b8));
        assert_eq!(be::read_u24(&bytes, 3), None);
        assert_eq!(be::read_u32(&bytes, 1), Some(0x0001_b880));
        assert_eq!(be::read_u8(&bytes, 5), None);
        assert_eq!(be::u24_bytes(0xAB12_3456), [0x12, 0x34, 0x56]);
        assert_eq!(be::read_u64(&[0, 0, 0, 0, 0, 0, 1, 0], 0), Some(256));
        assert_eq!(be::read_u32(&bytes, usize::MAX), None);
    }
}
