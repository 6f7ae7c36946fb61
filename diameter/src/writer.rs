// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Output sinks that serialized Diameter items are appended to.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use diameter_common::{FixedBuffer, SliceBuffer};

use crate::error::{ComponentName, DiameterError};

/// Appends serialized bytes to a [`PacketWritable`], attributing any failure to the wire
/// item currently being written.
pub struct PacketWriter<'a, T: PacketWritable> {
    writable: &'a mut T,
    component: &'static str,
}

impl<'a, T: PacketWritable> PacketWriter<'a, T> {
    /// Constructs a new writer with errors reported as originating from item `C`.
    #[inline]
    pub fn new<C: ComponentName>(writable: &'a mut T) -> Self {
        Self {
            writable,
            component: C::name(),
        }
    }

    /// Updates the item that errors will be reported as originating from.
    #[inline]
    pub fn update_component<C: ComponentName>(&mut self) {
        self.component = C::name();
    }

    /// Writes the data to the writer at its current index.
    #[inline]
    pub fn write_slice(&mut self, data: &[u8]) -> Result<(), DiameterError> {
        self.writable
            .write_slice(data)
            .map_err(|_| DiameterError::insufficient_buffer(self.component))
    }

    /// Writes `count` zero bytes to the writer.
    #[inline]
    pub fn write_zeros(&mut self, count: usize) -> Result<(), DiameterError> {
        const ZEROS: [u8; 4] = [0; 4];
        let mut rem = count;
        while rem > 0 {
            let chunk = rem.min(ZEROS.len());
            self.write_slice(&ZEROS[..chunk])?;
            rem -= chunk;
        }
        Ok(())
    }

    /// Returns the current length of bytes written to the writer.
    ///
    /// Note that this is NOT the amount of available space the writer has left to write to.
    #[inline]
    pub fn len(&self) -> usize {
        self.writable.len()
    }
}

pub trait PacketWritable {
    /// Writes the data to the writer at its current index.
    fn write_slice(&mut self, data: &[u8]) -> Result<(), InsufficientSpace>;

    /// Returns the current length of bytes written to the writer.
    fn len(&self) -> usize;
}

impl PacketWritable for Vec<u8> {
    #[inline]
    fn write_slice(&mut self, data: &[u8]) -> Result<(), InsufficientSpace> {
        self.extend_from_slice(data);
        Ok(())
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<const N: usize> PacketWritable for FixedBuffer<N> {
    #[inline]
    fn write_slice(&mut self, data: &[u8]) -> Result<(), InsufficientSpace> {
        self.try_append(data).ok_or(InsufficientSpace)
    }

    #[inline]
    fn len(&self) -> usize {
        FixedBuffer::len(self)
    }
}

impl PacketWritable for SliceBuffer<'_> {
    #[inline]
    fn write_slice(&mut self, data: &[u8]) -> Result<(), InsufficientSpace> {
        self.append_or(data, InsufficientSpace)
    }

    #[inline]
    fn len(&self) -> usize {
        SliceBuffer::len(self)
    }
}

/// The underlying writable ran out of storage space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsufficientSpace;
