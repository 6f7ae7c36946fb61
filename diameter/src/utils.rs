// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Length arithmetic shared by the AVP and packet codecs.

/// Rounds `unpadded_len` up to the next multiple of `T`.
#[inline]
pub(crate) fn padded_length<const T: usize>(unpadded_len: usize) -> usize {
    unpadded_len + ((T - (unpadded_len % T)) % T)
}

/// The number of zero bytes needed after `unpadded_len` bytes to reach a multiple of `T`.
#[inline]
pub(crate) fn padding_for<const T: usize>(unpadded_len: usize) -> usize {
    padded_length::<T>(unpadded_len) - unpadded_len
}

/// Converts an in-memory length to the width used by Diameter length fields.
///
/// Lengths that cannot be represented saturate; any such value already exceeds the 24-bit
/// wire fields and fails validation downstream.
#[inline]
pub(crate) fn wire_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_rounds_to_word_boundary() {
        assert_eq!(padded_length::<4>(0), 0);
        assert_eq!(padded_length::<4>(1), 4);
        assert_eq!(padded_length::<4>(4), 4);
        assert_eq!(padded_length::<4>(33), 36);
        assert_eq!(padding_for::<4>(15), 1);
        assert_eq!(padding_for::<4>(12), 0);
    }

    #[test]
    fn wire_len_saturates() {
        assert_eq!(wire_len(20), 20);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(wire_len(usize::MAX), u32::MAX);
    }
}
