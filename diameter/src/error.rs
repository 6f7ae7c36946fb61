// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2024 Nathaniel Bennett <me[at]nathanielbennett[dotcom]>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors returned while decoding, inspecting or encoding Diameter messages.

use thiserror::Error;

/// Allows the name of a Diameter wire item to be retrieved as a string.
///
/// The name is used to report which part of a message an error originated from.
pub trait ComponentName {
    /// The name of the item, usually (though not guaranteed to be) the same as the name of
    /// the struct.
    fn name() -> &'static str;
}

/// An error raised by any fallible codec operation.
///
/// Failures are always reported at the point of detection; the codec never truncates,
/// zero-fills or otherwise repairs its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{component}: {reason}")]
pub struct DiameterError {
    /// The wire item the error was raised by.
    pub component: &'static str,
    /// The kind of failure.
    pub class: ErrorClass,
    /// A human-readable description of the failure.
    pub reason: &'static str,
}

impl DiameterError {
    #[inline]
    pub(crate) fn new<C: ComponentName>(class: ErrorClass, reason: &'static str) -> Self {
        DiameterError {
            component: C::name(),
            class,
            reason,
        }
    }

    #[inline]
    pub(crate) fn malformed<C: ComponentName>(reason: &'static str) -> Self {
        Self::new::<C>(ErrorClass::MalformedInput, reason)
    }

    #[inline]
    pub(crate) fn invalid_access<C: ComponentName>(reason: &'static str) -> Self {
        Self::new::<C>(ErrorClass::InvalidStateAccess, reason)
    }

    #[inline]
    pub(crate) fn out_of_range<C: ComponentName>(reason: &'static str) -> Self {
        Self::new::<C>(ErrorClass::OutOfRange, reason)
    }

    #[inline]
    pub(crate) fn insufficient_buffer(component: &'static str) -> Self {
        DiameterError {
            component,
            class: ErrorClass::InsufficientBuffer,
            reason: "insufficient space in output buffer",
        }
    }

    /// The kind of failure.
    #[inline]
    pub fn class(&self) -> ErrorClass {
        self.class
    }
}

/// The kind of failure a [`DiameterError`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorClass {
    /// The input bytes (or a typed view of AVP data) do not form the requested structure.
    #[error("malformed input")]
    MalformedInput,
    /// A field or element was accessed that is not present in the current state.
    #[error("invalid state access")]
    InvalidStateAccess,
    /// A value does not fit into the wire field it was assigned to.
    #[error("value out of range")]
    OutOfRange,
    /// Serialization was requested for a message that failed validation.
    #[error("precondition violation")]
    PreconditionViolation,
    /// The output storage ran out of space during serialization.
    #[error("insufficient buffer")]
    InsufficientBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl ComponentName for Probe {
        fn name() -> &'static str {
            "Probe"
        }
    }

    #[test]
    fn display_names_component_and_reason() {
        let err = DiameterError::out_of_range::<Probe>("value exceeds 24 bits");
        assert_eq!(err.class(), ErrorClass::OutOfRange);
        assert_eq!(err.to_string(), "Probe: value exceeds 24 bits");
        assert_eq!(ErrorClass::MalformedInput.to_string(), "malformed input");
    }
}
