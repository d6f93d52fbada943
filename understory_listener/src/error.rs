// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Error returned when a registration violates the listener option invariants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerError {
    /// `FIRST` was requested without `CAPTURE`.
    FirstRequiresCapture,
    /// `LAST` was requested together with `CAPTURE`.
    LastForbidsCapture,
    /// The (target, type) pair already has a live `FIRST` listener.
    DuplicateFirst,
    /// The (target, type) pair already has a live `LAST` listener.
    DuplicateLast,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::FirstRequiresCapture => "a `first` listener must be a capture listener",
            Self::LastForbidsCapture => "a `last` listener cannot be a capture listener",
            Self::DuplicateFirst => "only one `first` listener is allowed per target and type",
            Self::DuplicateLast => "only one `last` listener is allowed per target and type",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for ListenerError {}
