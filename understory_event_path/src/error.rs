// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Error returned when a bounced path cannot be built.
///
/// Both variants are argument errors: the caller passed a node the tree does
/// not know, or a propagation root that is not a boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathError {
    /// The dispatch target is not a live event target of the tree.
    NotAnEventTarget,
    /// The explicit propagation root is neither a document, a shadow root, nor `window`.
    InvalidRoot,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnEventTarget => f.write_str("dispatch target is not an event target"),
            Self::InvalidRoot => f.write_str(
                "propagation root must be a document, a shadow root, or the window",
            ),
        }
    }
}

impl core::error::Error for PathError {}
