// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Error returned by structural [`Dom`](crate::Dom) mutations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DomError {
    /// A `NodeId` no longer refers to a live node.
    StaleNode,
    /// The mutation would produce an invalid tree: a cycle, a child under a
    /// text node, or a window, document or shadow root placed as a child.
    HierarchyRequest,
    /// The node kind does not support the operation, for example attributes
    /// on a text node or a second shadow root on one host.
    NotSupported,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::StaleNode => "node is not alive",
            Self::HierarchyRequest => "the operation would yield an invalid node tree",
            Self::NotSupported => "the operation is not supported on this node",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for DomError {}
