// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identifiers and kinds.

use alloc::boxed::Box;

/// Identifier for a node in a [`Dom`](crate::Dom).
///
/// A slot index plus a generation counter. Removing a node frees its slot;
/// handles to it become stale and never alias the node that reuses the slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The `window` sentinel.
    Window,
    /// The document.
    Document,
    /// An element with a lower-case tag name.
    Element(Box<str>),
    /// A shadow root.
    ShadowRoot,
    /// A text node.
    Text(Box<str>),
}

impl NodeKind {
    /// Returns `true` for nodes that may be inserted as children.
    pub fn is_insertable(&self) -> bool {
        matches!(self, Self::Element(_) | Self::Text(_))
    }

    /// Returns `true` for nodes that may hold children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Document | Self::Element(_) | Self::ShadowRoot)
    }
}
