// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tree contract consumed by the path builder.

use core::fmt::Debug;
use core::hash::Hash;

/// A tree of event targets with encapsulation boundaries.
///
/// Nodes are small copyable handles. The builder only ever walks upward, so
/// the trait has no child accessors.
///
/// ## Sentinels
///
/// - [`window`](Self::window) is the outermost event target. It is not the
///   parent of anything; the builder appends it after a document.
/// - A document has no parent.
/// - A shadow root has no parent either; its [`host`](Self::host) links it to
///   the element it is attached to.
pub trait EventTree {
    /// Node handle.
    type Node: Copy + Eq + Hash + Debug;

    /// The `window` sentinel.
    fn window(&self) -> Self::Node;

    /// Returns `true` if `node` refers to a live event target of this tree.
    fn is_event_target(&self, node: Self::Node) -> bool;

    /// The parent node, following light-tree links only.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The host element of `node` when `node` is a shadow root.
    fn host(&self, node: Self::Node) -> Option<Self::Node>;

    /// The shadow root attached to `node`, if any.
    fn shadow_root(&self, node: Self::Node) -> Option<Self::Node>;

    /// The slot `node` is currently assigned to, if any.
    fn assigned_slot(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns `true` if `node` is a document.
    fn is_document(&self, node: Self::Node) -> bool;

    /// Returns `true` if `node` is a shadow root.
    fn is_shadow_root(&self, node: Self::Node) -> bool {
        self.host(node).is_some()
    }

    /// Returns `true` if `node` is a document-fragment-like boundary.
    fn is_boundary(&self, node: Self::Node) -> bool {
        self.is_document(node) || self.is_shadow_root(node)
    }
}
