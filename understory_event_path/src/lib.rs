// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Event Path: bounced event paths across encapsulation boundaries.
//!
//! ## Overview
//!
//! A DOM-like tree with shadow roots and slots does not have a single
//! propagation path. Each shadow root starts a new *context*, and content
//! projected through a slot is visited inside the slot's own context. This
//! crate partitions the ancestor chain of a dispatch target into those
//! contexts and returns them as a [`BouncedPath`].
//!
//! It does not run listeners. A dispatcher (for example `understory_dispatch`)
//! walks the contexts and applies its own stop and default-action policies.
//!
//! ## Inputs
//!
//! Implement [`EventTree`] for your tree. The trait exposes exactly what the
//! builder needs: `parent`, `host`, `shadow_root`, `assigned_slot`, and the
//! `window`/document sentinels.
//!
//! ## Ordering
//!
//! Contexts are ordered innermost-first: every context comes before the
//! context that contains its host, and sibling contexts that hang off the same
//! outer path are ordered nearest-to-target first.
//!
//! [`BouncedPath::flattened`] interleaves all contexts into a single
//! root→target sequence that matches the composed path a browser reports.
//!
//! ## Example
//!
//! ```
//! use understory_event_path::{BouncedPath, BuildOptions, EventTree};
//!
//! // window(0) <- document(1) <- body(2) <- button(3)
//! struct Flat;
//! impl EventTree for Flat {
//!     type Node = u32;
//!     fn window(&self) -> u32 { 0 }
//!     fn is_event_target(&self, node: u32) -> bool { node <= 3 }
//!     fn parent(&self, node: u32) -> Option<u32> { (node >= 2).then(|| node - 1) }
//!     fn host(&self, _: u32) -> Option<u32> { None }
//!     fn shadow_root(&self, _: u32) -> Option<u32> { None }
//!     fn assigned_slot(&self, _: u32) -> Option<u32> { None }
//!     fn is_document(&self, node: u32) -> bool { node == 1 }
//! }
//!
//! let path = BouncedPath::build(&Flat, 3, &BuildOptions::default()).unwrap();
//! assert_eq!(path.contexts().len(), 1);
//! assert_eq!(path.contexts()[0].root(), 0);
//! assert_eq!(path.composed_path(), vec![3, 2, 1, 0]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod path;
mod tree;

pub use error::PathError;
pub use path::{BouncedPath, BuildOptions, ContextKind, PathScope, PropagationContext};
pub use tree::EventTree;
