// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Listener: a per-target event listener registry.
//!
//! ## Overview
//!
//! [`ListenerRegistry`] stores [`ListenerEntry`] values per (target, event type).
//! Besides the usual `capture`, `once` and `passive` flags, entries can be
//! registered with:
//!
//! - [`FIRST`](ListenerOptions::FIRST): always the first capture listener of its node.
//! - [`LAST`](ListenerOptions::LAST): always the last bubble listener of its node.
//! - [`SCOPED`](ListenerOptions::SCOPED): only invoked for events that originate in
//!   the listener's own context (a dispatcher policy; the registry only stores it).
//! - [`UNSTOPPABLE`](ListenerOptions::UNSTOPPABLE): ignores stop-propagation flags.
//!
//! ## Stable cursors
//!
//! Dispatchers walk a node's listeners with a [`ListenerCursor`] while the
//! listeners themselves add and remove entries. Removal during a walk only
//! sets a tombstone; entries are compacted once the last walk ends
//! (see [`ListenerRegistry::begin_walk`]). Additions never move entries a
//! cursor has already passed, because `FIRST` and `LAST` live in their own
//! slots instead of being sorted into the list, and a cursor never visits
//! entries registered after it started.
//!
//! ## Example
//!
//! ```
//! use understory_listener::{EventPhase, ListenerError, ListenerOptions, ListenerRegistry};
//!
//! let mut registry: ListenerRegistry<u32, &'static str> = ListenerRegistry::new();
//! registry.add(1, "click", "plain", ListenerOptions::empty()).unwrap();
//! registry.add(1, "click", "closing", ListenerOptions::LAST).unwrap();
//! registry.add(1, "click", "late", ListenerOptions::empty()).unwrap();
//!
//! let names: Vec<_> = registry
//!     .query(1, "click", EventPhase::Bubbling)
//!     .iter()
//!     .map(|e| *e.listener())
//!     .collect();
//! assert_eq!(names, ["plain", "late", "closing"]);
//!
//! assert_eq!(
//!     registry.add(1, "click", "second", ListenerOptions::LAST),
//!     Err(ListenerError::DuplicateLast)
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod entry;
mod error;
mod registry;

pub use entry::{EventPhase, ListenerCursor, ListenerEntry, ListenerList, ListenerOptions};
pub use error::ListenerError;
pub use registry::ListenerRegistry;
