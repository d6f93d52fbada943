// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory DOM: a small arena tree with shadow roots and slots.
//!
//! ## Overview
//!
//! [`Dom`] is a reference tree for exercising event dispatch end to end. It
//! models just enough of a document to route events through encapsulation
//! boundaries:
//!
//! - a `window` sentinel and a single document;
//! - elements with a tag and string attributes, plus text nodes;
//! - shadow roots attached to elements ([`Dom::attach_shadow`]);
//! - slot assignment by the `slot` attribute of a host's child and the `name`
//!   attribute of a `slot` element, with the first unnamed slot as the default;
//! - form state: textarea values, the navigated location and recorded form
//!   submissions.
//!
//! [`Dom`] implements [`EventTree`](understory_event_path::EventTree), so it
//! can be handed straight to the path builder.
//!
//! ## Example
//!
//! ```
//! use understory_dom::Dom;
//! use understory_event_path::{BouncedPath, BuildOptions};
//!
//! let mut dom = Dom::new();
//! let host = dom.create_element("my-card");
//! dom.append_child(dom.document(), host).unwrap();
//! let shadow = dom.attach_shadow(host).unwrap();
//! let slot = dom.create_element("slot");
//! dom.append_child(shadow, slot).unwrap();
//! let title = dom.create_element("h1");
//! dom.append_child(host, title).unwrap();
//!
//! assert_eq!(dom.assigned_slot(title), Some(slot));
//!
//! let path = BouncedPath::build(&dom, title, &BuildOptions::default()).unwrap();
//! assert_eq!(
//!     path.composed_path(),
//!     [title, slot, shadow, host, dom.document(), dom.window()]
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod dom;
mod error;
mod types;

pub use dom::Dom;
pub use error::DomError;
pub use types::{NodeId, NodeKind};
