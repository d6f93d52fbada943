// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Dispatch: capture/target/bubble dispatch that bounces across
//! shadow boundaries, with scoped stops and default-action arbitration.
//!
//! ## Overview
//!
//! The [`Engine`] owns a host tree, a [`ListenerRegistry`](understory_listener::ListenerRegistry)
//! and a stack of running dispatches. [`Engine::dispatch_event`] builds the
//! [`BouncedPath`] of the target once, turns it into a schedule of visits and
//! walks it, invoking listeners through an [`EventCx`].
//!
//! - Composed events follow the flattened (browser) composed path.
//! - Bubbling events that are not composed bounce: each context runs its own
//!   capture, at-target and bubble phases, innermost context first.
//! - Other events stay in the target's context.
//!
//! ## Stops
//!
//! [`EventCx::stop_propagation`] takes a [`StopScope`]. The default,
//! [`StopScope::Context`], only vetoes the rest of the caller's context, so a
//! parallel slotted context still runs. [`StopScope::Global`] stops the whole
//! dispatch. Listeners registered as
//! [`UNSTOPPABLE`](ListenerOptions::UNSTOPPABLE) run regardless.
//!
//! ## Default actions
//!
//! Every context has one default-action slot ([`DefaultActions`]).
//! Listeners offer an action with [`EventCx::set_default`] and veto their own
//! context with [`EventCx::prevent_default`].
//! Native actions come from [`DispatchHost::native_default_action`]. After
//! propagation the innermost action that was not prevented runs, exactly once.
//!
//! ## Turns
//!
//! The engine carries a FIFO task queue. Asynchronous dispatches
//! ([`DispatchMode::Async`]) run one phase batch per task, and listener
//! failures are reported on a later turn as an `error` event at `window`.
//! The embedder drives the queue with [`Engine::run_until_idle`].
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use understory_dispatch::{
//!     DispatchOptions, Engine, Event, EventCx, Listener, ListenerOptions, StopScope,
//! };
//! use understory_dom::Dom;
//!
//! let mut dom = Dom::new();
//! let list = dom.create_element("ul");
//! dom.append_child(dom.document(), list).unwrap();
//! let item = dom.create_element("li");
//! dom.append_child(list, item).unwrap();
//!
//! let mut engine = Engine::new(dom);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! let listener = Listener::new(move |cx: &mut EventCx<'_, Dom>| {
//!     log.borrow_mut().push(cx.current_target());
//!     cx.stop_propagation(StopScope::Context);
//!     Ok(())
//! });
//! engine
//!     .add_event_listener(list, "ping", &listener, ListenerOptions::empty())
//!     .unwrap();
//! let document = engine.host().document();
//! engine
//!     .add_event_listener(document, "ping", &listener, ListenerOptions::empty())
//!     .unwrap();
//!
//! let event = Event::new("ping").with_bubbles(true);
//! engine
//!     .dispatch_event(item, event, DispatchOptions::default())
//!     .unwrap();
//! assert_eq!(*seen.borrow(), [list]);
//! ```
//!
//! ## Adapters
//!
//! The [`adapters`] module provides integration with other Understory crates:
//!
//! - **DOM Adapter** (`dom_adapter` feature, on by default): native default
//!   actions for [`understory_dom::Dom`] (links, form submission and reset,
//!   `details` toggling, `select` options, textarea input).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
mod cx;
mod default_action;
mod engine;
mod error;
mod event;
mod frame;
mod sink;

pub use cx::EventCx;
pub use default_action::{ActionSource, DefaultActions, Resolved, SetDefault};
pub use engine::{
    Action, DispatchHost, DispatchMode, DispatchOptions, DispatchOutcome, Engine, Listener,
    ListenerResult, Report, Task,
};
pub use error::{DispatchError, ErrorKind, ListenerFailure};
pub use event::Event;
pub use frame::{EventFrame, FrameId, StopScope, Visit};
pub use sink::{ErrorReport, ErrorSink, TracingSink};

pub use understory_event_path::{BouncedPath, BuildOptions, EventTree, PathError, PathScope};
pub use understory_listener::{EventPhase, ListenerError, ListenerOptions};
