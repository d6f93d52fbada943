// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event payload.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::Cell;
use core::fmt;

/// An event to dispatch.
///
/// The payload is immutable once built. Everything that changes during a
/// dispatch (phase, current target, stop and prevention flags) lives in the
/// [`EventFrame`](crate::EventFrame) instead. The only interior state is the
/// guard that rejects dispatching the same event twice.
pub struct Event {
    event_type: Cow<'static, str>,
    bubbles: bool,
    composed: bool,
    detail: Option<Rc<dyn Any>>,
    dispatched: Cell<bool>,
}

impl Event {
    /// A non-bubbling, non-composed event of the given type.
    pub fn new(event_type: impl Into<Cow<'static, str>>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            composed: false,
            detail: None,
            dispatched: Cell::new(false),
        }
    }

    /// Set whether the event bubbles.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether the event crosses shadow boundaries.
    #[must_use]
    pub fn with_composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    /// Attach an opaque payload, read back with [`detail`](Self::detail).
    #[must_use]
    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// The event type.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns `true` if the event bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Returns `true` if the event crosses shadow boundaries.
    pub fn composed(&self) -> bool {
        self.composed
    }

    /// The payload, if one of type `T` is attached.
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_deref()?.downcast_ref()
    }

    /// Returns `true` once the event has been handed to a dispatch.
    pub fn is_dispatched(&self) -> bool {
        self.dispatched.get()
    }

    /// Set the dispatch guard. Returns `false` if it was already set.
    pub(crate) fn mark_dispatched(&self) -> bool {
        !self.dispatched.replace(true)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("bubbles", &self.bubbles)
            .field("composed", &self.composed)
            .field("has_detail", &self.detail.is_some())
            .field("dispatched", &self.dispatched.get())
            .finish()
    }
}
