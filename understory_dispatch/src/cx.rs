// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a listener sees.

use alloc::vec::Vec;

use understory_listener::{EventPhase, ListenerOptions};

use crate::default_action::SetDefault;
use crate::engine::{Action, DispatchHost, Engine, Frame};
use crate::error::DispatchError;
use crate::event::Event;
use crate::frame::{FrameId, StopScope};

/// The view of a dispatch handed to a listener.
///
/// Dispatch state (phase, current target, context) is read from the frame
/// that invoked the listener, so it stays correct around nested dispatches
/// started through [`engine`](Self::engine).
pub struct EventCx<'a, H: DispatchHost> {
    engine: &'a mut Engine<H>,
    depth: usize,
    options: ListenerOptions,
}

impl<H: DispatchHost + 'static> core::fmt::Debug for EventCx<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventCx")
            .field("frame", &self.frame().id())
            .field("depth", &self.depth)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a, H: DispatchHost + 'static> EventCx<'a, H> {
    pub(crate) fn new(engine: &'a mut Engine<H>, depth: usize, options: ListenerOptions) -> Self {
        Self {
            engine,
            depth,
            options,
        }
    }
}

impl<H: DispatchHost + 'static> EventCx<'_, H> {
    fn frame(&self) -> &Frame<H> {
        self.engine.frame(self.depth)
    }

    /// The event being dispatched.
    pub fn event(&self) -> &Event {
        self.frame().event()
    }

    /// The dispatch this listener runs in.
    pub fn frame_id(&self) -> FrameId {
        self.frame().id()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> H::Node {
        self.frame().path().target()
    }

    /// The node whose listener is running.
    pub fn current_target(&self) -> H::Node {
        let frame = self.frame();
        frame
            .current_target()
            .unwrap_or_else(|| frame.path().target())
    }

    /// The current phase.
    pub fn event_phase(&self) -> EventPhase {
        self.frame().event_phase()
    }

    /// Index of the context of the current visit.
    pub fn context(&self) -> usize {
        let frame = self.frame();
        frame
            .current_context()
            .unwrap_or_else(|| frame.path().target_context())
    }

    /// The composed path, target first.
    pub fn composed_path(&self) -> Vec<H::Node> {
        self.frame().path().composed_path()
    }

    /// The options the running listener was registered with.
    pub fn listener_options(&self) -> ListenerOptions {
        self.options
    }

    /// Skip the remaining visits of this context, or of the whole dispatch.
    ///
    /// Listeners at the current node still run.
    pub fn stop_propagation(&mut self, scope: StopScope) {
        self.engine.frame_mut(self.depth).stop_propagation(scope);
    }

    /// Like [`stop_propagation`](Self::stop_propagation), and also skip the
    /// remaining listeners at the current node.
    pub fn stop_immediate_propagation(&mut self, scope: StopScope) {
        self.engine
            .frame_mut(self.depth)
            .stop_immediate_propagation(scope);
    }

    /// Returns `true` if the current context's default action was prevented.
    pub fn default_prevented(&self) -> bool {
        self.frame().actions().is_prevented(self.context())
    }

    /// The engine, for nested dispatch, listener changes, host mutation and scheduling.
    pub fn engine(&mut self) -> &mut Engine<H> {
        self.engine
    }

    /// The host tree.
    pub fn host(&self) -> &H {
        self.engine.host()
    }
}

impl<H: DispatchHost + 'static> EventCx<'_, H> {
    /// Prevent the default action of this context.
    ///
    /// Returns the action it superseded. Other contexts keep their actions. Ignored, with a
    /// warning, from a passive listener.
    ///
    /// # Errors
    ///
    /// [`DispatchError::WrongPhase`] during the capture phase.
    pub fn prevent_default(&mut self) -> Result<Option<Action<H>>, DispatchError> {
        if self.passive("prevent_default") {
            return Ok(None);
        }
        let event = self.frame().event().clone();
        let (host, frame) = self.engine.host_and_frame(self.depth);
        frame.prevent_default(|node| host.native_default_action(node, &event))
    }

    /// Offer `action` as the default action of this context.
    ///
    /// Ignored, with a warning, from a passive listener.
    ///
    /// # Errors
    ///
    /// [`DispatchError::WrongPhase`] during the capture phase.
    pub fn set_default(&mut self, action: Action<H>) -> Result<SetDefault, DispatchError> {
        if self.passive("set_default") {
            return Ok(SetDefault::Ignored);
        }
        let event = self.frame().event().clone();
        let (host, frame) = self.engine.host_and_frame(self.depth);
        frame.set_default(action, |node| host.native_default_action(node, &event))
    }

    fn passive(&self, call: &'static str) -> bool {
        if !self.options.contains(ListenerOptions::PASSIVE) {
            return false;
        }
        tracing::warn!(
            call,
            event_type = self.event().event_type(),
            node = ?self.current_target(),
            "ignored default-action call from a passive listener"
        );
        true
    }
}
