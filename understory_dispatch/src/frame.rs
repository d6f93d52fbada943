// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-dispatch state machine.
//!
//! An [`EventFrame`] turns a [`BouncedPath`] into a schedule of visits, each a
//! (node, context, phase) triple, and then yields the listeners to invoke one
//! at a time. All dispatch state lives here: the position in the schedule,
//! the listener cursor of the current visit, per-context stop flags and the
//! default-action slots.
//!
//! ## Schedules
//!
//! - Composed events follow the flattened path: capture from the outermost
//!   node down to the node above the target, the target itself, then (when
//!   the event bubbles) the capture nodes in reverse.
//! - Bubbling events that are not composed bounce: every context, innermost
//!   first, runs its own capture, at-target and bubble phases. The local
//!   target of a context is its dispatch target, its shadow host or its slot.
//! - Events that neither bubble nor compose only visit the target's context,
//!   capture and at-target.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use understory_event_path::{BouncedPath, PropagationContext};
use understory_listener::{
    EventPhase, ListenerCursor, ListenerEntry, ListenerOptions, ListenerRegistry,
};

use crate::default_action::{DefaultActions, Resolved, SetDefault};
use crate::error::DispatchError;
use crate::event::Event;

/// Identifier of a dispatch, unique per engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) u64);

/// How far a stop request reaches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum StopScope {
    /// Only the remaining visits of the caller's context.
    #[default]
    Context,
    /// Every remaining visit of the dispatch.
    Global,
}

/// One step of a dispatch schedule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Visit<K> {
    /// The node whose listeners run.
    pub node: K,
    /// Index of the context the node is visited in.
    pub context: usize,
    /// `Capturing`, `AtTarget` or `Bubbling`.
    pub phase: EventPhase,
}

#[derive(Copy, Clone, Debug, Default)]
struct StopState {
    /// Visits after this index are skipped.
    stopped_at: Option<usize>,
    /// Visits from this index on are skipped, the current one included.
    immediate_at: Option<usize>,
}

impl StopState {
    fn stop(&mut self, at: usize, immediate: bool) {
        self.stopped_at = Some(self.stopped_at.map_or(at, |s| s.min(at)));
        if immediate {
            self.immediate_at = Some(self.immediate_at.map_or(at, |s| s.min(at)));
        }
    }

    fn skips(&self, visit: usize) -> bool {
        self.stopped_at.is_some_and(|at| visit > at)
            || self.immediate_at.is_some_and(|at| visit >= at)
    }
}

/// A resumable cursor over one dispatch.
#[derive(Debug)]
pub struct EventFrame<K, A> {
    id: FrameId,
    event: Rc<Event>,
    path: BouncedPath<K>,
    visits: Vec<Visit<K>>,
    /// The visit being walked, or the next one to enter.
    visit: usize,
    entered: bool,
    finished: bool,
    cursor: ListenerCursor,
    stops: Vec<StopState>,
    actions: DefaultActions<A>,
}

impl<K, A> EventFrame<K, A>
where
    K: Copy + Eq + Hash + Debug,
    A: Clone,
{
    /// A frame positioned before the first visit.
    pub fn new(id: FrameId, event: Rc<Event>, path: BouncedPath<K>) -> Self {
        let visits = schedule(&path, &event);
        let contexts = path.contexts().len();
        Self {
            id,
            event,
            path,
            visits,
            visit: 0,
            entered: false,
            finished: false,
            cursor: ListenerCursor::new(),
            stops: alloc::vec![StopState::default(); contexts],
            actions: DefaultActions::new(contexts),
        }
    }

    /// The dispatch this frame belongs to.
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// The event being dispatched.
    pub fn event(&self) -> &Rc<Event> {
        &self.event
    }

    /// The path the event travels.
    pub fn path(&self) -> &BouncedPath<K> {
        &self.path
    }

    /// The full visit schedule.
    pub fn visits(&self) -> &[Visit<K>] {
        &self.visits
    }

    /// The visit whose listeners are currently being walked.
    pub fn current(&self) -> Option<&Visit<K>> {
        if self.entered {
            self.visits.get(self.visit)
        } else {
            None
        }
    }

    /// The phase of the current visit; `Finished` once the schedule is exhausted.
    pub fn event_phase(&self) -> EventPhase {
        if self.finished {
            EventPhase::Finished
        } else {
            self.current().map_or(EventPhase::None, |v| v.phase)
        }
    }

    /// The node of the current visit.
    pub fn current_target(&self) -> Option<K> {
        self.current().map(|v| v.node)
    }

    /// The context of the current visit.
    pub fn current_context(&self) -> Option<usize> {
        self.current().map(|v| v.context)
    }

    /// The context of the current visit, as a [`PropagationContext`].
    pub fn current_propagation_context(&self) -> Option<&PropagationContext<K>> {
        self.current_context().map(|c| self.path.context(c))
    }

    /// The phase the next call to [`next`](Self::next) continues in, if any.
    pub fn pending_phase(&self) -> Option<EventPhase> {
        if self.finished {
            None
        } else {
            self.visits.get(self.visit).map(|v| v.phase)
        }
    }

    /// Returns `true` once every visit has been walked.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The next listener to invoke.
    ///
    /// `ONCE` entries are removed from `registry` before they are returned.
    /// Listeners added to a node while it is being walked wait for the next
    /// dispatch; removed ones are skipped.
    pub fn next<L: PartialEq>(
        &mut self,
        registry: &mut ListenerRegistry<K, L>,
    ) -> Option<Rc<ListenerEntry<K, L>>> {
        self.advance(registry, None)
    }

    /// Like [`next`](Self::next), but returns `None` instead of entering a
    /// visit of a different phase.
    pub fn next_in_phase<L: PartialEq>(
        &mut self,
        registry: &mut ListenerRegistry<K, L>,
        phase: EventPhase,
    ) -> Option<Rc<ListenerEntry<K, L>>> {
        self.advance(registry, Some(phase))
    }

    fn advance<L: PartialEq>(
        &mut self,
        registry: &mut ListenerRegistry<K, L>,
        phase: Option<EventPhase>,
    ) -> Option<Rc<ListenerEntry<K, L>>> {
        loop {
            let Some(&visit) = self.visits.get(self.visit) else {
                self.entered = false;
                self.finished = true;
                return None;
            };
            if !self.entered {
                if phase.is_some_and(|p| p != visit.phase) {
                    return None;
                }
                self.entered = true;
                self.cursor = ListenerCursor::new();
            }
            while let Some(entry) =
                registry.next(visit.node, self.event.event_type(), &mut self.cursor)
            {
                if !entry.matches_phase(visit.phase) || !self.admits(&visit, entry.options()) {
                    continue;
                }
                if entry.options().contains(ListenerOptions::ONCE) {
                    registry.remove_entry(&entry);
                }
                return Some(entry);
            }
            self.visit += 1;
            self.entered = false;
        }
    }

    fn admits(&self, visit: &Visit<K>, options: ListenerOptions) -> bool {
        if options.contains(ListenerOptions::SCOPED)
            && visit.context != self.path.target_context()
        {
            return false;
        }
        options.contains(ListenerOptions::UNSTOPPABLE) || !self.stops[visit.context].skips(self.visit)
    }

    /// Skip the remaining visits of the current context, or of every context.
    pub fn stop_propagation(&mut self, scope: StopScope) {
        self.stop(scope, false);
    }

    /// Like [`stop_propagation`](Self::stop_propagation), and also skip the
    /// remaining listeners of the current visit.
    pub fn stop_immediate_propagation(&mut self, scope: StopScope) {
        self.stop(scope, true);
    }

    fn stop(&mut self, scope: StopScope, immediate: bool) {
        let Some(context) = self.current_context() else {
            return;
        };
        let at = self.visit;
        match scope {
            StopScope::Context => self.stops[context].stop(at, immediate),
            StopScope::Global => {
                for state in &mut self.stops {
                    state.stop(at, immediate);
                }
            }
        }
    }

    /// Returns `true` if propagation was stopped in `context`.
    pub fn is_stopped(&self, context: usize) -> bool {
        self.stops
            .get(context)
            .is_some_and(|s| s.stopped_at.is_some())
    }

    /// The default-action slots.
    pub fn actions(&self) -> &DefaultActions<A> {
        &self.actions
    }

    /// Offer a default action from the current context.
    ///
    /// # Errors
    ///
    /// [`DispatchError::WrongPhase`] outside the at-target and bubble phases.
    pub fn set_default(
        &mut self,
        action: A,
        probe: impl FnMut(K) -> Option<A>,
    ) -> Result<SetDefault, DispatchError> {
        let context = self.arbitration_context()?;
        Ok(self.actions.set_default(&self.path, context, action, probe))
    }

    /// Prevent the default action of the current context.
    ///
    /// # Errors
    ///
    /// [`DispatchError::WrongPhase`] outside the at-target and bubble phases.
    pub fn prevent_default(
        &mut self,
        probe: impl FnMut(K) -> Option<A>,
    ) -> Result<Option<A>, DispatchError> {
        let context = self.arbitration_context()?;
        Ok(self.actions.prevent_default(&self.path, context, probe))
    }

    /// Pick the default action to run.
    pub fn resolve(&self, probe: impl FnMut(K) -> Option<A>) -> Option<Resolved<A>> {
        self.actions.resolve(&self.path, probe)
    }

    fn arbitration_context(&self) -> Result<usize, DispatchError> {
        match self.current() {
            Some(visit) if visit.phase != EventPhase::Capturing => Ok(visit.context),
            _ => Err(DispatchError::WrongPhase),
        }
    }
}

fn schedule<K>(path: &BouncedPath<K>, event: &Event) -> Vec<Visit<K>>
where
    K: Copy + Eq + Hash + Debug,
{
    let mut visits = Vec::new();
    if event.composed() {
        let Some((&(target, target_context), above)) = path.flattened().split_last() else {
            return visits;
        };
        visits.extend(above.iter().map(|&(node, context)| Visit {
            node,
            context,
            phase: EventPhase::Capturing,
        }));
        visits.push(Visit {
            node: target,
            context: target_context,
            phase: EventPhase::AtTarget,
        });
        if event.bubbles() {
            visits.extend(above.iter().rev().map(|&(node, context)| Visit {
                node,
                context,
                phase: EventPhase::Bubbling,
            }));
        }
    } else if event.bubbles() {
        for context in 0..path.contexts().len() {
            push_context(&mut visits, path, context, true);
        }
    } else {
        push_context(&mut visits, path, path.target_context(), false);
    }
    visits
}

fn push_context<K>(visits: &mut Vec<Visit<K>>, path: &BouncedPath<K>, context: usize, bubbles: bool)
where
    K: Copy + Eq + Hash + Debug,
{
    let Some((&local_target, above)) = path.context(context).path().split_last() else {
        return;
    };
    let visit = |node, phase| Visit {
        node,
        context,
        phase,
    };
    visits.extend(above.iter().map(|&node| visit(node, EventPhase::Capturing)));
    visits.push(visit(local_target, EventPhase::AtTarget));
    if bubbles {
        visits.extend(above.iter().rev().map(|&node| visit(node, EventPhase::Bubbling)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use understory_event_path::{BuildOptions, EventTree};

    /// window(0) > document(1) > host(2) [shadow 3 > inner(4)], with 5 a
    /// light child of 2 assigned to slot 4.
    struct Slotted;

    impl EventTree for Slotted {
        type Node = u32;

        fn window(&self) -> u32 {
            0
        }

        fn is_event_target(&self, node: u32) -> bool {
            node <= 5
        }

        fn parent(&self, node: u32) -> Option<u32> {
            match node {
                2 => Some(1),
                4 => Some(3),
                5 => Some(2),
                _ => None,
            }
        }

        fn host(&self, node: u32) -> Option<u32> {
            (node == 3).then_some(2)
        }

        fn shadow_root(&self, node: u32) -> Option<u32> {
            (node == 2).then_some(3)
        }

        fn assigned_slot(&self, node: u32) -> Option<u32> {
            (node == 5).then_some(4)
        }

        fn is_document(&self, node: u32) -> bool {
            node == 1
        }
    }

    type Frame = EventFrame<u32, &'static str>;
    type Registry = ListenerRegistry<u32, &'static str>;

    fn frame(event: Event) -> Frame {
        let path = BouncedPath::build(&Slotted, 5, &BuildOptions::default()).unwrap();
        EventFrame::new(FrameId(1), Rc::new(event), path)
    }

    fn nodes(frame: &Frame) -> Vec<(u32, EventPhase)> {
        frame.visits().iter().map(|v| (v.node, v.phase)).collect()
    }

    fn drain(frame: &mut Frame, registry: &mut Registry) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(entry) = frame.next(registry) {
            out.push(*entry.listener());
        }
        out
    }

    use EventPhase::{AtTarget as T, Bubbling as B, Capturing as C};

    #[test]
    fn composed_schedule_follows_the_flattened_path() {
        let frame = frame(Event::new("x").with_bubbles(true).with_composed(true));
        assert_eq!(
            nodes(&frame),
            vec![
                (0, C),
                (1, C),
                (2, C),
                (3, C),
                (4, C),
                (5, T),
                (4, B),
                (3, B),
                (2, B),
                (1, B),
                (0, B),
            ]
        );
        let without_bubble = self::frame(Event::new("x").with_composed(true));
        assert_eq!(without_bubble.visits().len(), 6);
    }

    #[test]
    fn bubbling_schedule_bounces_per_context() {
        let frame = frame(Event::new("x").with_bubbles(true));
        // The slot's context runs first, then the document context.
        assert_eq!(
            nodes(&frame),
            vec![
                (3, C),
                (4, T),
                (3, B),
                (0, C),
                (1, C),
                (2, C),
                (5, T),
                (2, B),
                (1, B),
                (0, B),
            ]
        );
    }

    #[test]
    fn local_schedule_captures_to_the_target() {
        let frame = frame(Event::new("x"));
        assert_eq!(nodes(&frame), vec![(0, C), (1, C), (2, C), (5, T)]);
    }

    #[test]
    fn context_stop_spares_other_contexts() {
        let mut registry = Registry::new();
        for (node, name) in [(3, "shadow"), (4, "slot"), (2, "host"), (5, "target")] {
            registry.add(node, "x", name, ListenerOptions::empty()).unwrap();
        }
        registry.add(3, "x", "shadow-capture", ListenerOptions::CAPTURE).unwrap();
        let mut frame = frame(Event::new("x").with_bubbles(true).with_composed(true));

        assert_eq!(frame.next(&mut registry).map(|e| *e.listener()), Some("shadow-capture"));
        assert_eq!(frame.event_phase(), C);
        assert_eq!(frame.current_context(), Some(0));
        frame.stop_propagation(StopScope::Context);
        assert!(frame.is_stopped(0));
        // The slot context is done; the document context continues.
        assert_eq!(drain(&mut frame, &mut registry), vec!["target", "host"]);
        assert!(frame.is_finished());
        assert_eq!(frame.event_phase(), EventPhase::Finished);
    }

    #[test]
    fn global_stop_spares_only_unstoppable_listeners() {
        let mut registry = Registry::new();
        registry.add(5, "x", "first", ListenerOptions::empty()).unwrap();
        registry.add(5, "x", "second", ListenerOptions::empty()).unwrap();
        registry.add(5, "x", "always", ListenerOptions::UNSTOPPABLE).unwrap();
        registry.add(2, "x", "host", ListenerOptions::empty()).unwrap();
        registry.add(1, "x", "doc", ListenerOptions::UNSTOPPABLE).unwrap();
        let mut frame = frame(Event::new("x").with_bubbles(true).with_composed(true));

        assert_eq!(frame.next(&mut registry).map(|e| *e.listener()), Some("first"));
        frame.stop_propagation(StopScope::Global);
        // Remaining listeners at the same node still run.
        assert_eq!(drain(&mut frame, &mut registry), vec!["second", "always", "doc"]);

        let mut frame = self::frame(Event::new("x").with_bubbles(true).with_composed(true));
        registry.begin_walk();
        assert_eq!(frame.next(&mut registry).map(|e| *e.listener()), Some("first"));
        frame.stop_immediate_propagation(StopScope::Global);
        assert_eq!(drain(&mut frame, &mut registry), vec!["always", "doc"]);
        registry.end_walk();
    }

    #[test]
    fn scoped_listeners_only_hear_their_own_context() {
        let mut registry = Registry::new();
        registry.add(4, "x", "slot", ListenerOptions::SCOPED).unwrap();
        registry.add(2, "x", "host", ListenerOptions::SCOPED).unwrap();
        let mut frame = frame(Event::new("x").with_bubbles(true).with_composed(true));
        assert_eq!(drain(&mut frame, &mut registry), vec!["host"]);
    }

    #[test]
    fn once_entries_are_removed_when_selected() {
        let mut registry = Registry::new();
        registry.add(5, "x", "a", ListenerOptions::ONCE).unwrap();
        let mut frame = frame(Event::new("x"));
        registry.begin_walk();
        let entry = frame.next(&mut registry).unwrap();
        assert!(entry.is_removed());
        // Re-adding from inside the callback is not blocked, and the new
        // entry is left for the next dispatch.
        assert_eq!(registry.add(5, "x", "a", ListenerOptions::ONCE), Ok(true));
        assert!(frame.next(&mut registry).is_none());
        registry.end_walk();
        assert_eq!(registry.listener_count(5, "x"), 1);
    }

    #[test]
    fn phase_batches() {
        let mut registry = Registry::new();
        registry.add(1, "x", "capture", ListenerOptions::CAPTURE).unwrap();
        registry.add(5, "x", "target", ListenerOptions::empty()).unwrap();
        registry.add(1, "x", "bubble", ListenerOptions::empty()).unwrap();
        let mut frame = frame(Event::new("x").with_bubbles(true).with_composed(true));

        assert_eq!(frame.pending_phase(), Some(C));
        assert_eq!(frame.next_in_phase(&mut registry, C).map(|e| *e.listener()), Some("capture"));
        assert!(frame.next_in_phase(&mut registry, C).is_none());
        assert_eq!(frame.pending_phase(), Some(T));
        assert!(frame.next_in_phase(&mut registry, B).is_none());
        assert_eq!(frame.next_in_phase(&mut registry, T).map(|e| *e.listener()), Some("target"));
        assert!(frame.next_in_phase(&mut registry, T).is_none());
        assert_eq!(frame.next_in_phase(&mut registry, B).map(|e| *e.listener()), Some("bubble"));
        assert!(frame.next_in_phase(&mut registry, B).is_none());
        assert!(frame.is_finished());
        assert_eq!(frame.pending_phase(), None);
    }

    #[test]
    fn arbitration_is_rejected_while_capturing() {
        let mut registry = Registry::new();
        registry.add(1, "x", "capture", ListenerOptions::CAPTURE).unwrap();
        registry.add(5, "x", "target", ListenerOptions::empty()).unwrap();
        let mut frame = frame(Event::new("x").with_composed(true));
        let none = |_| None;

        assert_eq!(frame.set_default("a", none), Err(DispatchError::WrongPhase));
        frame.next(&mut registry).unwrap();
        assert_eq!(frame.prevent_default(none), Err(DispatchError::WrongPhase));
        frame.next(&mut registry).unwrap();
        assert_eq!(frame.set_default("a", none), Ok(SetDefault::Installed));
        assert_eq!(frame.resolve(none).map(|r| r.action), Some("a"));
    }
}
