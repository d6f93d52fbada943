// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener entries, per-(target, type) lists, and cursors.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

bitflags::bitflags! {
    /// Options a listener is registered with.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ListenerOptions: u8 {
        /// Invoke during the capture phase instead of the bubble phase.
        const CAPTURE     = 0b0000_0001;
        /// Remove the listener when it is selected for invocation.
        const ONCE        = 0b0000_0010;
        /// The listener promises not to prevent or replace the default action.
        const PASSIVE     = 0b0000_0100;
        /// Always the first capture listener of its node. Requires `CAPTURE`.
        const FIRST       = 0b0000_1000;
        /// Always the last bubble listener of its node. Forbids `CAPTURE`.
        const LAST        = 0b0001_0000;
        /// Only invoked for events whose target is in the listener's own context.
        const SCOPED      = 0b0010_0000;
        /// Invoked even after propagation was stopped.
        const UNSTOPPABLE = 0b0100_0000;
    }
}

/// The phase of an event, with the numeric values the DOM uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventPhase {
    /// Not being dispatched.
    #[default]
    None = 0,
    /// Travelling from the outermost node towards the target.
    Capturing = 1,
    /// At the (local) target.
    AtTarget = 2,
    /// Travelling from the target back out.
    Bubbling = 3,
    /// Dispatch is over.
    Finished = 4,
}

impl EventPhase {
    /// The DOM numeric value of this phase.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A registered listener.
///
/// Entries are shared with dispatch cursors through `Rc` and are never
/// mutated after registration, except for the `removed` tombstone.
#[derive(Debug)]
pub struct ListenerEntry<K, L> {
    target: K,
    event_type: Box<str>,
    listener: L,
    options: ListenerOptions,
    removed: Cell<bool>,
    seq: u64,
}

impl<K: Copy, L> ListenerEntry<K, L> {
    pub(crate) fn new(target: K, event_type: &str, listener: L, options: ListenerOptions) -> Self {
        Self {
            target,
            event_type: event_type.into(),
            listener,
            options,
            removed: Cell::new(false),
            seq: 0,
        }
    }

    /// The node the listener is registered on.
    pub fn target(&self) -> K {
        self.target
    }

    /// The event type the listener is registered for.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The listener payload.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Registration options.
    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Returns `true` for capture listeners.
    pub fn is_capture(&self) -> bool {
        self.options.contains(ListenerOptions::CAPTURE)
    }

    /// Returns `true` once the entry has been removed.
    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub(crate) fn tombstone(&self) -> bool {
        !self.removed.replace(true)
    }

    /// Returns `true` if the entry runs in `phase`.
    ///
    /// At-target visits run every listener; capture and bubble visits are
    /// split on [`CAPTURE`](ListenerOptions::CAPTURE).
    pub fn matches_phase(&self, phase: EventPhase) -> bool {
        match phase {
            EventPhase::Capturing => self.is_capture(),
            EventPhase::AtTarget => true,
            EventPhase::Bubbling => !self.is_capture(),
            EventPhase::None | EventPhase::Finished => false,
        }
    }
}

/// A position inside a [`ListenerList`].
///
/// Cursors survive additions and removals made while they are in use. The
/// first advance pins the set of entries the cursor will visit: entries
/// registered afterwards are left for the next traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerCursor {
    slot: Slot,
    bound: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Slot {
    #[default]
    First,
    Middle(usize),
    Last,
    Done,
}

impl ListenerCursor {
    /// A cursor positioned before the first entry.
    pub const fn new() -> Self {
        Self {
            slot: Slot::First,
            bound: None,
        }
    }

    /// Returns `true` once every slot has been passed.
    pub fn is_done(&self) -> bool {
        self.slot == Slot::Done
    }
}

/// Listeners registered for one (target, type) pair.
///
/// Ordering is fixed by where entries are stored: the `FIRST` slot, then the
/// remaining entries in registration order, then the `LAST` slot.
#[derive(Debug)]
pub struct ListenerList<K, L> {
    first: Option<Rc<ListenerEntry<K, L>>>,
    middle: Vec<Rc<ListenerEntry<K, L>>>,
    last: Option<Rc<ListenerEntry<K, L>>>,
    inserted: u64,
}

impl<K, L> Default for ListenerList<K, L> {
    fn default() -> Self {
        Self {
            first: None,
            middle: Vec::new(),
            last: None,
            inserted: 0,
        }
    }
}

impl<K: Copy, L> ListenerList<K, L> {
    /// Iterate live entries in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<ListenerEntry<K, L>>> {
        self.first
            .iter()
            .chain(self.middle.iter())
            .chain(self.last.iter())
            .filter(|e| !e.is_removed())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no live entry remains.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Return the next live entry after `cursor` and move the cursor past it.
    ///
    /// Entries inserted after the cursor's first advance are skipped.
    pub fn advance(&self, cursor: &mut ListenerCursor) -> Option<Rc<ListenerEntry<K, L>>> {
        let bound = *cursor.bound.get_or_insert(self.inserted);
        loop {
            let (entry, next) = match cursor.slot {
                Slot::First => (self.first.as_ref(), Slot::Middle(0)),
                Slot::Middle(i) if i < self.middle.len() => {
                    (Some(&self.middle[i]), Slot::Middle(i + 1))
                }
                Slot::Middle(_) => (None, Slot::Last),
                Slot::Last => (self.last.as_ref(), Slot::Done),
                Slot::Done => return None,
            };
            cursor.slot = next;
            if let Some(entry) = entry.filter(|e| !e.is_removed() && e.seq < bound) {
                return Some(entry.clone());
            }
        }
    }

    pub(crate) fn has_live_first(&self) -> bool {
        self.first.as_ref().is_some_and(|e| !e.is_removed())
    }

    pub(crate) fn has_live_last(&self) -> bool {
        self.last.as_ref().is_some_and(|e| !e.is_removed())
    }

    pub(crate) fn insert(&mut self, mut entry: ListenerEntry<K, L>) {
        entry.seq = self.inserted;
        self.inserted += 1;
        let options = entry.options;
        let entry = Rc::new(entry);
        if options.contains(ListenerOptions::FIRST) {
            self.first = Some(entry);
        } else if options.contains(ListenerOptions::LAST) {
            self.last = Some(entry);
        } else {
            self.middle.push(entry);
        }
    }

    pub(crate) fn find(
        &self,
        mut pred: impl FnMut(&ListenerEntry<K, L>) -> bool,
    ) -> Option<&Rc<ListenerEntry<K, L>>> {
        self.iter().find(|&e| pred(e))
    }

    pub(crate) fn tombstone_all(&self) {
        for entry in self.iter() {
            entry.tombstone();
        }
    }

    /// Drop tombstoned entries. Only valid while no cursor is in use.
    pub(crate) fn compact(&mut self) {
        if self.first.as_ref().is_some_and(|e| e.is_removed()) {
            self.first = None;
        }
        if self.last.as_ref().is_some_and(|e| e.is_removed()) {
            self.last = None;
        }
        self.middle.retain(|e| !e.is_removed());
    }
}
