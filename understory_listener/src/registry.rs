// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The listener registry.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::entry::{EventPhase, ListenerCursor, ListenerEntry, ListenerList, ListenerOptions};
use crate::error::ListenerError;

/// Listeners for every (target, event type) pair.
///
/// `K` is the node key; `L` is the listener payload. Two registrations are the
/// same listener when their payloads compare equal, so callback handles
/// should compare by identity.
///
/// ## Walks
///
/// A dispatcher brackets every traversal with [`begin_walk`](Self::begin_walk)
/// and [`end_walk`](Self::end_walk). Walks nest. While any walk is active,
/// removals only tombstone entries; the tombstones are compacted when the
/// outermost walk ends.
#[derive(Debug)]
pub struct ListenerRegistry<K, L> {
    lists: HashMap<K, HashMap<Box<str>, ListenerList<K, L>>>,
    walks: usize,
    has_tombstones: bool,
}

impl<K, L> Default for ListenerRegistry<K, L> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
            walks: 0,
            has_tombstones: false,
        }
    }
}

impl<K, L> ListenerRegistry<K, L>
where
    K: Copy + Eq + Hash,
    L: PartialEq,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event_type` on `target`.
    ///
    /// Returns `Ok(false)` without changing anything when the same listener is
    /// already registered with the same capture flag.
    ///
    /// # Errors
    ///
    /// - [`ListenerError::FirstRequiresCapture`] for `FIRST` without `CAPTURE`.
    /// - [`ListenerError::LastForbidsCapture`] for `LAST` with `CAPTURE`.
    /// - [`ListenerError::DuplicateFirst`] / [`ListenerError::DuplicateLast`] when the
    ///   pair already has a live entry in that slot.
    pub fn add(
        &mut self,
        target: K,
        event_type: &str,
        listener: L,
        options: ListenerOptions,
    ) -> Result<bool, ListenerError> {
        let capture = options.contains(ListenerOptions::CAPTURE);
        if options.contains(ListenerOptions::FIRST) && !capture {
            return Err(ListenerError::FirstRequiresCapture);
        }
        if options.contains(ListenerOptions::LAST) && capture {
            return Err(ListenerError::LastForbidsCapture);
        }

        let list = self
            .lists
            .entry(target)
            .or_default()
            .entry_ref(event_type)
            .or_default();
        if list
            .find(|e| e.is_capture() == capture && *e.listener() == listener)
            .is_some()
        {
            return Ok(false);
        }
        if options.contains(ListenerOptions::FIRST) && list.has_live_first() {
            return Err(ListenerError::DuplicateFirst);
        }
        if options.contains(ListenerOptions::LAST) && list.has_live_last() {
            return Err(ListenerError::DuplicateLast);
        }
        list.insert(ListenerEntry::new(target, event_type, listener, options));
        Ok(true)
    }

    /// Remove the registration matching `listener` and the capture flag of `options`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(
        &mut self,
        target: K,
        event_type: &str,
        listener: &L,
        options: ListenerOptions,
    ) -> bool {
        let capture = options.contains(ListenerOptions::CAPTURE);
        let removed = self
            .list(target, event_type)
            .and_then(|list| list.find(|e| e.is_capture() == capture && e.listener() == listener))
            .is_some_and(|entry| entry.tombstone());
        if removed {
            self.after_removal(target, event_type);
        }
        removed
    }

    /// Remove a specific entry, for example a `ONCE` listener selected for invocation.
    pub fn remove_entry(&mut self, entry: &ListenerEntry<K, L>) -> bool {
        if !entry.tombstone() {
            return false;
        }
        let target = entry.target();
        // The type string is borrowed from the entry; copy it out before mutating.
        let event_type: Box<str> = entry.event_type().into();
        self.after_removal(target, &event_type);
        true
    }

    /// Remove every listener registered on `target`.
    pub fn remove_all(&mut self, target: K) {
        if self.walks == 0 {
            if let Some(by_type) = self.lists.remove(&target) {
                for list in by_type.values() {
                    list.tombstone_all();
                }
            }
        } else if let Some(by_type) = self.lists.get(&target) {
            for list in by_type.values() {
                list.tombstone_all();
            }
            self.has_tombstones = true;
        }
    }

    /// Remove every listener registered on a target `keep` rejects.
    ///
    /// Returns the number of targets dropped.
    pub fn retain_targets(&mut self, mut keep: impl FnMut(K) -> bool) -> usize {
        let stale: Vec<K> = self.lists.keys().copied().filter(|&t| !keep(t)).collect();
        for &target in &stale {
            self.remove_all(target);
        }
        stale.len()
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        for by_type in self.lists.values() {
            for list in by_type.values() {
                list.tombstone_all();
            }
        }
        if self.walks == 0 {
            self.lists.clear();
        } else {
            self.has_tombstones = true;
        }
    }

    /// The list for a (target, type) pair, if any listener was ever registered.
    pub fn list(&self, target: K, event_type: &str) -> Option<&ListenerList<K, L>> {
        self.lists.get(&target)?.get(event_type)
    }

    /// Advance `cursor` over the (target, type) list.
    pub fn next(
        &self,
        target: K,
        event_type: &str,
        cursor: &mut ListenerCursor,
    ) -> Option<Rc<ListenerEntry<K, L>>> {
        self.list(target, event_type)?.advance(cursor)
    }

    /// Live entries of a (target, type) pair that run in `phase`, in invocation order.
    pub fn query(
        &self,
        target: K,
        event_type: &str,
        phase: EventPhase,
    ) -> Vec<Rc<ListenerEntry<K, L>>> {
        self.list(target, event_type)
            .map(|list| {
                list.iter()
                    .filter(|e| e.matches_phase(phase))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live listeners for a (target, type) pair.
    pub fn listener_count(&self, target: K, event_type: &str) -> usize {
        self.list(target, event_type).map_or(0, ListenerList::len)
    }

    /// Returns `true` if the pair has at least one live listener.
    pub fn has_listeners(&self, target: K, event_type: &str) -> bool {
        self.list(target, event_type)
            .is_some_and(|list| !list.is_empty())
    }

    /// Mark the start of a traversal.
    pub fn begin_walk(&mut self) {
        self.walks += 1;
    }

    /// Mark the end of a traversal, compacting tombstones after the last one.
    ///
    /// # Panics
    ///
    /// Panics if called without a matching [`begin_walk`](Self::begin_walk).
    pub fn end_walk(&mut self) {
        assert!(self.walks > 0, "end_walk without a matching begin_walk");
        self.walks -= 1;
        if self.walks == 0 && self.has_tombstones {
            self.compact();
        }
    }

    /// Returns `true` while at least one traversal is active.
    pub fn is_walking(&self) -> bool {
        self.walks > 0
    }

    fn after_removal(&mut self, target: K, event_type: &str) {
        if self.walks > 0 {
            self.has_tombstones = true;
            return;
        }
        if let Some(by_type) = self.lists.get_mut(&target) {
            if let Some(list) = by_type.get_mut(event_type) {
                list.compact();
                if list.is_empty() {
                    by_type.remove(event_type);
                }
            }
            if by_type.is_empty() {
                self.lists.remove(&target);
            }
        }
    }

    fn compact(&mut self) {
        for by_type in self.lists.values_mut() {
            for list in by_type.values_mut() {
                list.compact();
            }
            by_type.retain(|_, list| !list.is_empty());
        }
        self.lists.retain(|_, by_type| !by_type.is_empty());
        self.has_tombstones = false;
    }
}
