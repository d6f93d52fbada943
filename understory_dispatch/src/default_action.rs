// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbitration between competing default actions.
//!
//! Each context of a [`BouncedPath`] has one slot. Listeners fill a slot with
//! [`DefaultActions::set_default`] and veto their own context with
//! [`DefaultActions::prevent_default`]. Prevention never reaches other
//! contexts.
//! Native actions are discovered through a probe closure supplied by the
//! caller. Once propagation is over, [`DefaultActions::resolve`] picks the
//! innermost action that was not prevented.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use understory_event_path::BouncedPath;

/// Where a default action came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActionSource {
    /// A capability of a node on the path, such as following a link.
    Native,
    /// Registered by a listener.
    Custom,
}

/// Result of [`DefaultActions::set_default`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SetDefault {
    /// The custom action now occupies the caller's slot.
    Installed,
    /// The caller's context, or one nested in it, already holds a live action.
    Ignored,
    /// A native action on the path was installed instead of the custom one.
    Native,
}

/// The action chosen by [`DefaultActions::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved<A> {
    /// The action to run.
    pub action: A,
    /// Where it came from.
    pub source: ActionSource,
    /// The context whose slot (or whose nodes) supplied it.
    pub context: usize,
}

#[derive(Clone, Debug)]
struct ActionSlot<A> {
    prevented: bool,
    action: Option<(A, ActionSource)>,
}

impl<A> ActionSlot<A> {
    fn is_live(&self) -> bool {
        !self.prevented && self.action.is_some()
    }
}

/// Per-context default-action slots for one dispatch.
#[derive(Clone, Debug)]
pub struct DefaultActions<A> {
    slots: Vec<ActionSlot<A>>,
    claimed_native: bool,
}

impl<A: Clone> DefaultActions<A> {
    /// Empty slots for a path with `contexts` contexts.
    pub fn new(contexts: usize) -> Self {
        let mut slots = Vec::with_capacity(contexts);
        slots.resize_with(contexts, || ActionSlot {
            prevented: false,
            action: None,
        });
        Self {
            slots,
            claimed_native: false,
        }
    }

    /// Offer `action` as the default action of `context`.
    ///
    /// Inner contexts win: if `context` or any context nested in it already
    /// holds an action that was not prevented, nothing changes. Otherwise the
    /// nodes of `context` and its nested contexts are probed in bubble order,
    /// skipping prevented contexts. The first native action found replaces the
    /// custom one, unless a native action was already claimed in this
    /// dispatch.
    ///
    /// # Panics
    ///
    /// Panics if `context` is out of bounds.
    pub fn set_default<K>(
        &mut self,
        path: &BouncedPath<K>,
        context: usize,
        action: A,
        mut probe: impl FnMut(K) -> Option<A>,
    ) -> SetDefault
    where
        K: Copy + Eq + Hash + Debug,
    {
        let occupied = self
            .slots
            .iter()
            .enumerate()
            .any(|(i, slot)| slot.is_live() && path.is_within(i, context));
        if occupied {
            return SetDefault::Ignored;
        }

        if !self.claimed_native {
            for &(node, ctx) in path.flattened().iter().rev() {
                if self.slots[ctx].prevented || !path.is_within(ctx, context) {
                    continue;
                }
                if let Some(native) = probe(node) {
                    self.slots[ctx].action = Some((native, ActionSource::Native));
                    self.claimed_native = true;
                    return SetDefault::Native;
                }
            }
        }

        self.slots[context].action = Some((action, ActionSource::Custom));
        SetDefault::Installed
    }

    /// Prevent the default action of `context`.
    ///
    /// Returns the action superseded in `context`: the installed one, or else
    /// the nearest native action of the context's own nodes. Other contexts,
    /// inner or outer, are not touched.
    ///
    /// # Panics
    ///
    /// Panics if `context` is out of bounds.
    pub fn prevent_default<K>(
        &mut self,
        path: &BouncedPath<K>,
        context: usize,
        probe: impl FnMut(K) -> Option<A>,
    ) -> Option<A>
    where
        K: Copy + Eq + Hash + Debug,
    {
        let superseded = self.winner(path, |i| i == context, probe).map(|r| r.action);
        self.slots[context].prevented = true;
        superseded
    }

    /// Returns `true` if `context` was prevented.
    pub fn is_prevented(&self, context: usize) -> bool {
        self.slots.get(context).is_some_and(|slot| slot.prevented)
    }

    /// Returns `true` if any context was prevented.
    pub fn any_prevented(&self) -> bool {
        self.slots.iter().any(|slot| slot.prevented)
    }

    /// The action installed in `context`, prevented or not.
    pub fn installed(&self, context: usize) -> Option<(&A, ActionSource)> {
        let (action, source) = self.slots.get(context)?.action.as_ref()?;
        Some((action, *source))
    }

    /// Pick the action to run once propagation is over.
    ///
    /// Contexts are walked innermost first and prevented ones are skipped.
    /// Within a context an installed action beats the native actions of the
    /// context's own nodes.
    pub fn resolve<K>(
        &self,
        path: &BouncedPath<K>,
        probe: impl FnMut(K) -> Option<A>,
    ) -> Option<Resolved<A>>
    where
        K: Copy + Eq + Hash + Debug,
    {
        self.winner(path, |_| true, probe)
    }

    fn winner<K>(
        &self,
        path: &BouncedPath<K>,
        include: impl Fn(usize) -> bool,
        mut probe: impl FnMut(K) -> Option<A>,
    ) -> Option<Resolved<A>>
    where
        K: Copy + Eq + Hash + Debug,
    {
        for (i, ctx) in path.contexts().iter().enumerate() {
            let slot = &self.slots[i];
            if slot.prevented || !include(i) {
                continue;
            }
            if let Some((action, source)) = &slot.action {
                return Some(Resolved {
                    action: action.clone(),
                    source: *source,
                    context: i,
                });
            }
            for &node in ctx.path().iter().rev() {
                if let Some(action) = probe(node) {
                    return Some(Resolved {
                        action,
                        source: ActionSource::Native,
                        context: i,
                    });
                }
            }
        }
        None
    }
}
