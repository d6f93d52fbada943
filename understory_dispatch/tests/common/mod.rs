// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the dispatch integration tests.

#![allow(
    dead_code,
    reason = "Each integration test binary uses a different subset of the fixtures."
)]

use std::cell::RefCell;
use std::rc::Rc;

use understory_dispatch::{
    DispatchOptions, Engine, Event, EventCx, EventPhase, Listener, ListenerFailure,
    ListenerOptions, Report,
};
use understory_dom::{Dom, NodeId};

/// `h1` inside the shadow tree of `shadow-comp`, which is slotted into
/// `slot-comp`:
///
/// ```text
/// document > div > slot-comp
///                    #shadow  slot_root > span > slot
///                    shadow-comp (assigned to the slot)
///                      #shadow  shadow_root > h1
/// ```
#[derive(Copy, Clone, Debug)]
pub(crate) struct Scenario {
    pub(crate) div: NodeId,
    pub(crate) slot_comp: NodeId,
    pub(crate) slot_root: NodeId,
    pub(crate) slot_span: NodeId,
    pub(crate) slot_slot: NodeId,
    pub(crate) shadow_comp: NodeId,
    pub(crate) shadow_root: NodeId,
    pub(crate) h1: NodeId,
}

impl Scenario {
    pub(crate) fn build() -> (Dom, Self) {
        let mut dom = Dom::new();
        let doc = dom.document();
        let div = element(&mut dom, doc, "div");
        let slot_comp = element(&mut dom, div, "slot-comp");
        let slot_root = dom.attach_shadow(slot_comp).unwrap();
        let slot_span = element(&mut dom, slot_root, "span");
        let slot_slot = element(&mut dom, slot_span, "slot");
        let shadow_comp = element(&mut dom, slot_comp, "shadow-comp");
        let shadow_root = dom.attach_shadow(shadow_comp).unwrap();
        let h1 = element(&mut dom, shadow_root, "h1");
        let scenario = Self {
            div,
            slot_comp,
            slot_root,
            slot_span,
            slot_slot,
            shadow_comp,
            shadow_root,
            h1,
        };
        (dom, scenario)
    }

    /// Every non-sentinel node with a readable name.
    pub(crate) fn named(&self) -> [(NodeId, &'static str); 8] {
        [
            (self.div, "div"),
            (self.slot_comp, "slot-comp"),
            (self.slot_root, "slotRoot"),
            (self.slot_span, "slotSpan"),
            (self.slot_slot, "slotSlot"),
            (self.shadow_comp, "shadowComp"),
            (self.shadow_root, "shadowRoot"),
            (self.h1, "h1"),
        ]
    }
}

pub(crate) fn element(dom: &mut Dom, parent: NodeId, tag: &str) -> NodeId {
    let id = dom.create_element(tag);
    dom.append_child(parent, id).unwrap();
    id
}

pub(crate) type Log = Rc<RefCell<Vec<(&'static str, EventPhase)>>>;

/// A listener that records its name and the current phase.
pub(crate) fn recorder(log: &Log, name: &'static str) -> Listener<Dom> {
    let log = log.clone();
    Listener::new(move |cx: &mut EventCx<'_, Dom>| {
        log.borrow_mut().push((name, cx.event_phase()));
        Ok(())
    })
}

/// Register a capture and a bubble recorder on every named node.
pub(crate) fn record_everything(engine: &mut Engine<Dom>, scenario: &Scenario, event_type: &str) -> Log {
    let log = Log::default();
    for (node, name) in scenario.named() {
        let listener = recorder(&log, name);
        engine
            .add_event_listener(node, event_type, &listener, ListenerOptions::CAPTURE)
            .unwrap();
        engine
            .add_event_listener(node, event_type, &listener, ListenerOptions::empty())
            .unwrap();
    }
    log
}

pub(crate) fn names(log: &Log) -> Vec<&'static str> {
    log.borrow().iter().map(|&(name, _)| name).collect()
}

pub(crate) fn dispatch(engine: &mut Engine<Dom>, target: NodeId, event: Event) -> Report {
    engine
        .dispatch_event(target, event, DispatchOptions::default())
        .unwrap()
        .report()
        .unwrap()
}

pub(crate) fn failure(err: impl std::fmt::Display) -> ListenerFailure {
    ListenerFailure::new(err.to_string())
}
