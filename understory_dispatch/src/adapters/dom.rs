// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native default actions for [`understory_dom::Dom`].
//!
//! ## Feature
//!
//! Enable with `dom_adapter` (on by default).
//!
//! ## Actions
//!
//! | Event         | Node                                 | Action                                            |
//! |---------------|--------------------------------------|---------------------------------------------------|
//! | `click`       | `a[href]`                            | navigate to `href`                                |
//! | `click`       | `button` (submit) in a `form`        | dispatch a bubbling `submit` at the form          |
//! | `click`       | `button[type=reset]` in a `form`     | dispatch a bubbling `reset` at the form           |
//! | `click`       | `summary` directly in a `details`    | toggle `open`, fire `toggle` on the next turn     |
//! | `click`       | `option` in a `select`               | select it, dispatch a bubbling `change`           |
//! | `submit`      | `form`                               | record the submission                             |
//! | `reset`       | `form`                               | restore every textarea to its `value` attribute   |
//! | `beforeinput` | `textarea`, with a `String` detail   | append the text, dispatch a bubbling `input`      |
//!
//! Actions that dispatch follow-up events do so after the triggering dispatch
//! has been popped, so the follow-up is a fresh top-level dispatch.

use alloc::string::String;

use understory_dom::{Dom, DomError, NodeId};

use crate::engine::{Action, DispatchHost, DispatchOptions, Engine};
use crate::event::Event;

impl DispatchHost for Dom {
    fn native_default_action(&self, node: NodeId, event: &Event) -> Option<Action<Self>> {
        match event.event_type() {
            "click" => click_action(self, node),
            "submit" if self.is_element(node, "form") => Some(Action::new(
                move |engine: &mut Engine<Self>, _: &Event| {
                    engine.host_mut().record_submission(node);
                },
            )),
            "reset" if self.is_element(node, "form") => Some(Action::new(
                move |engine: &mut Engine<Self>, _: &Event| {
                    let dom = engine.host_mut();
                    for id in dom.descendants(node) {
                        if dom.is_element(id, "textarea") {
                            dom.reset_value(id);
                        }
                    }
                },
            )),
            "beforeinput" if self.is_element(node, "textarea") => {
                let text = event.detail::<String>()?.clone();
                Some(Action::new(move |engine: &mut Engine<Self>, _: &Event| {
                    let dom = engine.host_mut();
                    let mut value = String::from(dom.value(node));
                    value.push_str(&text);
                    dom.set_value(node, &value);
                    fire(engine, node, Event::new("input").with_bubbles(true));
                }))
            }
            _ => None,
        }
    }
}

impl Engine<Dom> {
    /// Free `node` with its subtree and shadow trees, then drop the listeners
    /// registered on any of the freed nodes.
    ///
    /// # Errors
    ///
    /// Whatever [`Dom::remove`] returns; listeners are untouched then.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), DomError> {
        self.host_mut().remove(node)?;
        self.prune_listeners();
        Ok(())
    }
}

fn click_action(dom: &Dom, node: NodeId) -> Option<Action<Dom>> {
    match dom.tag(node)? {
        "a" => {
            let href = String::from(dom.attribute(node, "href")?);
            Some(Action::new(move |engine: &mut Engine<Dom>, _: &Event| {
                engine.host_mut().navigate(&href);
            }))
        }
        "button" => {
            let form = dom.closest(node, "form")?;
            let event_type = match dom.attribute(node, "type").unwrap_or("submit") {
                "submit" => "submit",
                "reset" => "reset",
                _ => return None,
            };
            Some(Action::new(move |engine: &mut Engine<Dom>, _: &Event| {
                fire(engine, form, Event::new(event_type).with_bubbles(true));
            }))
        }
        "summary" => {
            let details = dom.parent(node).filter(|&p| dom.is_element(p, "details"))?;
            Some(Action::new(move |engine: &mut Engine<Dom>, _: &Event| {
                engine.host_mut().toggle_attribute(details, "open");
                engine.schedule(move |engine| fire(engine, details, Event::new("toggle")));
            }))
        }
        "option" => {
            let select = dom.closest(node, "select")?;
            Some(Action::new(move |engine: &mut Engine<Dom>, _: &Event| {
                let dom = engine.host_mut();
                for id in dom.descendants(select) {
                    if dom.is_element(id, "option") {
                        dom.remove_attribute(id, "selected");
                    }
                }
                if let Err(err) = dom.set_attribute(node, "selected", "") {
                    tracing::warn!(error = %err, ?node, "could not select option");
                    return;
                }
                fire(engine, select, Event::new("change").with_bubbles(true));
            }))
        }
        _ => None,
    }
}

/// Dispatch a follow-up event, logging instead of failing.
fn fire(engine: &mut Engine<Dom>, target: NodeId, event: Event) {
    let event_type = String::from(event.event_type());
    if let Err(err) = engine.dispatch_event(target, event, DispatchOptions::default()) {
        tracing::warn!(
            error = %err,
            event_type = %event_type,
            ?target,
            "follow-up event was not dispatched"
        );
    }
}
