// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The arena tree.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_event_path::EventTree;

use crate::error::DomError;
use crate::types::{NodeId, NodeKind};

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    /// Set on shadow roots.
    host: Option<NodeId>,
    /// Set on shadow hosts.
    shadow: Option<NodeId>,
    attributes: SmallVec<[(Box<str>, Box<str>); 2]>,
    /// Dirty textarea value; `None` falls back to the `value` attribute.
    value: Option<String>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: SmallVec::new(),
            host: None,
            shadow: None,
            attributes: SmallVec::new(),
            value: None,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// A document with shadow roots, slots and a little form state.
///
/// The window and document sentinels are created by [`Dom::new`] and can
/// never be removed.
#[derive(Clone, Debug)]
pub struct Dom {
    slots: Vec<Slot>,
    free: Vec<u32>,
    window: NodeId,
    document: NodeId,
    location: Option<String>,
    submissions: Vec<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a tree holding only the window and an empty document.
    pub fn new() -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            free: Vec::new(),
            window: NodeId::new(0, 1),
            document: NodeId::new(1, 1),
            location: None,
            submissions: Vec::new(),
        };
        dom.window = dom.alloc(NodeKind::Window);
        dom.document = dom.alloc(NodeKind::Document);
        dom
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = Some(NodeData::new(kind));
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.data = data;
            NodeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).expect("node arena exhausted");
            self.slots.push(Slot {
                generation: 1,
                data,
            });
            NodeId::new(idx, 1)
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.data.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.data.as_mut()
    }

    /// The `window` sentinel.
    pub fn window(&self) -> NodeId {
        self.window
    }

    /// The document.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Create a detached element. The tag is stored in lower case.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(tag.to_ascii_lowercase().into()))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// previous parent first.
    ///
    /// # Errors
    ///
    /// - [`DomError::StaleNode`] if either node is not alive.
    /// - [`DomError::HierarchyRequest`] if `parent` cannot hold children, `child`
    ///   cannot be inserted, or `child` is an inclusive ancestor of `parent`
    ///   (following shadow hosts as well as parents).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let (Some(p), Some(c)) = (self.node(parent), self.node(child)) else {
            return Err(DomError::StaleNode);
        };
        if !p.kind.is_container() || !c.kind.is_insertable() {
            return Err(DomError::HierarchyRequest);
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(DomError::HierarchyRequest);
            }
            cursor = self.node(node).and_then(|n| n.parent.or(n.host));
        }

        self.detach(child);
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        Ok(())
    }

    /// Detach `node` from its parent. Returns `true` if it had one.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node_mut(node).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        true
    }

    /// Detach `node` and free it together with its descendants and shadow trees.
    ///
    /// # Errors
    ///
    /// - [`DomError::StaleNode`] if `node` is not alive.
    /// - [`DomError::HierarchyRequest`] for the window, the document and shadow roots.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let data = self.node(node).ok_or(DomError::StaleNode)?;
        if !data.kind.is_insertable() {
            return Err(DomError::HierarchyRequest);
        }
        self.detach(node);
        let mut stack: Vec<NodeId> = Vec::from([node]);
        while let Some(id) = stack.pop() {
            let Some(data) = self.slots[id.idx()].data.take() else {
                continue;
            };
            stack.extend(data.children.iter().copied());
            stack.extend(data.shadow);
            self.free.push(id.0);
        }
        Ok(())
    }

    /// Attach a shadow root to an element.
    ///
    /// # Errors
    ///
    /// - [`DomError::StaleNode`] if `host` is not alive.
    /// - [`DomError::NotSupported`] if `host` is not an element or already has a shadow root.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        let data = self.node(host).ok_or(DomError::StaleNode)?;
        if !matches!(data.kind, NodeKind::Element(_)) || data.shadow.is_some() {
            return Err(DomError::NotSupported);
        }
        let root = self.alloc(NodeKind::ShadowRoot);
        if let Some(r) = self.node_mut(root) {
            r.host = Some(host);
        }
        if let Some(h) = self.node_mut(host) {
            h.shadow = Some(root);
        }
        Ok(root)
    }

    /// The shadow root attached to `host`.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.node(host)?.shadow
    }

    /// The host of a shadow root.
    pub fn host(&self, root: NodeId) -> Option<NodeId> {
        self.node(root)?.host
    }

    /// The light-tree parent.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    /// Children in tree order. Empty for stale handles.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[][..], |n| n.children.as_slice())
    }

    /// The tag of an element.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element(tag) => Some(&**tag),
            _ => None,
        }
    }

    /// Returns `true` if `node` is an element with the given (lower-case) tag.
    pub fn is_element(&self, node: NodeId, tag: &str) -> bool {
        self.tag(node) == Some(tag)
    }

    /// The content of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Text(text) => Some(&**text),
            _ => None,
        }
    }

    /// Set an attribute, replacing any previous value.
    ///
    /// # Errors
    ///
    /// - [`DomError::StaleNode`] if `node` is not alive.
    /// - [`DomError::NotSupported`] if `node` is not an element.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let data = self.node_mut(node).ok_or(DomError::StaleNode)?;
        if !matches!(data.kind, NodeKind::Element(_)) {
            return Err(DomError::NotSupported);
        }
        match data.attributes.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, v)) => *v = value.into(),
            None => data.attributes.push((name.into(), value.into())),
        }
        Ok(())
    }

    /// An attribute value.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?
            .attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| &**v)
    }

    /// Returns `true` if the attribute is present.
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        let Some(data) = self.node_mut(node) else {
            return false;
        };
        let before = data.attributes.len();
        data.attributes.retain(|(n, _)| &**n != name);
        data.attributes.len() != before
    }

    /// Flip a boolean attribute. Returns whether it is present afterwards.
    pub fn toggle_attribute(&mut self, node: NodeId, name: &str) -> bool {
        if self.remove_attribute(node, name) {
            false
        } else {
            self.set_attribute(node, name, "").is_ok()
        }
    }

    /// Light-tree descendants of `node` in tree order, excluding `node`.
    ///
    /// Shadow trees are not entered.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// The nearest inclusive light-tree ancestor with the given tag.
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if self.is_element(id, tag) {
                return Some(id);
            }
            cursor = self.parent(id);
        }
        None
    }

    /// The slot `node` is assigned to.
    ///
    /// A child of a shadow host is assigned to the first `slot` element, in
    /// the host's shadow tree order, whose `name` matches the child's `slot`
    /// attribute. Children without a `slot` attribute (text included) go to
    /// the first slot without a name.
    pub fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        let data = self.node(node)?;
        if !data.kind.is_insertable() {
            return None;
        }
        let shadow = self.shadow_root(data.parent?)?;
        let name = self.attribute(node, "slot").unwrap_or("");
        self.descendants(shadow).into_iter().find(|&candidate| {
            self.is_element(candidate, "slot")
                && self.attribute(candidate, "name").unwrap_or("") == name
        })
    }

    /// The current value of a textarea.
    ///
    /// Falls back to the `value` attribute until the value is set.
    pub fn value(&self, node: NodeId) -> &str {
        let Some(data) = self.node(node) else {
            return "";
        };
        match &data.value {
            Some(value) => value.as_str(),
            None => self.attribute(node, "value").unwrap_or(""),
        }
    }

    /// Replace the value of a textarea.
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(data) = self.node_mut(node) {
            data.value = Some(value.into());
        }
    }

    /// Restore the value of a textarea to its `value` attribute.
    pub fn reset_value(&mut self, node: NodeId) {
        if let Some(data) = self.node_mut(node) {
            data.value = None;
        }
    }

    /// The last location navigated to.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Navigate to `href`.
    pub fn navigate(&mut self, href: &str) {
        self.location = Some(href.into());
    }

    /// Forms submitted so far, oldest first.
    pub fn submissions(&self) -> &[NodeId] {
        &self.submissions
    }

    /// Record a form submission.
    pub fn record_submission(&mut self, form: NodeId) {
        self.submissions.push(form);
    }
}

impl EventTree for Dom {
    type Node = NodeId;

    fn window(&self) -> NodeId {
        self.window
    }

    fn is_event_target(&self, node: NodeId) -> bool {
        self.is_alive(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Self::parent(self, node)
    }

    fn host(&self, node: NodeId) -> Option<NodeId> {
        Self::host(self, node)
    }

    fn shadow_root(&self, node: NodeId) -> Option<NodeId> {
        Self::shadow_root(self, node)
    }

    fn assigned_slot(&self, node: NodeId) -> Option<NodeId> {
        Self::assigned_slot(self, node)
    }

    fn is_document(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Document))
    }
}
