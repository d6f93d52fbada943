// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation contexts and the bounced-path builder.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use smallvec::SmallVec;

use crate::error::PathError;
use crate::tree::EventTree;

/// How a context entered the bounced path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// The context that contains the dispatch target.
    Target,
    /// A context reached by crossing from a shadow root to its host.
    Host,
    /// A slot's scope, entered when content projected through the slot is reached.
    Slotted,
}

/// One encapsulation boundary visited by a dispatch.
///
/// `path` runs from the context's outer edge to its local target (the
/// dispatch target, a shadow host, or a slot), inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationContext<K> {
    root: K,
    path: SmallVec<[K; 8]>,
    parent: Option<usize>,
    anchor: usize,
    kind: ContextKind,
}

impl<K: Copy + Eq> PropagationContext<K> {
    fn new(path: SmallVec<[K; 8]>, kind: ContextKind) -> Self {
        Self {
            root: path[0],
            path,
            parent: None,
            anchor: 0,
            kind,
        }
    }

    /// The boundary's topmost node: a shadow root, `window`, or the top of a
    /// disconnected subtree.
    pub fn root(&self) -> K {
        self.root
    }

    /// Nodes from the outer edge to the local target, inclusive.
    pub fn path(&self) -> &[K] {
        &self.path
    }

    /// The node that acts as the target inside this context.
    pub fn local_target(&self) -> K {
        self.path[self.path.len() - 1]
    }

    /// Index of the context whose path contains this context's host.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Index, in the parent's path, of the host this context hangs off.
    ///
    /// Meaningless when [`parent`](Self::parent) is `None`.
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// How this context entered the path.
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Returns `true` if `node` is on this context's path.
    pub fn contains(&self, node: K) -> bool {
        self.path.contains(&node)
    }
}

/// How far the builder crosses encapsulation boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PathScope {
    /// Only the context that contains the target. Slots are not followed.
    Local,
    /// Cross every shadow boundary outward and follow slot assignments.
    #[default]
    Bounce,
}

/// Options for [`BouncedPath::build`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions<K> {
    /// Stop the upward walk at this node (inclusive).
    ///
    /// Must be a document, a shadow root, or `window`.
    pub root: Option<K>,
    /// Boundary crossing policy.
    pub scope: PathScope,
}

impl<K> Default for BuildOptions<K> {
    fn default() -> Self {
        Self {
            root: None,
            scope: PathScope::Bounce,
        }
    }
}

impl<K> BuildOptions<K> {
    /// Options for a path restricted to the target's own context.
    pub fn local() -> Self {
        Self {
            root: None,
            scope: PathScope::Local,
        }
    }

    /// Set an explicit propagation root.
    pub fn with_root(mut self, root: K) -> Self {
        self.root = Some(root);
        self
    }
}

/// The ordered context forest visited by one dispatch.
///
/// Built once per dispatch and never mutated afterwards, so tree mutations
/// performed by listeners do not change where the event goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BouncedPath<K> {
    target: K,
    target_context: usize,
    contexts: Vec<PropagationContext<K>>,
    flattened: Vec<(K, usize)>,
}

impl<K> BouncedPath<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Build the bounced path for a dispatch at `target`.
    ///
    /// The walk goes up through `parent` links. A shadow root closes the
    /// current context and the walk resumes at its host in a new, outer
    /// context. Reaching a document appends `window`. For every
    /// (host, slotted child) pair found on any context's path, the slot's own
    /// context is built and attached to that host.
    ///
    /// # Errors
    ///
    /// - [`PathError::NotAnEventTarget`] if `target` is not live.
    /// - [`PathError::InvalidRoot`] if `options.root` is not a boundary or `window`.
    pub fn build<T>(tree: &T, target: K, options: &BuildOptions<K>) -> Result<Self, PathError>
    where
        T: EventTree<Node = K> + ?Sized,
    {
        if !tree.is_event_target(target) {
            return Err(PathError::NotAnEventTarget);
        }
        if let Some(root) = options.root {
            let is_window = root == tree.window();
            if !is_window && !(tree.is_event_target(root) && tree.is_boundary(root)) {
                return Err(PathError::InvalidRoot);
            }
        }

        let mut raw: Vec<PropagationContext<K>> = Vec::new();
        let mut start = target;
        let mut kind = ContextKind::Target;
        loop {
            let (path, host) = walk_up(tree, start, options.root);
            raw.push(PropagationContext::new(path, kind));
            match host {
                Some(host) if options.scope == PathScope::Bounce => {
                    start = host;
                    kind = ContextKind::Host;
                }
                _ => break,
            }
        }
        for inner in 0..raw.len() - 1 {
            let anchor = raw[inner + 1].path.len() - 1;
            raw[inner].parent = Some(inner + 1);
            raw[inner].anchor = anchor;
        }
        let top = raw.len() - 1;

        if options.scope == PathScope::Bounce {
            // Slotted contexts are scanned as well, which picks up slot chains.
            let mut scan = 0;
            while scan < raw.len() {
                let found: SmallVec<[(usize, PropagationContext<K>); 2]> = raw[scan]
                    .path
                    .windows(2)
                    .enumerate()
                    .filter_map(|(i, pair)| {
                        slotted_context(tree, pair[0], pair[1]).map(|ctx| (i, ctx))
                    })
                    .collect();
                for (anchor, mut ctx) in found {
                    ctx.parent = Some(scan);
                    ctx.anchor = anchor;
                    raw.push(ctx);
                }
                scan += 1;
            }
        }

        Ok(Self::from_raw(target, raw, top))
    }

    fn from_raw(target: K, raw: Vec<PropagationContext<K>>, top: usize) -> Self {
        let mut order = Vec::with_capacity(raw.len());
        post_order(&raw, top, &mut order);

        let mut remap = vec![0; raw.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }
        let contexts: Vec<_> = order
            .iter()
            .map(|&old| {
                let mut ctx = raw[old].clone();
                ctx.parent = ctx.parent.map(|p| remap[p]);
                ctx
            })
            .collect();

        let mut flattened = Vec::new();
        flatten_into(&contexts, remap[top], &mut flattened);

        Self {
            target,
            // The walk always starts with the target's context.
            target_context: remap[0],
            contexts,
            flattened,
        }
    }

    /// The dispatch target.
    pub fn target(&self) -> K {
        self.target
    }

    /// Index of the context that contains the dispatch target.
    pub fn target_context(&self) -> usize {
        self.target_context
    }

    /// All contexts, innermost first.
    pub fn contexts(&self) -> &[PropagationContext<K>] {
        &self.contexts
    }

    /// The context at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn context(&self, index: usize) -> &PropagationContext<K> {
        &self.contexts[index]
    }

    /// Every node root→target, paired with the index of its context.
    pub fn flattened(&self) -> &[(K, usize)] {
        &self.flattened
    }

    /// The composed path, target first.
    pub fn composed_path(&self) -> Vec<K> {
        self.flattened.iter().rev().map(|&(node, _)| node).collect()
    }

    /// The outermost node the event visits.
    pub fn outermost_node(&self) -> K {
        self.flattened[0].0
    }

    /// Returns `true` if context `inner` is `outer` or nested inside it.
    pub fn is_within(&self, inner: usize, outer: usize) -> bool {
        let mut current = Some(inner);
        while let Some(idx) = current {
            if idx == outer {
                return true;
            }
            current = self.contexts[idx].parent;
        }
        false
    }

    /// Index of the first context, innermost first, whose path contains `node`.
    pub fn context_of(&self, node: K) -> Option<usize> {
        self.contexts.iter().position(|ctx| ctx.contains(node))
    }
}

/// Walk from `start` to the nearest boundary (or `stop`), returning the path
/// outer→inner and the host to continue from, if the boundary is a shadow root.
fn walk_up<T>(tree: &T, start: T::Node, stop: Option<T::Node>) -> (SmallVec<[T::Node; 8]>, Option<T::Node>)
where
    T: EventTree + ?Sized,
{
    let mut path = SmallVec::new();
    let mut node = start;
    let host = loop {
        path.push(node);
        if stop == Some(node) {
            break None;
        }
        if let Some(host) = tree.host(node) {
            break Some(host);
        }
        match tree.parent(node) {
            Some(parent) => node = parent,
            None => {
                let window = tree.window();
                if tree.is_document(node) && node != window {
                    path.push(window);
                }
                break None;
            }
        }
    };
    path.reverse();
    (path, host)
}

/// The context of the slot `child` is projected through, if `child` is slotted into `host`.
fn slotted_context<T>(tree: &T, host: T::Node, child: T::Node) -> Option<PropagationContext<T::Node>>
where
    T: EventTree + ?Sized,
{
    let shadow = tree.shadow_root(host)?;
    let slot = tree.assigned_slot(child)?;
    let (path, _) = walk_up(tree, slot, None);
    // A slot outside `host`'s own shadow tree is not a projection of `child`.
    if path[0] != shadow {
        return None;
    }
    Some(PropagationContext::new(path, ContextKind::Slotted))
}

fn children_of<K>(raw: &[PropagationContext<K>], parent: usize) -> SmallVec<[usize; 4]> {
    raw.iter()
        .enumerate()
        .filter(|(_, ctx)| ctx.parent == Some(parent))
        .map(|(i, _)| i)
        .collect()
}

fn post_order<K>(raw: &[PropagationContext<K>], idx: usize, out: &mut Vec<usize>) {
    let mut children = children_of(raw, idx);
    // Deeper anchors are nearer the target.
    children.sort_by(|a, b| raw[*b].anchor.cmp(&raw[*a].anchor));
    for child in children {
        post_order(raw, child, out);
    }
    out.push(idx);
}

fn flatten_into<K: Copy>(contexts: &[PropagationContext<K>], idx: usize, out: &mut Vec<(K, usize)>) {
    let children = children_of(contexts, idx);
    for (i, &node) in contexts[idx].path.iter().enumerate() {
        out.push((node, idx));
        for &child in children.iter().filter(|&&c| contexts[c].anchor == i) {
            flatten_into(contexts, child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal arena tree for exercising the builder.
    #[derive(Default)]
    struct TestTree {
        nodes: Vec<TestNode>,
    }

    #[derive(Clone, Copy, Default)]
    struct TestNode {
        parent: Option<u32>,
        host: Option<u32>,
        shadow: Option<u32>,
        slot: Option<u32>,
        document: bool,
    }

    impl TestTree {
        fn with_document() -> Self {
            let mut tree = Self::default();
            tree.nodes.push(TestNode::default());
            tree.nodes.push(TestNode {
                document: true,
                ..TestNode::default()
            });
            tree
        }

        fn node(&mut self, parent: Option<u32>) -> u32 {
            self.nodes.push(TestNode {
                parent,
                ..TestNode::default()
            });
            (self.nodes.len() - 1) as u32
        }

        fn shadow(&mut self, host: u32) -> u32 {
            self.nodes.push(TestNode {
                host: Some(host),
                ..TestNode::default()
            });
            let root = (self.nodes.len() - 1) as u32;
            self.nodes[host as usize].shadow = Some(root);
            root
        }

        fn assign(&mut self, node: u32, slot: u32) {
            self.nodes[node as usize].slot = Some(slot);
        }

        fn detach(&mut self, node: u32) {
            self.nodes[node as usize].parent = None;
        }
    }

    impl EventTree for TestTree {
        type Node = u32;

        fn window(&self) -> u32 {
            0
        }

        fn is_event_target(&self, node: u32) -> bool {
            (node as usize) < self.nodes.len()
        }

        fn parent(&self, node: u32) -> Option<u32> {
            self.nodes[node as usize].parent
        }

        fn host(&self, node: u32) -> Option<u32> {
            self.nodes[node as usize].host
        }

        fn shadow_root(&self, node: u32) -> Option<u32> {
            self.nodes[node as usize].shadow
        }

        fn assigned_slot(&self, node: u32) -> Option<u32> {
            self.nodes[node as usize].slot
        }

        fn is_document(&self, node: u32) -> bool {
            self.nodes[node as usize].document
        }
    }

    struct Scenario {
        tree: TestTree,
        div: u32,
        slot_comp: u32,
        slot_root: u32,
        slot_span: u32,
        slot_slot: u32,
        shadow_comp: u32,
        shadow_root: u32,
        h1: u32,
    }

    /// `h1` inside `shadow-comp`, which is slotted into `slot-comp`, inside a `div`.
    fn scenario() -> Scenario {
        let mut tree = TestTree::with_document();
        let div = tree.node(Some(1));
        let slot_comp = tree.node(Some(div));
        let slot_root = tree.shadow(slot_comp);
        let slot_span = tree.node(Some(slot_root));
        let slot_slot = tree.node(Some(slot_span));
        let shadow_comp = tree.node(Some(slot_comp));
        tree.assign(shadow_comp, slot_slot);
        let shadow_root = tree.shadow(shadow_comp);
        let h1 = tree.node(Some(shadow_root));
        Scenario {
            tree,
            div,
            slot_comp,
            slot_root,
            slot_span,
            slot_slot,
            shadow_comp,
            shadow_root,
            h1,
        }
    }

    #[test]
    fn flattened_path_matches_composed_order() {
        let s = scenario();
        let path = BouncedPath::build(&s.tree, s.h1, &BuildOptions::default()).unwrap();
        let nodes: Vec<u32> = path.flattened().iter().map(|&(n, _)| n).collect();
        assert_eq!(
            nodes,
            vec![
                0,
                1,
                s.div,
                s.slot_comp,
                s.slot_root,
                s.slot_span,
                s.slot_slot,
                s.shadow_comp,
                s.shadow_root,
                s.h1,
            ]
        );
        assert_eq!(path.composed_path().first(), Some(&s.h1));
        assert_eq!(path.outermost_node(), 0);
    }

    #[test]
    fn contexts_are_innermost_first() {
        let s = scenario();
        let path = BouncedPath::build(&s.tree, s.h1, &BuildOptions::default()).unwrap();
        let ctx = path.contexts();
        assert_eq!(ctx.len(), 3);

        assert_eq!(ctx[0].kind(), ContextKind::Target);
        assert_eq!(ctx[0].path(), &[s.shadow_root, s.h1]);
        assert_eq!(ctx[1].kind(), ContextKind::Slotted);
        assert_eq!(ctx[1].path(), &[s.slot_root, s.slot_span, s.slot_slot]);
        assert_eq!(ctx[2].kind(), ContextKind::Host);
        assert_eq!(ctx[2].root(), 0);
        assert_eq!(ctx[2].local_target(), s.shadow_comp);
        assert_eq!(path.target_context(), 0);
    }

    #[test]
    fn parent_contains_host_of_each_context() {
        let s = scenario();
        let path = BouncedPath::build(&s.tree, s.h1, &BuildOptions::default()).unwrap();
        for ctx in path.contexts() {
            let Some(parent) = ctx.parent() else {
                assert_eq!(ctx.root(), 0);
                continue;
            };
            let host = s.tree.host(ctx.root()).unwrap();
            assert_eq!(path.context(parent).path()[ctx.anchor()], host);
        }
        assert!(path.is_within(0, 2));
        assert!(path.is_within(1, 2));
        assert!(!path.is_within(0, 1));
        assert!(!path.is_within(2, 0));
    }

    #[test]
    fn local_scope_keeps_only_the_target_context() {
        let s = scenario();
        let path = BouncedPath::build(&s.tree, s.h1, &BuildOptions::local()).unwrap();
        assert_eq!(path.contexts().len(), 1);
        assert_eq!(path.composed_path(), vec![s.h1, s.shadow_root]);
    }

    #[test]
    fn explicit_root_stops_the_walk() {
        let s = scenario();
        let options = BuildOptions::default().with_root(s.shadow_root);
        let path = BouncedPath::build(&s.tree, s.h1, &options).unwrap();
        assert_eq!(path.contexts().len(), 1);
        assert_eq!(path.context(0).root(), s.shadow_root);

        // Stopping at the document keeps the slot but drops the window.
        let options = BuildOptions::default().with_root(1);
        let path = BouncedPath::build(&s.tree, s.h1, &options).unwrap();
        assert_eq!(path.outermost_node(), 1);
        assert_eq!(path.contexts().len(), 3);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let s = scenario();
        assert_eq!(
            BouncedPath::build(&s.tree, 999, &BuildOptions::default()),
            Err(PathError::NotAnEventTarget)
        );
        let options = BuildOptions::default().with_root(s.div);
        assert_eq!(
            BouncedPath::build(&s.tree, s.h1, &options),
            Err(PathError::InvalidRoot)
        );
        let options = BuildOptions::default().with_root(0);
        assert!(BouncedPath::build(&s.tree, s.h1, &options).is_ok());
    }

    #[test]
    fn disconnected_subtree_ends_at_its_topmost_ancestor() {
        let mut s = scenario();
        s.tree.detach(s.div);
        let path = BouncedPath::build(&s.tree, s.h1, &BuildOptions::default()).unwrap();
        assert_eq!(path.outermost_node(), s.div);
        let top = path.contexts().last().unwrap();
        assert_eq!(top.root(), s.div);
        assert!(!path.composed_path().contains(&0));
    }

    #[test]
    fn unassigned_children_do_not_open_a_slot_context() {
        let mut tree = TestTree::with_document();
        let host = tree.node(Some(1));
        let _shadow = tree.shadow(host);
        let child = tree.node(Some(host));
        let path = BouncedPath::build(&tree, child, &BuildOptions::default()).unwrap();
        assert_eq!(path.contexts().len(), 1);
        assert_eq!(path.composed_path(), vec![child, host, 1, 0]);
    }

    #[test]
    fn slot_chains_are_followed_recursively() {
        // outer-comp's shadow holds inner-comp; outer's slot is itself slotted
        // into inner-comp's slot.
        let mut tree = TestTree::with_document();
        let outer = tree.node(Some(1));
        let outer_root = tree.shadow(outer);
        let inner = tree.node(Some(outer_root));
        let outer_slot = tree.node(Some(inner));
        let inner_root = tree.shadow(inner);
        let inner_slot = tree.node(Some(inner_root));
        tree.assign(outer_slot, inner_slot);
        let leaf = tree.node(Some(outer));
        tree.assign(leaf, outer_slot);

        let path = BouncedPath::build(&tree, leaf, &BuildOptions::default()).unwrap();
        let nodes: Vec<u32> = path.flattened().iter().map(|&(n, _)| n).collect();
        assert_eq!(
            nodes,
            vec![0, 1, outer, outer_root, inner, inner_root, inner_slot, outer_slot, leaf]
        );
        assert_eq!(path.contexts().len(), 3);
        assert_eq!(path.context(path.target_context()).path(), &[0, 1, outer, leaf]);
    }
}
