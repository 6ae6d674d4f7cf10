// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory host: a small node tree with native capture → target → bubble dispatch.
//!
//! ## Feature
//!
//! Enable with `memory_adapter` (on by default).
//!
//! ## Model
//!
//! A [`Document`] owns an arena of nodes: one window, one document node, and any number of
//! elements and text nodes created from it. [`NodeRef`] handles implement
//! [`DispatchTarget`] and [`StructuralNode`]; two handles are equal when they name the same node.
//!
//! - Only elements are eligible for structural matching.
//! - The document and elements can root delegation; the window and text nodes cannot.
//! - The event path of a node connected to the document ends at the window, although the
//!   window is not the document's structural parent.
//!
//! ## Dispatch
//!
//! [`NodeRef::dispatch`] builds the root→target path from parent links and invokes listeners
//! in three phases:
//!
//! 1) capture listeners on each ancestor, outermost first;
//! 2) capture, then non-capture listeners on the target;
//! 3) for bubbling events, non-capture listeners on each ancestor, innermost first.
//!
//! Listener lists are snapshotted per node: listeners attached during dispatch do not run on
//! that node, listeners detached during dispatch do not run at all.
//!
//! ## Selectors
//!
//! [`StructuralNode::matches`] understands comma-separated lists of compound selectors made of
//! an optional tag (or `*`), `#id` and `.class` parts, e.g. `li.item, button#ok`.
//! Combinators are not supported.
//!
//! Listeners that capture handles into their own document keep it alive until detached.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::options::ListenerOptions;
use crate::types::{DispatchTarget, Listener, NativeEvent, StructuralNode};

/// Phases of event propagation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Parent-to-target traversal.
    Capture,
    /// Target node.
    Target,
    /// Target-to-parent traversal.
    Bubble,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct NodeId(usize);

const WINDOW: NodeId = NodeId(0);
const DOCUMENT: NodeId = NodeId(1);

enum NodeKind {
    Window,
    Document,
    Element(ElementData),
    Text(String),
}

struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
}

struct Entry {
    event: String,
    listener: Listener<NodeRef>,
    options: Rc<ListenerOptions>,
    removed: Rc<Cell<bool>>,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Entry>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct Arena {
    nodes: RefCell<Vec<NodeData>>,
}

/// Owner of a node tree.
#[derive(Clone)]
pub struct Document {
    arena: Rc<Arena>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.nodes.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create a document with its window and document node.
    pub fn new() -> Self {
        let nodes = alloc::vec![
            NodeData::new(NodeKind::Window),
            NodeData::new(NodeKind::Document)
        ];
        Self {
            arena: Rc::new(Arena {
                nodes: RefCell::new(nodes),
            }),
        }
    }

    /// The window. A dispatch target, but not a structural node.
    pub fn window(&self) -> NodeRef {
        self.node(WINDOW)
    }

    /// The document node, top of the structural tree.
    pub fn root(&self) -> NodeRef {
        self.node(DOCUMENT)
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> NodeRef {
        self.push(NodeKind::Element(ElementData {
            tag: tag.into(),
            id: id.map(String::from),
            classes: classes.iter().map(|c| String::from(*c)).collect(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: &str) -> NodeRef {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&self, kind: NodeKind) -> NodeRef {
        let mut nodes = self.arena.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(NodeData::new(kind));
        self.node(id)
    }

    fn node(&self, id: NodeId) -> NodeRef {
        NodeRef {
            arena: Rc::clone(&self.arena),
            id,
        }
    }
}

/// Handle to a node of a [`Document`].
#[derive(Clone)]
pub struct NodeRef {
    arena: Rc<Arena>,
    id: NodeId,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.arena, &other.arena)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|n| match &n.kind {
            NodeKind::Window => write!(f, "NodeRef({} #window)", self.id.0),
            NodeKind::Document => write!(f, "NodeRef({} #document)", self.id.0),
            NodeKind::Text(_) => write!(f, "NodeRef({} #text)", self.id.0),
            NodeKind::Element(el) => {
                write!(f, "NodeRef({} <{}", self.id.0, el.tag)?;
                if let Some(id) = &el.id {
                    write!(f, "#{id}")?;
                }
                for class in &el.classes {
                    write!(f, ".{class}")?;
                }
                f.write_str(">)")
            }
        })
    }
}

impl NodeRef {
    fn with<R>(&self, f: impl FnOnce(&NodeData) -> R) -> R {
        f(&self.arena.nodes.borrow()[self.id.0])
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> R {
        f(&mut self.arena.nodes.borrow_mut()[self.id.0])
    }

    fn sibling(&self, id: NodeId) -> Self {
        Self {
            arena: Rc::clone(&self.arena),
            id,
        }
    }

    /// The element's tag, or `None` for other nodes.
    pub fn tag(&self) -> Option<String> {
        self.with(|n| match &n.kind {
            NodeKind::Element(el) => Some(el.tag.clone()),
            _ => None,
        })
    }

    /// The element's id attribute, if any.
    pub fn element_id(&self) -> Option<String> {
        self.with(|n| match &n.kind {
            NodeKind::Element(el) => el.id.clone(),
            _ => None,
        })
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.with(|n| match &n.kind {
            NodeKind::Element(el) => el.classes.iter().any(|c| c == class),
            _ => false,
        })
    }

    /// The text of a text node.
    pub fn text(&self) -> Option<String> {
        self.with(|n| match &n.kind {
            NodeKind::Text(t) => Some(t.clone()),
            _ => None,
        })
    }

    /// Child nodes, in order.
    pub fn children(&self) -> Vec<Self> {
        self.with(|n| n.children.iter().map(|&id| self.sibling(id)).collect())
    }

    /// Append `child` as the last child, moving it from its current parent.
    ///
    /// Ignored when `child` belongs to another document, is the window or document node,
    /// is an ancestor of `self`, or when `self` cannot have children.
    pub fn append_child(&self, child: &Self) {
        if !Rc::ptr_eq(&self.arena, &child.arena) || matches!(child.id, WINDOW | DOCUMENT) {
            tracing::warn!(parent = ?self, ?child, "append_child ignored");
            return;
        }
        let can_parent = self.with(|n| matches!(n.kind, NodeKind::Document | NodeKind::Element(_)));
        let creates_cycle = self.path().iter().any(|n| n == child);
        if !can_parent || creates_cycle {
            tracing::warn!(parent = ?self, ?child, "append_child ignored");
            return;
        }
        child.remove();
        child.with_mut(|n| n.parent = Some(self.id));
        self.with_mut(|n| n.children.push(child.id));
    }

    /// Detach this node from its parent.
    pub fn remove(&self) {
        let Some(parent) = self.with_mut(|n| n.parent.take()) else {
            return;
        };
        self.sibling(parent)
            .with_mut(|n| n.children.retain(|&c| c != self.id));
    }

    /// Number of live listeners attached for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.with(|n| {
            n.listeners
                .iter()
                .filter(|e| e.event == event_type && !e.options.aborted())
                .count()
        })
    }

    /// Dispatch a bubbling event of `event_type` at this node.
    pub fn dispatch(&self, event_type: &str) -> MemoryEvent {
        self.dispatch_with(event_type, true)
    }

    /// Dispatch an event of `event_type` at this node.
    pub fn dispatch_with(&self, event_type: &str, bubbles: bool) -> MemoryEvent {
        let event = MemoryEvent {
            event_type: event_type.into(),
            target: self.clone(),
            bubbles,
            phase: Cell::new(None),
            current_target: RefCell::new(None),
            passive: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        };
        let path = self.event_path();
        let Some((target, ancestors)) = path.split_last() else {
            return event;
        };
        // Capture: root→parent
        for node in ancestors {
            node.invoke(&event, Phase::Capture, true);
        }
        // Target: capture listeners first, then the rest.
        target.invoke(&event, Phase::Target, true);
        target.invoke(&event, Phase::Target, false);
        // Bubble: parent→root
        if bubbles {
            for node in ancestors.iter().rev() {
                node.invoke(&event, Phase::Bubble, false);
            }
        }
        event.phase.set(None);
        *event.current_target.borrow_mut() = None;
        event
    }

    /// Structural root→self path.
    fn path(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut cur = Some(self.clone());
        // Collect to root; append_child keeps ancestry acyclic.
        while let Some(node) = cur {
            cur = node.with(|n| n.parent).map(|p| self.sibling(p));
            out.push(node);
        }
        out.reverse();
        out
    }

    /// Root→self propagation path, including the window for connected nodes.
    fn event_path(&self) -> Vec<Self> {
        let mut path = self.path();
        if path.first().is_some_and(|n| n.id == DOCUMENT) {
            path.insert(0, self.sibling(WINDOW));
        }
        path
    }

    fn invoke(&self, event: &MemoryEvent, phase: Phase, capture: bool) {
        if event.propagation_stopped.get() {
            return;
        }
        let snapshot: Vec<(Listener<Self>, Rc<ListenerOptions>, Rc<Cell<bool>>)> = self.with(|n| {
            n.listeners
                .iter()
                .filter(|e| e.event == event.event_type && e.options.capture() == capture)
                .map(|e| {
                    (
                        e.listener.clone(),
                        Rc::clone(&e.options),
                        Rc::clone(&e.removed),
                    )
                })
                .collect()
        });
        if snapshot.is_empty() {
            return;
        }
        event.phase.set(Some(phase));
        *event.current_target.borrow_mut() = Some(self.clone());
        for (listener, options, removed) in snapshot {
            if removed.get() {
                continue;
            }
            if options.aborted() {
                self.remove_entry(&removed);
                continue;
            }
            if options.once() {
                self.remove_entry(&removed);
            }
            event.passive.set(options.passive());
            listener.call(event);
            event.passive.set(false);
            if event.immediate_stopped.get() {
                break;
            }
        }
    }

    fn remove_entry(&self, removed: &Rc<Cell<bool>>) {
        removed.set(true);
        self.with_mut(|n| n.listeners.retain(|e| !Rc::ptr_eq(&e.removed, removed)));
    }
}

impl StructuralNode for NodeRef {
    fn is_element(&self) -> bool {
        self.with(|n| matches!(n.kind, NodeKind::Element(_)))
    }

    fn matches(&self, selector: &str) -> bool {
        self.with(|n| match &n.kind {
            NodeKind::Element(el) => matches_selector(el, selector),
            _ => false,
        })
    }

    fn parent_node(&self) -> Option<Self> {
        self.with(|n| n.parent).map(|p| self.sibling(p))
    }
}

impl DispatchTarget for NodeRef {
    type Event = MemoryEvent;

    fn attach(&self, event_name: &str, listener: &Listener<Self>, options: &Rc<ListenerOptions>) {
        if options.aborted() {
            return;
        }
        self.with_mut(|n| {
            let exists = n.listeners.iter().any(|e| {
                e.event == event_name
                    && e.listener == *listener
                    && e.options.capture() == options.capture()
            });
            if !exists {
                n.listeners.push(Entry {
                    event: event_name.into(),
                    listener: listener.clone(),
                    options: Rc::clone(options),
                    removed: Rc::new(Cell::new(false)),
                });
            }
        });
    }

    fn detach(&self, event_name: &str, listener: &Listener<Self>, options: &Rc<ListenerOptions>) {
        self.with_mut(|n| {
            let pos = n.listeners.iter().position(|e| {
                e.event == event_name
                    && e.listener == *listener
                    && e.options.capture() == options.capture()
            });
            if let Some(pos) = pos {
                n.listeners.remove(pos).removed.set(true);
            }
        });
    }

    fn is_dispatch_root(&self) -> bool {
        self.with(|n| matches!(n.kind, NodeKind::Document | NodeKind::Element(_)))
    }
}

/// An event dispatched by [`NodeRef::dispatch`].
#[derive(Debug)]
pub struct MemoryEvent {
    event_type: String,
    target: NodeRef,
    bubbles: bool,
    phase: Cell<Option<Phase>>,
    current_target: RefCell<Option<NodeRef>>,
    passive: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl MemoryEvent {
    /// Whether the event bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// The phase being dispatched, or `None` outside dispatch.
    pub fn phase(&self) -> Option<Phase> {
        self.phase.get()
    }

    /// The node whose listeners are running, or `None` outside dispatch.
    pub fn current_target(&self) -> Option<NodeRef> {
        self.current_target.borrow().clone()
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Stop before the next listener.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Cancel the default action. Ignored inside passive listeners.
    pub fn prevent_default(&self) {
        if !self.passive.get() {
            self.default_prevented.set(true);
        }
    }

    /// Whether the default action was canceled.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl NativeEvent<NodeRef> for MemoryEvent {
    fn target(&self) -> NodeRef {
        self.target.clone()
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }
}

fn matches_selector(el: &ElementData, selector: &str) -> bool {
    selector
        .split(',')
        .any(|compound| matches_compound(el, compound.trim()))
}

fn matches_compound(el: &ElementData, compound: &str) -> bool {
    if compound.is_empty() {
        return false;
    }
    let split = compound.find(['.', '#']).unwrap_or(compound.len());
    let (tag, mut rest) = compound.split_at(split);
    if !(tag.is_empty() || tag == "*" || tag.eq_ignore_ascii_case(&el.tag)) {
        return false;
    }
    while let Some(sigil) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['.', '#']).unwrap_or(body.len());
        let (name, next) = body.split_at(end);
        let ok = !name.is_empty()
            && match sigil {
                '.' => el.classes.iter().any(|c| c == name),
                _ => el.id.as_deref() == Some(name),
            };
        if !ok {
            return false;
        }
        rest = next;
    }
    true
}
