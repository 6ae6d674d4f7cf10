// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capabilities consumed by the registrar, and the listener handle it attaches.
//!
//! ## Overview
//!
//! The registrar never dispatches events itself.
//! It is layered on a host (a browser DOM, or [`adapters::memory`](crate::adapters)) that already
//! knows how to attach, detach and dispatch with ancestor propagation.
//! These traits describe the narrow slice of that host the registrar relies on.

use alloc::rc::Rc;
use core::fmt;

use crate::options::ListenerOptions;

/// Walk a node's structure and test it against structural selectors.
///
/// Targets that are not part of a structure (for example a window) report
/// `false` from [`is_element`](Self::is_element) and `None` from
/// [`parent_node`](Self::parent_node).
pub trait StructuralNode: Sized {
    /// Whether this node is eligible for structural matching.
    ///
    /// The delegate walk stops with no match at the first ineligible candidate.
    fn is_element(&self) -> bool;

    /// Whether this node matches the structural `selector`.
    fn matches(&self, selector: &str) -> bool;

    /// Returns the structural parent of this node, or `None` at the top.
    fn parent_node(&self) -> Option<Self>;
}

/// An event as delivered by the host to an attached [`Listener`].
pub trait NativeEvent<T> {
    /// The node the event was natively dispatched at.
    fn target(&self) -> T;

    /// The event type, e.g. `"click"`.
    fn event_type(&self) -> &str;
}

/// Something listeners can be attached to.
///
/// Handles are compared with `PartialEq`; hosts should implement it as
/// identity (two handles are equal when they refer to the same node).
pub trait DispatchTarget: StructuralNode + Clone + PartialEq + fmt::Debug + 'static {
    /// The event type the host delivers to listeners attached here.
    type Event: NativeEvent<Self> + 'static;

    /// Attach `listener` for `event_name`.
    ///
    /// Attaching the same listener twice with equal capture flags is a no-op.
    fn attach(&self, event_name: &str, listener: &Listener<Self>, options: &Rc<ListenerOptions>);

    /// Detach `listener` for `event_name`.
    ///
    /// Detaching a listener that is not attached is a no-op.
    fn detach(&self, event_name: &str, listener: &Listener<Self>, options: &Rc<ListenerOptions>);

    /// Whether this target can root a delegated listener.
    fn is_dispatch_root(&self) -> bool;
}

/// The function object actually handed to the host's attach and detach primitives.
///
/// Equality is identity: a clone of a listener is equal to it, a separately
/// constructed listener never is, even with the same body.
pub struct Listener<T: DispatchTarget>(Rc<dyn Fn(&T::Event)>);

impl<T: DispatchTarget> Listener<T> {
    /// Wrap a closure as a listener.
    pub fn new(f: impl Fn(&T::Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the listener with a natively dispatched event.
    #[inline]
    pub fn call(&self, event: &T::Event) {
        (self.0)(event);
    }
}

impl<T: DispatchTarget> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: DispatchTarget> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: DispatchTarget> Eq for Listener<T> {}

impl<T: DispatchTarget> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

#[cfg(all(test, feature = "memory_adapter"))]
mod tests {
    use super::*;
    use crate::adapters::memory::{Document, MemoryEvent, NodeRef};

    #[test]
    fn listener_equality_is_identity() {
        let a: Listener<NodeRef> = Listener::new(|_: &MemoryEvent| {});
        let b: Listener<NodeRef> = Listener::new(|_: &MemoryEvent| {});
        assert_eq!(a, a.clone(), "a clone is the same listener");
        assert_ne!(a, b, "same body, different listener");
    }

    #[test]
    fn non_structural_targets_have_no_parent() {
        let doc = Document::new();
        let window = doc.window();
        assert!(!window.is_element());
        assert!(window.parent_node().is_none());
        assert!(!window.is_dispatch_root());
        assert!(doc.root().is_dispatch_root());
    }
}
