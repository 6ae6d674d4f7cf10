// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration arguments: the tagged variants accepted by
//! [`on_event`](crate::register::on_event) and [`on_events`](crate::batch::on_events).
//!
//! ## Overview
//!
//! Registration calls take a heterogeneous argument list.
//! Each [`Arg`] is tagged with its kind, and the [`classify`](crate::classify) module resolves
//! the list into a [`RegistrationSpec`](crate::register::RegistrationSpec) using a fixed
//! priority per kind.
//!
//! ## Callbacks
//!
//! A [`Callback`] has a single shape, `(node, cx, spec) -> bool`, so one callback kind can fill
//! the handler, selector or validator slot depending on its position:
//!
//! - as a handler, `node` is the receiver (the delegate, or the attachment root for direct
//!   binds) and the return value is ignored;
//! - as a selector, `node` is the candidate being tested;
//! - as a validator, `node` is the attachment root and `false` vetoes the dispatch.
//!
//! ```
//! use understory_delegate::args::{Arg, Callback, Options};
//! use understory_delegate::adapters::memory::{Document, NodeRef};
//!
//! let doc = Document::new();
//! let list = doc.create_element("ul", None, &["menu"]);
//! doc.root().append_child(&list);
//!
//! let args: Vec<Arg<NodeRef>> = vec![
//!     Arg::target(list),
//!     "click".into(),
//!     "li".into(),
//!     Callback::handler(|item: &NodeRef, _cx, _spec| {
//!         let _ = item;
//!     })
//!     .into(),
//!     Options::new().detach(true).into(),
//! ];
//! # let _ = args;
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::delegate::EventContext;
use crate::options::AbortSignal;
use crate::register::RegistrationSpec;
use crate::types::DispatchTarget;

/// A caller-supplied function usable as a handler, selector or validator.
///
/// Equality is identity, as for [`Listener`](crate::types::Listener).
pub struct Callback<T: DispatchTarget>(Rc<CallbackFn<T>>);

type CallbackFn<T> = dyn Fn(&T, &EventContext<'_, T>, &RegistrationSpec<T>) -> bool;

impl<T: DispatchTarget> Callback<T> {
    /// Wrap a predicate. Suitable for any slot; in the handler slot its result is ignored.
    pub fn new(
        f: impl Fn(&T, &EventContext<'_, T>, &RegistrationSpec<T>) -> bool + 'static,
    ) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap a handler body that returns nothing.
    pub fn handler(f: impl Fn(&T, &EventContext<'_, T>, &RegistrationSpec<T>) + 'static) -> Self {
        Self::new(move |node, cx, spec| {
            f(node, cx, spec);
            true
        })
    }

    #[inline]
    pub(crate) fn call(&self, node: &T, cx: &EventContext<'_, T>, spec: &RegistrationSpec<T>) -> bool {
        (self.0)(node, cx, spec)
    }
}

impl<T: DispatchTarget> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: DispatchTarget> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: DispatchTarget> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// An object that handles events through a method rather than being called directly.
///
/// The delegate is available as [`EventContext::target`].
pub trait HandleEvent<T: DispatchTarget> {
    /// Handle one dispatch.
    fn handle_event(&self, cx: &EventContext<'_, T>, spec: &RegistrationSpec<T>);
}

/// The handler of a registration.
pub enum Handler<T: DispatchTarget> {
    /// A plain callback, invoked with the receiver as its first argument.
    Callback(Callback<T>),
    /// An object exposing [`HandleEvent::handle_event`].
    Object(Rc<dyn HandleEvent<T>>),
}

impl<T: DispatchTarget> Handler<T> {
    /// Invoke the handler for one dispatch with `receiver` as its receiver.
    pub(crate) fn invoke(&self, receiver: &T, cx: &EventContext<'_, T>, spec: &RegistrationSpec<T>) {
        match self {
            Self::Callback(f) => {
                f.call(receiver, cx, spec);
            }
            Self::Object(obj) => obj.handle_event(cx, spec),
        }
    }
}

impl<T: DispatchTarget> Clone for Handler<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(f) => Self::Callback(f.clone()),
            Self::Object(obj) => Self::Object(Rc::clone(obj)),
        }
    }
}

impl<T: DispatchTarget> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Callback(a), Self::Callback(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T: DispatchTarget> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(cb) => f.debug_tuple("Callback").field(cb).finish(),
            Self::Object(obj) => f
                .debug_tuple("Object")
                .field(&Rc::as_ptr(obj).cast::<()>())
                .finish(),
        }
    }
}

impl<T: DispatchTarget> From<Callback<T>> for Handler<T> {
    fn from(f: Callback<T>) -> Self {
        Self::Callback(f)
    }
}

/// A delegation predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector<T: DispatchTarget> {
    /// Tested with [`StructuralNode::matches`](crate::types::StructuralNode::matches).
    Structural(String),
    /// Called with the candidate, the event context and the registration spec.
    Predicate(Callback<T>),
}

impl<T: DispatchTarget> Selector<T> {
    /// Whether `candidate` passes this selector.
    pub(crate) fn test(
        &self,
        candidate: &T,
        cx: &EventContext<'_, T>,
        spec: &RegistrationSpec<T>,
    ) -> bool {
        match self {
            Self::Structural(sel) => candidate.matches(sel),
            Self::Predicate(f) => f.call(candidate, cx, spec),
        }
    }
}

impl<T: DispatchTarget> From<&str> for Selector<T> {
    fn from(sel: &str) -> Self {
        Self::Structural(sel.into())
    }
}

impl<T: DispatchTarget> From<Callback<T>> for Selector<T> {
    fn from(f: Callback<T>) -> Self {
        Self::Predicate(f)
    }
}

/// Named registration options.
///
/// When merged by the classifier, every field that is `Some` overwrites the
/// value gathered so far, regardless of how that value was supplied.
#[derive(Clone, Debug)]
pub struct Options<T: DispatchTarget> {
    /// Attachment root.
    pub target: Option<T>,
    /// Event type to listen for.
    pub event_name: Option<String>,
    /// Handler to invoke.
    pub handler: Option<Handler<T>>,
    /// Delegation predicate.
    pub selector: Option<Selector<T>>,
    /// Per-dispatch veto.
    pub validator: Option<Callback<T>>,
    /// Listen in the capture phase.
    pub capture: Option<bool>,
    /// Remove after the first invocation.
    pub once: Option<bool>,
    /// Passive listener.
    pub passive: Option<bool>,
    /// Cancellation signal.
    pub signal: Option<AbortSignal>,
    /// Request a [`DetachHandle`](crate::register::DetachHandle) on the registration.
    pub detach: Option<bool>,
}

impl<T: DispatchTarget> Default for Options<T> {
    fn default() -> Self {
        Self {
            target: None,
            event_name: None,
            handler: None,
            selector: None,
            validator: None,
            capture: None,
            once: None,
            passive: None,
            signal: None,
            detach: None,
        }
    }
}

impl<T: DispatchTarget> Options<T> {
    /// Empty options; merging them changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attachment root.
    #[must_use]
    pub fn target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the event type.
    #[must_use]
    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Set the handler.
    #[must_use]
    pub fn handler(mut self, handler: impl Into<Handler<T>>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    /// Set the delegation predicate.
    #[must_use]
    pub fn selector(mut self, selector: impl Into<Selector<T>>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Set the validator.
    #[must_use]
    pub fn validator(mut self, validator: Callback<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set the capture flag.
    #[must_use]
    pub fn capture(mut self, capture: bool) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Set the once flag.
    #[must_use]
    pub fn once(mut self, once: bool) -> Self {
        self.once = Some(once);
        self
    }

    /// Set the passive flag.
    #[must_use]
    pub fn passive(mut self, passive: bool) -> Self {
        self.passive = Some(passive);
        self
    }

    /// Set the cancellation signal.
    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Request (or explicitly decline) a detach handle.
    #[must_use]
    pub fn detach(mut self, detach: bool) -> Self {
        self.detach = Some(detach);
        self
    }
}

/// One registration argument.
pub enum Arg<T: DispatchTarget> {
    /// A dispatch target.
    Target(T),
    /// A homogeneous group of dispatch targets. Only [`on_events`](crate::batch::on_events) accepts it.
    Targets(Vec<T>),
    /// An event name or a structural selector, depending on position.
    Text(String),
    /// A handler, selector or validator, depending on position.
    Callback(Callback<T>),
    /// A handler object.
    HandlerObject(Rc<dyn HandleEvent<T>>),
    /// Named options.
    Options(Options<T>),
}

impl<T: DispatchTarget> Arg<T> {
    /// A single dispatch target.
    pub fn target(target: T) -> Self {
        Self::Target(target)
    }

    /// A group of dispatch targets.
    pub fn targets(targets: impl IntoIterator<Item = T>) -> Self {
        Self::Targets(targets.into_iter().collect())
    }

    /// A handler object.
    pub fn handler_object(obj: impl HandleEvent<T> + 'static) -> Self {
        Self::HandlerObject(Rc::new(obj))
    }

    /// Short name of the argument kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Target(_) => "target",
            Self::Targets(_) => "targets",
            Self::Text(_) => "text",
            Self::Callback(_) => "callback",
            Self::HandlerObject(_) => "handler object",
            Self::Options(_) => "options",
        }
    }
}

impl<T: DispatchTarget> Clone for Arg<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Target(t) => Self::Target(t.clone()),
            Self::Targets(ts) => Self::Targets(ts.clone()),
            Self::Text(s) => Self::Text(s.clone()),
            Self::Callback(f) => Self::Callback(f.clone()),
            Self::HandlerObject(obj) => Self::HandlerObject(Rc::clone(obj)),
            Self::Options(o) => Self::Options(o.clone()),
        }
    }
}

impl<T: DispatchTarget> fmt::Debug for Arg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(t) => f.debug_tuple("Target").field(t).finish(),
            Self::Targets(ts) => f.debug_tuple("Targets").field(ts).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Callback(cb) => f.debug_tuple("Callback").field(cb).finish(),
            Self::HandlerObject(obj) => f
                .debug_tuple("HandlerObject")
                .field(&Rc::as_ptr(obj).cast::<()>())
                .finish(),
            Self::Options(o) => f.debug_tuple("Options").field(o).finish(),
        }
    }
}

impl<T: DispatchTarget> From<&str> for Arg<T> {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl<T: DispatchTarget> From<String> for Arg<T> {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: DispatchTarget> From<Callback<T>> for Arg<T> {
    fn from(f: Callback<T>) -> Self {
        Self::Callback(f)
    }
}

impl<T: DispatchTarget> From<Options<T>> for Arg<T> {
    fn from(o: Options<T>) -> Self {
        Self::Options(o)
    }
}

impl<T: DispatchTarget> From<Vec<T>> for Arg<T> {
    fn from(ts: Vec<T>) -> Self {
        Self::Targets(ts)
    }
}
