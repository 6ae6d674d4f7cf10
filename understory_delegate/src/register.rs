// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single registration: one target, one event name, one handler.
//!
//! ## Overview
//!
//! [`on_event`] classifies its arguments, resolves listener options once, builds the listener
//! and attaches it with exactly one host call.
//! When a selector or validator ended up in the registration spec, the listener runs the
//! [delegation resolver](crate::delegate); otherwise the handler is bound directly and receives
//! the attachment root as its receiver.
//!
//! Passing `Options::new().detach(true)` yields a [`DetachHandle`] on the returned
//! [`Registration`].
//!
//! ```
//! use understory_delegate::args::{Arg, Callback, Options};
//! use understory_delegate::adapters::memory::{Document, NodeRef};
//! use understory_delegate::register::on_event;
//!
//! let doc = Document::new();
//! let button = doc.create_element("button", Some("ok"), &[]);
//! doc.root().append_child(&button);
//!
//! let reg = on_event(vec![
//!     Arg::target(button.clone()),
//!     "click".into(),
//!     Callback::handler(|_: &NodeRef, _, _| {}).into(),
//!     Options::new().detach(true).into(),
//! ])
//! .unwrap();
//!
//! assert_eq!(button.listener_count("click"), 1);
//! let handle = reg.detach_handle().unwrap();
//! assert!(handle.detach());
//! assert!(!handle.detach());
//! assert_eq!(button.listener_count("click"), 0);
//! ```

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::fmt;

use crate::args::{Arg, Callback, Handler, Options, Selector};
use crate::classify::classify;
use crate::delegate::{delegated_listener, direct_listener};
use crate::error::DelegateError;
use crate::options::ListenerOptions;
use crate::types::{DispatchTarget, Listener};

/// The canonical, fully resolved description of one binding. Read-only once built.
pub struct RegistrationSpec<T: DispatchTarget> {
    target: T,
    event_name: String,
    handler: Handler<T>,
    selector: Option<Selector<T>>,
    validator: Option<Callback<T>>,
    listener_options: Rc<ListenerOptions>,
}

impl<T: DispatchTarget> RegistrationSpec<T> {
    /// Build a spec from classified fields, also returning whether detach was requested.
    pub(crate) fn from_fields(fields: Options<T>) -> Result<(Self, bool), DelegateError> {
        let Options {
            target,
            event_name,
            handler,
            selector,
            validator,
            capture,
            once,
            passive,
            signal,
            detach,
        } = fields;
        let target = target.ok_or(DelegateError::MissingTarget)?;
        let event_name = event_name.ok_or(DelegateError::MissingEventName)?;
        let handler = handler.ok_or_else(|| DelegateError::MissingHandler {
            event_name: event_name.clone(),
        })?;
        let spec = Self {
            target,
            event_name,
            handler,
            selector,
            validator,
            listener_options: ListenerOptions::resolve(capture, once, passive, signal),
        };
        Ok((spec, detach.unwrap_or(false)))
    }

    /// The attachment root.
    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The event type listened for.
    #[inline]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The handler.
    #[inline]
    pub fn handler(&self) -> &Handler<T> {
        &self.handler
    }

    /// The delegation predicate, if any.
    #[inline]
    pub fn selector(&self) -> Option<&Selector<T>> {
        self.selector.as_ref()
    }

    /// The validator, if any.
    #[inline]
    pub fn validator(&self) -> Option<&Callback<T>> {
        self.validator.as_ref()
    }

    /// Options used for both attach and detach.
    #[inline]
    pub fn listener_options(&self) -> &Rc<ListenerOptions> {
        &self.listener_options
    }

    /// Whether dispatch goes through the delegation resolver.
    #[inline]
    pub fn is_delegated(&self) -> bool {
        self.selector.is_some() || self.validator.is_some()
    }
}

impl<T: DispatchTarget> PartialEq for RegistrationSpec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.event_name == other.event_name
            && self.handler == other.handler
            && self.selector == other.selector
            && self.validator == other.validator
            && self.listener_options == other.listener_options
    }
}

impl<T: DispatchTarget> fmt::Debug for RegistrationSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationSpec")
            .field("target", &self.target)
            .field("event_name", &self.event_name)
            .field("handler", &self.handler)
            .field("selector", &self.selector)
            .field("validator", &self.validator)
            .field("listener_options", &self.listener_options)
            .finish()
    }
}

/// Removes a registration's listener from its target.
///
/// Only present on registrations created with `detach: true`.
pub struct DetachHandle<T: DispatchTarget> {
    spec: Rc<RegistrationSpec<T>>,
    listener: Listener<T>,
    detached: Cell<bool>,
}

impl<T: DispatchTarget> DetachHandle<T> {
    /// Detach the listener with the options it was attached with.
    ///
    /// Returns `true` if this call detached it; later calls do nothing and return `false`.
    pub fn detach(&self) -> bool {
        if self.detached.replace(true) {
            return false;
        }
        let spec = &self.spec;
        spec.target
            .detach(&spec.event_name, &self.listener, &spec.listener_options);
        tracing::debug!(event = %spec.event_name, target = ?spec.target, "listener detached");
        true
    }

    /// Whether [`detach`](Self::detach) has run.
    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }
}

impl<T: DispatchTarget> fmt::Debug for DetachHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachHandle")
            .field("event_name", &self.spec.event_name)
            .field("detached", &self.detached.get())
            .finish_non_exhaustive()
    }
}

/// A finished registration.
pub struct Registration<T: DispatchTarget> {
    spec: Rc<RegistrationSpec<T>>,
    listener: Listener<T>,
    detach: Option<DetachHandle<T>>,
}

impl<T: DispatchTarget> Registration<T> {
    /// The resolved spec.
    #[inline]
    pub fn spec(&self) -> &RegistrationSpec<T> {
        &self.spec
    }

    /// The listener handed to the host.
    #[inline]
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }

    /// The detach capability, present only when it was requested.
    #[inline]
    pub fn detach_handle(&self) -> Option<&DetachHandle<T>> {
        self.detach.as_ref()
    }

    /// Whether the registration has been detached through its handle.
    ///
    /// A `once` listener the host already removed still reports `false`.
    pub fn is_detached(&self) -> bool {
        self.detach.as_ref().is_some_and(DetachHandle::is_detached)
    }
}

impl<T: DispatchTarget> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("spec", &self.spec)
            .field("listener", &self.listener)
            .field("detach", &self.detach)
            .finish()
    }
}

/// Register one listener from a heterogeneous argument list.
///
/// See the [classifier](crate::classify) for how arguments are placed.
///
/// ## Errors
///
/// - [`DelegateError::MissingTarget`], [`DelegateError::MissingEventName`] or
///   [`DelegateError::MissingHandler`] when a required field was never supplied.
/// - [`DelegateError::InvalidTarget`] when a delegated registration is rooted at a
///   target that cannot root delegation.
///
/// Nothing is attached when an error is returned.
pub fn on_event<T: DispatchTarget>(
    args: impl IntoIterator<Item = Arg<T>>,
) -> Result<Registration<T>, DelegateError> {
    let classified = classify(args);
    let (spec, detach) = RegistrationSpec::from_fields(classified.fields)?;
    attach(Rc::new(spec), detach)
}

/// Register one delegated listener from typed parts.
///
/// `options` may carry flags, a validator or a detach request; its target, event name,
/// selector and handler are replaced by the explicit arguments.
///
/// ## Errors
///
/// [`DelegateError::InvalidTarget`] when `target` cannot root delegation.
pub fn on_delegated_event<T: DispatchTarget>(
    target: T,
    event_name: impl Into<String>,
    selector: impl Into<Selector<T>>,
    handler: impl Into<Handler<T>>,
    options: Options<T>,
) -> Result<Registration<T>, DelegateError> {
    let fields = options
        .target(target)
        .event_name(event_name)
        .selector(selector)
        .handler(handler);
    let (spec, detach) = RegistrationSpec::from_fields(fields)?;
    attach(Rc::new(spec), detach)
}

fn attach<T: DispatchTarget>(
    spec: Rc<RegistrationSpec<T>>,
    detach: bool,
) -> Result<Registration<T>, DelegateError> {
    let listener = if spec.is_delegated() {
        if !spec.target.is_dispatch_root() {
            return Err(DelegateError::InvalidTarget {
                target: format!("{:?}", spec.target),
                event_name: spec.event_name.clone(),
            });
        }
        delegated_listener(Rc::clone(&spec))
    } else {
        direct_listener(Rc::clone(&spec))
    };

    spec.target
        .attach(&spec.event_name, &listener, &spec.listener_options);
    tracing::debug!(
        event = %spec.event_name,
        target = ?spec.target,
        delegated = spec.is_delegated(),
        "listener attached"
    );

    let detach = detach.then(|| DetachHandle {
        spec: Rc::clone(&spec),
        listener: listener.clone(),
        detached: Cell::new(false),
    });
    Ok(Registration {
        spec,
        listener,
        detach,
    })
}

#[cfg(all(test, feature = "memory_adapter"))]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::adapters::memory::{Document, NodeRef};
    use crate::options::AbortController;

    fn counter() -> (Rc<Cell<u32>>, Callback<NodeRef>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, Callback::handler(move |_: &NodeRef, _, _| h.set(h.get() + 1)))
    }

    #[test]
    fn direct_bind_receiver_is_attachment_root() {
        let doc = Document::new();
        let list = doc.create_element("ul", None, &[]);
        let item = doc.create_element("li", None, &[]);
        doc.root().append_child(&list);
        list.append_child(&item);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let reg = on_event(vec![
            "click".into(),
            Callback::handler(move |receiver: &NodeRef, cx, _| {
                s.borrow_mut().push((
                    receiver.clone(),
                    cx.target().clone(),
                    cx.original_target().cloned(),
                    cx.capture_target().cloned(),
                ));
            })
            .into(),
            Arg::target(list.clone()),
        ])
        .unwrap();
        assert!(!reg.spec().is_delegated());
        assert!(reg.detach_handle().is_none(), "detach not requested");

        item.dispatch("click");
        assert_eq!(
            *seen.borrow(),
            vec![(list.clone(), item.clone(), None, None)],
            "direct binds see the native event unaugmented"
        );
    }

    #[test]
    fn detach_twice_is_a_no_op() {
        let doc = Document::new();
        let el = doc.create_element("button", None, &[]);
        doc.root().append_child(&el);
        let (hits, handler) = counter();
        let reg = on_event(vec![
            Arg::target(el.clone()),
            "click".into(),
            handler.into(),
            Options::new().detach(true).into(),
        ])
        .unwrap();

        el.dispatch("click");
        let handle = reg.detach_handle().unwrap();
        assert!(handle.detach());
        assert!(!handle.detach());
        assert!(reg.is_detached());
        el.dispatch("click");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn delegated_detach_removes_the_delegating_listener() {
        let doc = Document::new();
        let list = doc.create_element("ul", None, &[]);
        let item = doc.create_element("li", None, &[]);
        doc.root().append_child(&list);
        list.append_child(&item);
        let (hits, handler) = counter();
        let reg = on_delegated_event(
            list.clone(),
            "click",
            "li",
            handler,
            Options::new().detach(true),
        )
        .unwrap();
        item.dispatch("click");
        reg.detach_handle().unwrap().detach();
        item.dispatch("click");
        assert_eq!(hits.get(), 1);
        assert_eq!(list.listener_count("click"), 0);
    }

    #[test]
    fn detach_uses_the_stored_capture_flag() {
        let doc = Document::new();
        let el = doc.create_element("div", None, &[]);
        doc.root().append_child(&el);
        let (_hits, handler) = counter();
        let reg = on_event(vec![
            Arg::target(el.clone()),
            "focus".into(),
            handler.into(),
            Options::new().capture(true).detach(true).into(),
        ])
        .unwrap();
        assert!(reg.spec().listener_options().capture());
        assert_eq!(el.listener_count("focus"), 1);
        reg.detach_handle().unwrap().detach();
        assert_eq!(el.listener_count("focus"), 0);
    }

    #[test]
    fn once_and_signal_are_honored_by_the_host() {
        let doc = Document::new();
        let el = doc.create_element("div", None, &[]);
        doc.root().append_child(&el);

        let (once_hits, once_handler) = counter();
        on_event(vec![
            Arg::target(el.clone()),
            "click".into(),
            once_handler.into(),
            Options::new().once(true).into(),
        ])
        .unwrap();

        let ctl = AbortController::new();
        let (signal_hits, signal_handler) = counter();
        on_event(vec![
            Arg::target(el.clone()),
            "click".into(),
            signal_handler.into(),
            Options::new().signal(ctl.signal()).into(),
        ])
        .unwrap();

        el.dispatch("click");
        ctl.abort();
        el.dispatch("click");
        assert_eq!(once_hits.get(), 1);
        assert_eq!(signal_hits.get(), 1);
        assert_eq!(el.listener_count("click"), 0);
    }

    #[test]
    fn missing_fields_are_errors() {
        let doc = Document::new();
        let (_hits, handler) = counter();
        assert_eq!(
            on_event(vec!["click".into(), handler.clone().into()]).unwrap_err(),
            DelegateError::MissingTarget
        );
        assert_eq!(
            on_event(vec![Arg::target(doc.root()), handler.into()]).unwrap_err(),
            DelegateError::MissingEventName
        );
        assert_eq!(
            on_event(vec![Arg::target(doc.root()), "click".into()]).unwrap_err(),
            DelegateError::MissingHandler {
                event_name: "click".into()
            }
        );
        assert_eq!(doc.root().listener_count("click"), 0);
    }

    #[test]
    fn direct_bind_on_window_is_allowed() {
        let doc = Document::new();
        let window = doc.window();
        let (hits, handler) = counter();
        on_event(vec![Arg::target(window.clone()), "resize".into(), handler.into()]).unwrap();
        window.dispatch("resize");
        assert_eq!(hits.get(), 1);
    }
}
