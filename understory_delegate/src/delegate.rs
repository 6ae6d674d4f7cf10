// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegation resolver: per-dispatch delegate lookup and target remapping.
//!
//! ## Overview
//!
//! A delegated registration attaches one listener at a root and decides, on every native
//! dispatch, which node the event "logically" happened on.
//!
//! 1) If a validator is present and returns `false`, the dispatch stops here.
//! 2) Starting at the native target, walk up the structural parents:
//!    - a candidate that is not an element ends the walk with no delegate;
//!    - a candidate that passes the selector is the delegate;
//!    - the attachment root ends the walk if it did not pass;
//!    - otherwise continue with the parent.
//! 3) With a delegate, build a delegated [`EventContext`] and invoke the handler.
//!
//! The walk never climbs above the attachment root, but the root itself is a valid delegate.
//!
//! ## Target remapping
//!
//! The native event is never mutated. Each dispatch gets its own [`EventContext`], dropped
//! when the handler returns:
//!
//! - [`capture_target`](EventContext::capture_target) is the attachment root;
//! - when the delegate differs from the native target,
//!   [`original_target`](EventContext::original_target) holds the native target and
//!   [`target`](EventContext::target) the delegate;
//! - otherwise `original_target` is `None` and `target` is the native target.

use alloc::rc::Rc;
use core::fmt;

use crate::register::RegistrationSpec;
use crate::types::{DispatchTarget, Listener, NativeEvent};

/// Per-dispatch view of a native event, carrying target remapping.
pub struct EventContext<'a, T: DispatchTarget> {
    event: &'a T::Event,
    native_target: T,
    target: T,
    original_target: Option<T>,
    capture_target: Option<T>,
}

impl<'a, T: DispatchTarget> EventContext<'a, T> {
    /// An unaugmented context: `target` is the native target.
    pub fn native(event: &'a T::Event) -> Self {
        let native_target = event.target();
        Self {
            event,
            target: native_target.clone(),
            native_target,
            original_target: None,
            capture_target: None,
        }
    }

    /// The delegated context for `delegate`, resolved under `root`.
    pub fn delegated(&self, root: &T, delegate: T) -> Self {
        let (target, original_target) = if delegate == self.native_target {
            (delegate, None)
        } else {
            (delegate, Some(self.native_target.clone()))
        };
        Self {
            event: self.event,
            native_target: self.native_target.clone(),
            target,
            original_target,
            capture_target: Some(root.clone()),
        }
    }

    /// The native event as delivered by the host.
    #[inline]
    pub fn event(&self) -> &'a T::Event {
        self.event
    }

    /// The event type.
    #[inline]
    pub fn event_type(&self) -> &'a str {
        self.event.event_type()
    }

    /// The delegate on delegated dispatch, otherwise the native target.
    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The node the event was natively dispatched at, whether or not it was remapped.
    #[inline]
    pub fn native_target(&self) -> &T {
        &self.native_target
    }

    /// The native target, present only when it was remapped to a different delegate.
    #[inline]
    pub fn original_target(&self) -> Option<&T> {
        self.original_target.as_ref()
    }

    /// The attachment root, present only on delegated dispatch.
    #[inline]
    pub fn capture_target(&self) -> Option<&T> {
        self.capture_target.as_ref()
    }
}

impl<T: DispatchTarget> fmt::Debug for EventContext<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("event_type", &self.event_type())
            .field("target", &self.target)
            .field("original_target", &self.original_target)
            .field("capture_target", &self.capture_target)
            .finish_non_exhaustive()
    }
}

/// Walk from the native target towards `spec`'s root looking for the delegate.
///
/// Without a selector the root itself is the delegate.
pub(crate) fn resolve_delegate<T: DispatchTarget>(
    spec: &RegistrationSpec<T>,
    cx: &EventContext<'_, T>,
) -> Option<T> {
    let root = spec.target();
    let Some(selector) = spec.selector() else {
        return Some(root.clone());
    };
    let mut candidate = cx.native_target().clone();
    loop {
        if !candidate.is_element() {
            return None;
        }
        if selector.test(&candidate, cx, spec) {
            return Some(candidate);
        }
        if candidate == *root {
            return None;
        }
        candidate = candidate.parent_node()?;
    }
}

/// Run one native dispatch through a delegated registration.
fn dispatch_delegated<T: DispatchTarget>(spec: &RegistrationSpec<T>, event: &T::Event) {
    let cx = EventContext::native(event);
    if let Some(validator) = spec.validator()
        && !validator.call(spec.target(), &cx, spec)
    {
        tracing::trace!(event = spec.event_name(), "dispatch vetoed by validator");
        return;
    }
    let Some(delegate) = resolve_delegate(spec, &cx) else {
        tracing::trace!(
            event = spec.event_name(),
            native = ?cx.native_target(),
            "no delegate under root"
        );
        return;
    };
    let cx = cx.delegated(spec.target(), delegate);
    tracing::trace!(event = spec.event_name(), delegate = ?cx.target(), "delegate resolved");
    spec.handler().invoke(cx.target(), &cx, spec);
}

/// The listener for a registration with a selector or validator.
pub(crate) fn delegated_listener<T: DispatchTarget>(spec: Rc<RegistrationSpec<T>>) -> Listener<T> {
    Listener::new(move |event: &T::Event| dispatch_delegated(&spec, event))
}

/// The listener for a registration that binds its handler directly.
///
/// The handler's receiver is the attachment root.
pub(crate) fn direct_listener<T: DispatchTarget>(spec: Rc<RegistrationSpec<T>>) -> Listener<T> {
    Listener::new(move |event: &T::Event| {
        let cx = EventContext::native(event);
        spec.handler().invoke(spec.target(), &cx, &spec);
    })
}
