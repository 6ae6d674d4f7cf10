// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch registration and teardown across many targets and event names.
//!
//! ## Overview
//!
//! [`on_events`] sorts its arguments into three buckets:
//!
//! - targets, from [`Arg::Target`] and every member of [`Arg::Targets`];
//! - event names, from [`Arg::Text`], trimmed and split on whitespace;
//! - everything else, passed through unchanged to each single registration.
//!
//! Targets and event names are deduplicated, keeping first-seen order.
//! Every (target, event name) pair becomes one [`on_event`] call whose reserved fields
//! (target, event name, detach request) are placed both before and after the pass-through
//! arguments, so nothing passed through can override them.
//!
//! ## Teardown
//!
//! [`MultiRegistration::off`] detaches by target or event name;
//! [`MultiRegistration::off_all`] detaches everything. Both are idempotent and unknown keys
//! are ignored. Entries stay in the registry after teardown, marked detached.
//!
//! ```
//! use understory_delegate::args::{Arg, Callback};
//! use understory_delegate::adapters::memory::{Document, NodeRef};
//! use understory_delegate::batch::{on_events, RegistryKey};
//!
//! let doc = Document::new();
//! let a = doc.create_element("button", Some("a"), &[]);
//! let b = doc.create_element("button", Some("b"), &[]);
//!
//! let batch = on_events(vec![
//!     Arg::targets([a.clone(), b.clone()]),
//!     "click keydown".into(),
//!     Callback::handler(|_: &NodeRef, _, _| {}).into(),
//! ])
//! .unwrap();
//! assert_eq!(batch.len(), 4);
//!
//! assert_eq!(batch.off([RegistryKey::target(&a)]), 2);
//! assert_eq!(a.listener_count("click"), 0);
//! assert_eq!(b.listener_count("click"), 1);
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, iter};

use crate::args::{Arg, Options};
use crate::error::DelegateError;
use crate::register::{Registration, on_event};
use crate::types::DispatchTarget;

/// Lookup key into a [`MultiRegistration`].
#[derive(Debug, PartialEq, Eq)]
pub enum RegistryKey<'a, T> {
    /// Registrations rooted at a target.
    Target(&'a T),
    /// Registrations for an event name.
    EventName(&'a str),
}

impl<T> Clone for RegistryKey<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RegistryKey<'_, T> {}

impl<'a, T> RegistryKey<'a, T> {
    /// Key by target.
    pub fn target(target: &'a T) -> Self {
        Self::Target(target)
    }

    /// Key by event name.
    pub fn event(name: &'a str) -> Self {
        Self::EventName(name)
    }
}

/// Every registration created by one [`on_events`] call.
///
/// Dropping a `MultiRegistration` does not detach anything.
///
/// The per-target and per-event lookups are first-seen ordered `Vec`s scanned linearly, since
/// [`DispatchTarget`] only requires `PartialEq`. Building a batch of `T` targets and `E` event
/// names costs O(T·E·(T + E)) comparisons; fine for the handful of targets a batch usually
/// spans, but hosts with very large batches should split them.
pub struct MultiRegistration<T: DispatchTarget> {
    registrations: Vec<Rc<Registration<T>>>,
    by_target: Vec<(T, Vec<Rc<Registration<T>>>)>,
    by_event: Vec<(String, Vec<Rc<Registration<T>>>)>,
}

impl<T: DispatchTarget> MultiRegistration<T> {
    fn with_capacity(n: usize) -> Self {
        Self {
            registrations: Vec::with_capacity(n),
            by_target: Vec::new(),
            by_event: Vec::new(),
        }
    }

    fn insert(&mut self, reg: Registration<T>) {
        let reg = Rc::new(reg);
        let spec = reg.spec();
        match self.by_target.iter_mut().find(|(t, _)| t == spec.target()) {
            Some((_, regs)) => regs.push(Rc::clone(&reg)),
            None => self
                .by_target
                .push((spec.target().clone(), alloc::vec![Rc::clone(&reg)])),
        }
        match self
            .by_event
            .iter_mut()
            .find(|(e, _)| e == spec.event_name())
        {
            Some((_, regs)) => regs.push(Rc::clone(&reg)),
            None => self
                .by_event
                .push((spec.event_name().into(), alloc::vec![Rc::clone(&reg)])),
        }
        self.registrations.push(reg);
    }

    /// All registrations, in target order then event-name order.
    pub fn registrations(&self) -> &[Rc<Registration<T>>] {
        &self.registrations
    }

    /// Number of registrations, detached ones included.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the batch created no registrations.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Number of registrations not yet detached.
    pub fn active_len(&self) -> usize {
        self.registrations.iter().filter(|r| !r.is_detached()).count()
    }

    /// Distinct targets, in first-seen order.
    pub fn targets(&self) -> impl Iterator<Item = &T> + '_ {
        self.by_target.iter().map(|(t, _)| t)
    }

    /// Distinct event names, in first-seen order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_event.iter().map(|(e, _)| e.as_str())
    }

    /// Registrations rooted at `target`, or `None` if the batch never saw it.
    pub fn by_target(&self, target: &T) -> Option<&[Rc<Registration<T>>]> {
        self.by_target
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, regs)| regs.as_slice())
    }

    /// Registrations for `event_name`, or `None` if the batch never saw it.
    pub fn by_event(&self, event_name: &str) -> Option<&[Rc<Registration<T>>]> {
        self.by_event
            .iter()
            .find(|(e, _)| e == event_name)
            .map(|(_, regs)| regs.as_slice())
    }

    /// Registrations for `key`, or `None` if the key is unknown.
    pub fn get(&self, key: RegistryKey<'_, T>) -> Option<&[Rc<Registration<T>>]> {
        match key {
            RegistryKey::Target(t) => self.by_target(t),
            RegistryKey::EventName(e) => self.by_event(e),
        }
    }

    /// Detach every registration, in order. Returns how many were detached by this call.
    pub fn off_all(&self) -> usize {
        let n = detach_each(&self.registrations);
        tracing::debug!(detached = n, total = self.len(), "batch detached");
        n
    }

    /// Detach the registrations matching any of `keys`.
    ///
    /// Unknown keys are ignored. Registrations matched by several keys are detached once.
    /// An empty key list detaches everything, like [`off_all`](Self::off_all).
    /// Returns how many registrations were detached by this call.
    pub fn off<'k>(&self, keys: impl IntoIterator<Item = RegistryKey<'k, T>>) -> usize
    where
        T: 'k,
    {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return self.off_all();
        }
        let mut n = 0;
        for key in keys {
            match self.get(key) {
                Some(regs) => n += detach_each(regs),
                None => tracing::trace!(?key, "unknown key ignored"),
            }
        }
        tracing::debug!(detached = n, "batch partially detached");
        n
    }
}

impl<T: DispatchTarget> fmt::Debug for MultiRegistration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiRegistration")
            .field("len", &self.len())
            .field("active", &self.active_len())
            .field("targets", &self.by_target.len())
            .field("event_names", &self.by_event.len())
            .finish_non_exhaustive()
    }
}

fn detach_each<T: DispatchTarget>(regs: &[Rc<Registration<T>>]) -> usize {
    regs.iter()
        .filter_map(|r| r.detach_handle())
        .filter(|h| h.detach())
        .count()
}

fn push_unique<V: PartialEq>(set: &mut Vec<V>, value: V) {
    if !set.contains(&value) {
        set.push(value);
    }
}

/// Register every (target, event name) pair found in `args`.
///
/// Each registration is created with a detach handle so the batch can be torn down.
///
/// ## Errors
///
/// The first error from a single registration. Registrations already created by this call
/// are detached before returning it.
pub fn on_events<T: DispatchTarget>(
    args: impl IntoIterator<Item = Arg<T>>,
) -> Result<MultiRegistration<T>, DelegateError> {
    let mut targets: Vec<T> = Vec::new();
    let mut event_names: Vec<String> = Vec::new();
    let mut pass_through: Vec<Arg<T>> = Vec::new();

    for arg in args {
        match arg {
            Arg::Target(t) => push_unique(&mut targets, t),
            Arg::Targets(ts) => {
                for t in ts {
                    push_unique(&mut targets, t);
                }
            }
            Arg::Text(text) => {
                for name in text.split_whitespace() {
                    push_unique(&mut event_names, String::from(name));
                }
            }
            other => pass_through.push(other),
        }
    }

    let mut batch = MultiRegistration::with_capacity(targets.len() * event_names.len());
    for target in &targets {
        for name in &event_names {
            let reserved = Options::new()
                .target(target.clone())
                .event_name(name.clone())
                .detach(true);
            let args = iter::once(Arg::Options(reserved.clone()))
                .chain(pass_through.iter().cloned())
                .chain(iter::once(Arg::Options(reserved)));
            match on_event(args) {
                Ok(reg) => batch.insert(reg),
                Err(err) => {
                    batch.off_all();
                    return Err(err);
                }
            }
        }
    }
    tracing::debug!(
        registrations = batch.len(),
        targets = targets.len(),
        event_names = event_names.len(),
        "batch registered"
    );
    Ok(batch)
}

#[cfg(all(test, feature = "memory_adapter"))]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::{Cell, RefCell};

    use crate::adapters::memory::{Document, NodeRef};
    use crate::args::Callback;

    fn setup() -> (Document, NodeRef, NodeRef) {
        let doc = Document::new();
        let a = doc.create_element("div", Some("a"), &[]);
        let b = doc.create_element("div", Some("b"), &[]);
        doc.root().append_child(&a);
        doc.root().append_child(&b);
        (doc, a, b)
    }

    fn counter() -> (Rc<Cell<u32>>, Callback<NodeRef>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, Callback::handler(move |_: &NodeRef, _, _| h.set(h.get() + 1)))
    }

    #[test]
    fn cross_product_in_first_seen_order() {
        let (_doc, a, b) = setup();
        let (_hits, handler) = counter();
        let batch = on_events(vec![
            Arg::target(a.clone()),
            Arg::target(b.clone()),
            " click  keydown ".into(),
            handler.into(),
        ])
        .unwrap();

        let pairs: Vec<(NodeRef, String)> = batch
            .registrations()
            .iter()
            .map(|r| (r.spec().target().clone(), r.spec().event_name().into()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (a.clone(), "click".into()),
                (a.clone(), "keydown".into()),
                (b.clone(), "click".into()),
                (b.clone(), "keydown".into()),
            ]
        );
        assert_eq!(batch.targets().cloned().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(batch.event_names().collect::<Vec<_>>(), vec!["click", "keydown"]);
    }

    #[test]
    fn targets_and_names_are_deduplicated() {
        let (_doc, a, b) = setup();
        let (_hits, handler) = counter();
        let batch = on_events(vec![
            Arg::target(a.clone()),
            Arg::targets([b.clone(), a.clone()]),
            "click click".into(),
            "click".into(),
            handler.into(),
        ])
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(a.listener_count("click"), 1);
        assert_eq!(b.listener_count("click"), 1);
    }

    #[test]
    fn off_by_target_leaves_others_active() {
        let (_doc, a, b) = setup();
        let (hits, handler) = counter();
        let batch = on_events(vec![
            Arg::target(a.clone()),
            Arg::target(b.clone()),
            "click keydown".into(),
            handler.into(),
        ])
        .unwrap();
        assert_eq!(batch.len(), 4);

        assert_eq!(batch.off([RegistryKey::target(&a)]), 2);
        assert_eq!(batch.active_len(), 2);
        a.dispatch("click");
        a.dispatch("keydown");
        assert_eq!(hits.get(), 0);
        b.dispatch("click");
        b.dispatch("keydown");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn off_union_of_keys_detaches_overlap_once() {
        let (_doc, a, b) = setup();
        let (_hits, handler) = counter();
        let batch = on_events(vec![
            Arg::targets([a.clone(), b.clone()]),
            "click keydown".into(),
            handler.into(),
        ])
        .unwrap();
        let n = batch.off([RegistryKey::target(&a), RegistryKey::event("click")]);
        assert_eq!(n, 3, "a×click, a×keydown, b×click");
        assert_eq!(b.listener_count("keydown"), 1);
    }

    #[test]
    fn off_ignores_unknown_keys() {
        let (doc, a, _b) = setup();
        let stranger = doc.create_element("p", None, &[]);
        let (_hits, handler) = counter();
        let batch = on_events(vec![Arg::target(a.clone()), "click".into(), handler.into()]).unwrap();
        assert_eq!(
            batch.off([RegistryKey::target(&stranger), RegistryKey::event("wheel")]),
            0
        );
        assert!(batch.get(RegistryKey::event("wheel")).is_none());
        assert_eq!(batch.active_len(), 1);
    }

    #[test]
    fn off_without_keys_detaches_everything() {
        let (_doc, a, b) = setup();
        let (hits, handler) = counter();
        let batch = on_events(vec![
            Arg::targets([a.clone(), b.clone()]),
            "click keydown".into(),
            handler.into(),
        ])
        .unwrap();
        assert_eq!(batch.off(iter::empty()), 4);
        assert_eq!(batch.off_all(), 0, "idempotent");
        for t in [&a, &b] {
            t.dispatch("click");
            t.dispatch("keydown");
        }
        assert_eq!(hits.get(), 0);
        assert_eq!(batch.len(), 4, "entries are kept");
    }

    #[test]
    fn pass_through_cannot_override_reserved_fields() {
        let (doc, a, _b) = setup();
        let other = doc.create_element("span", None, &[]);
        let (hits, handler) = counter();
        let batch = on_events(vec![
            Arg::target(a.clone()),
            "click".into(),
            handler.into(),
            Options::new()
                .target(other.clone())
                .event_name("keydown")
                .detach(false)
                .capture(true)
                .into(),
        ])
        .unwrap();
        let reg = &batch.registrations()[0];
        assert_eq!(reg.spec().target(), &a);
        assert_eq!(reg.spec().event_name(), "click");
        assert!(reg.detach_handle().is_some());
        assert!(reg.spec().listener_options().capture(), "non-reserved options pass through");
        assert_eq!(other.listener_count("keydown"), 0);
        a.dispatch("click");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn delegated_batch_remaps_per_root() {
        let (doc, a, b) = setup();
        let item_a = doc.create_element("li", None, &[]);
        let item_b = doc.create_element("li", None, &[]);
        a.append_child(&item_a);
        b.append_child(&item_b);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let batch = on_events(vec![
            Arg::targets([a.clone(), b.clone()]),
            "click".into(),
            Options::new().selector("li").into(),
            Callback::handler(move |delegate: &NodeRef, cx, _| {
                s.borrow_mut()
                    .push((delegate.clone(), cx.capture_target().cloned()));
            })
            .into(),
        ])
        .unwrap();
        item_b.dispatch("click");
        item_a.dispatch("click");
        assert_eq!(
            *seen.borrow(),
            vec![(item_b, Some(b)), (item_a, Some(a))]
        );
        assert_eq!(batch.by_event("click").map(<[_]>::len), Some(2));
    }

    #[test]
    fn failure_rolls_back_the_batch() {
        let (doc, a, _b) = setup();
        let window = doc.window();
        let (_hits, handler) = counter();
        let err = on_events(vec![
            Arg::target(a.clone()),
            Arg::target(window.clone()),
            "click".into(),
            Options::new().selector("li").into(),
            handler.into(),
        ])
        .unwrap_err();
        assert!(matches!(err, DelegateError::InvalidTarget { .. }));
        assert_eq!(a.listener_count("click"), 0, "earlier registration rolled back");
        assert_eq!(window.listener_count("click"), 0);
    }

    #[test]
    fn no_targets_or_names_is_an_empty_batch() {
        let (_hits, handler) = counter();
        let batch = on_events::<NodeRef>(vec![handler.into()]).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.off_all(), 0);
    }
}
