// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_delegate --heading-base-level=0

//! Understory Delegate: delegated event registration and batch teardown, `no_std`.
//!
//! ## Overview
//!
//! This crate sits on top of a host event system that already attaches listeners and
//! dispatches events with capture → target → bubble propagation.
//! It does not dispatch events itself.
//! Instead, it turns a loosely ordered argument list into one listener per (target, event name)
//! pair, and, for delegated listeners, remaps each dispatch to the nearest matching descendant
//! of the attachment root before calling your handler.
//!
//! ## Hosts
//!
//! A host implements [`DispatchTarget`](crate::types::DispatchTarget) (attach, detach, and whether
//! a target can root delegation) and [`StructuralNode`](crate::types::StructuralNode)
//! (element check, selector matching, parent walk).
//! The `memory_adapter` feature provides [`adapters::memory`], a small node tree with a native
//! dispatch loop, used by the tests, benches and demos.
//!
//! ## Arguments
//!
//! Registration takes a list of [`Arg`](crate::args::Arg) values in any order.
//! [`classify`](crate::classify::classify) assigns each one to a slot (target, event name,
//! selector, handler, validator) by kind and order of appearance; named
//! [`Options`](crate::args::Options) override positional values.
//! Arguments that fit no free slot are reported as diagnostics and logged, never fatal.
//!
//! ## Delegation
//!
//! When a registration carries a selector or a validator, its listener:
//!
//! 1) asks the validator, if any, whether to proceed;
//! 2) walks from the native target toward the attachment root, stopping at the first element
//!    the selector accepts, and gives up at the root or at the first non-element;
//! 3) calls the handler with the delegate as receiver and an
//!    [`EventContext`](crate::delegate::EventContext) whose target is the delegate, keeping the
//!    native target and the attachment root available.
//!
//! Without a selector or validator the handler is bound directly to the target.
//!
//! ## Workflow
//!
//! 1) Register one binding with [`on_event`](crate::register::on_event), or the named form
//!    [`on_delegated_event`](crate::register::on_delegated_event).
//! 2) Register many with [`on_events`](crate::batch::on_events): every target crossed with every
//!    whitespace-separated event name.
//! 3) Tear down with a [`DetachHandle`](crate::register::DetachHandle), or by target or event
//!    name with [`MultiRegistration::off`](crate::batch::MultiRegistration::off).
//!
//! ## Example
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//!
//! use understory_delegate::adapters::memory::{Document, NodeRef};
//! use understory_delegate::args::{Callback, Options};
//! use understory_delegate::register::on_delegated_event;
//!
//! let doc = Document::new();
//! let list = doc.create_element("ul", None, &[]);
//! let item = doc.create_element("li", Some("first"), &["item"]);
//! let label = doc.create_element("span", None, &["label"]);
//! doc.root().append_child(&list);
//! list.append_child(&item);
//! item.append_child(&label);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//! on_delegated_event(
//!     list.clone(),
//!     "click",
//!     "li.item",
//!     Callback::handler(move |delegate: &NodeRef, cx, _| {
//!         log.borrow_mut()
//!             .push((delegate.element_id(), cx.original_target().cloned()));
//!     }),
//!     Options::new(),
//! )
//! .unwrap();
//!
//! label.dispatch("click");
//! assert_eq!(
//!     *seen.borrow(),
//!     vec![(Some("first".to_string()), Some(label.clone()))]
//! );
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `warn` for discarded arguments, `debug` for attach and
//! detach, `trace` for per-dispatch decisions. Install any subscriber to see them.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod args;
pub mod batch;
pub mod classify;
pub mod delegate;
pub mod error;
pub mod options;
pub mod register;
pub mod types;
