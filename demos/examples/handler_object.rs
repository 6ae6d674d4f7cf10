// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler objects, validators, `once` and abort signals.
//!
//! Run:
//! - `cargo run -p understory_delegate_demos --example handler_object`

use std::cell::Cell;
use std::rc::Rc;

use understory_delegate::adapters::memory::{Document, NodeRef};
use understory_delegate::args::{Arg, Callback, HandleEvent, Options};
use understory_delegate::delegate::EventContext;
use understory_delegate::options::AbortController;
use understory_delegate::register::{RegistrationSpec, on_event};

#[derive(Default)]
struct Counter {
    hits: Cell<u32>,
}

impl HandleEvent<NodeRef> for Counter {
    fn handle_event(&self, cx: &EventContext<'_, NodeRef>, spec: &RegistrationSpec<NodeRef>) {
        self.hits.set(self.hits.get() + 1);
        println!(
            "  counter: {} #{} on {:?}",
            spec.event_name(),
            self.hits.get(),
            cx.target().element_id()
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let doc = Document::new();
    let form = doc.create_element("form", None, &[]);
    let field = doc.create_element("input", Some("name"), &["field"]);
    doc.root().append_child(&form);
    form.append_child(&field);

    println!("== Handler object behind a validator ==");
    let enabled = Rc::new(Cell::new(true));
    let gate = Rc::clone(&enabled);
    let counter = Rc::new(Counter::default());
    on_event(vec![
        Arg::target(form.clone()),
        "input".into(),
        ".field".into(),
        Arg::HandlerObject(counter.clone()),
        Options::new()
            .validator(Callback::new(move |_: &NodeRef, _, _| gate.get()))
            .into(),
    ])
    .expect("form can root delegation");
    field.dispatch("input");
    enabled.set(false);
    field.dispatch("input");
    println!("  hits after veto: {}", counter.hits.get());

    println!("== once + abort signal ==");
    let controller = AbortController::new();
    on_event(vec![
        Arg::target(field.clone()),
        "focus".into(),
        Callback::handler(|_: &NodeRef, _, _| println!("  focused (once)")).into(),
        Options::new().once(true).signal(controller.signal()).into(),
    ])
    .expect("direct bind");
    on_event(vec![
        Arg::target(field.clone()),
        "blur".into(),
        Callback::handler(|_: &NodeRef, _, _| println!("  blurred")).into(),
        Options::new().signal(controller.signal()).into(),
    ])
    .expect("direct bind");
    field.dispatch("focus");
    field.dispatch("focus");
    field.dispatch("blur");
    controller.abort();
    field.dispatch("blur");
    println!(
        "  listeners left: focus={} blur={}",
        field.listener_count("focus"),
        field.listener_count("blur")
    );
}
