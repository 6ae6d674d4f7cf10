// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch registration and selective teardown.
//!
//! Registers every target × event name pair in one call, then detaches by
//! event name, by target, and finally everything.
//!
//! Run:
//! - `cargo run -p understory_delegate_demos --example batch_teardown`

use understory_delegate::adapters::memory::{Document, NodeRef};
use understory_delegate::args::{Arg, Callback};
use understory_delegate::batch::{RegistryKey, on_events};

fn report(buttons: &[NodeRef]) {
    for b in buttons {
        println!(
            "  {:?}: click={} keydown={}",
            b.element_id(),
            b.listener_count("click"),
            b.listener_count("keydown"),
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let doc = Document::new();
    let buttons: Vec<NodeRef> = ["ok", "cancel", "help"]
        .into_iter()
        .map(|id| {
            let b = doc.create_element("button", Some(id), &[]);
            doc.root().append_child(&b);
            b
        })
        .collect();

    let batch = on_events(vec![
        Arg::targets(buttons.iter().cloned()),
        "  click   keydown click ".into(),
        Callback::handler(|b: &NodeRef, cx, _| {
            println!("  {} on {:?}", cx.event_type(), b.element_id());
        })
        .into(),
    ])
    .expect("buttons accept direct listeners");

    println!("== Registered {} bindings ==", batch.len());
    report(&buttons);
    buttons[0].dispatch("click");

    let n = batch.off([RegistryKey::event("keydown")]);
    println!("== off(keydown) detached {n} ==");
    report(&buttons);

    let n = batch.off([RegistryKey::target(&buttons[1])]);
    println!("== off(cancel) detached {n} ==");
    report(&buttons);

    let n = batch.off_all();
    println!("== off_all detached {n}, {} active ==", batch.active_len());
    report(&buttons);
}
