// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegation basics.
//!
//! One listener on a list serves every item, including items added later.
//! Clicks on a label element inside an item are remapped to the item. Clicks on
//! bare text find no delegate, because text is not eligible for matching, and
//! neither do clicks on the list itself.
//!
//! Run:
//! - `cargo run -p understory_delegate_demos --example delegate_basics`

use understory_delegate::adapters::memory::{Document, NodeRef};
use understory_delegate::args::{Arg, Callback, Options};
use understory_delegate::register::on_event;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let doc = Document::new();
    let list = doc.create_element("ul", Some("menu"), &[]);
    doc.root().append_child(&list);
    let mut labels = Vec::new();
    for name in ["open", "save"] {
        let item = doc.create_element("li", Some(name), &["item"]);
        let label = doc.create_element("span", None, &["label"]);
        label.append_child(&doc.create_text(name));
        item.append_child(&label);
        list.append_child(&item);
        labels.push(label);
    }

    // Arguments in any order: the target, then the handler, then two texts
    // (event name first, selector second).
    let reg = on_event(vec![
        Arg::target(list.clone()),
        Callback::handler(|item: &NodeRef, cx, spec| {
            println!(
                "{} on {:?} (native target {:?}, root {:?})",
                spec.event_name(),
                item.element_id(),
                cx.native_target(),
                cx.capture_target(),
            );
        })
        .into(),
        "click".into(),
        "li.item".into(),
        Options::new().detach(true).into(),
    ])
    .expect("list can root delegation");

    println!("== Click on labels inside existing items ==");
    for label in &labels {
        label.dispatch("click");
    }

    println!("== Click inside an item added after registration ==");
    let late = doc.create_element("li", Some("quit"), &["item"]);
    list.append_child(&late);
    late.dispatch("click");

    println!("== Click on bare text inside an item (no delegate) ==");
    let note = doc.create_text("shortcut");
    late.append_child(&note);
    note.dispatch("click");

    println!("== Click on the list itself (no delegate) ==");
    list.dispatch("click");

    if let Some(handle) = reg.detach_handle() {
        handle.detach();
    }
    println!("== After detach: {} listener(s) ==", list.listener_count("click"));
    late.dispatch("click");
}
