// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use understory_delegate::adapters::memory::{Document, NodeRef};
use understory_delegate::args::{Callback, Options};
use understory_delegate::register::on_delegated_event;

/// A chain of `depth` divs under a `ul.root`, with an `li.hit` inserted `hit_at` levels below
/// the root when given. Returns (root, leaf).
fn gen_chain(doc: &Document, depth: usize, hit_at: Option<usize>) -> (NodeRef, NodeRef) {
    let root = doc.create_element("ul", None, &["root"]);
    doc.root().append_child(&root);
    let mut parent = root.clone();
    for level in 0..depth {
        let node = if Some(level) == hit_at {
            doc.create_element("li", None, &["hit"])
        } else {
            doc.create_element("div", None, &[])
        };
        parent.append_child(&node);
        parent = node;
    }
    (root, parent)
}

fn bench_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("delegated_dispatch");
    for &depth in &[8usize, 32, 128] {
        let doc = Document::new();
        let (root, leaf) = gen_chain(&doc, depth, Some(0));
        let hits = Rc::new(Cell::new(0_u64));
        let counter = Rc::clone(&hits);
        let _reg = on_delegated_event(
            root,
            "click",
            "li.hit",
            Callback::handler(move |_: &NodeRef, _, _| counter.set(counter.get() + 1)),
            Options::new(),
        )
        .unwrap();
        group.bench_function(format!("match_near_root_depth{}", depth), |b| {
            b.iter(|| black_box(leaf.dispatch("click")));
        });

        let doc = Document::new();
        let (root, leaf) = gen_chain(&doc, depth, None);
        let _miss = on_delegated_event(
            root,
            "click",
            "li.hit",
            Callback::handler(|_: &NodeRef, _, _| {}),
            Options::new(),
        )
        .unwrap();
        group.bench_function(format!("miss_depth{}", depth), |b| {
            b.iter(|| black_box(leaf.dispatch("click")));
        });
        black_box(hits.get());
    }
    group.finish();
}

criterion_group!(benches, bench_depth);
criterion_main!(benches);
