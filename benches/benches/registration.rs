// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_delegate::adapters::memory::{Document, NodeRef};
use understory_delegate::args::{Arg, Callback, Options};
use understory_delegate::batch::{RegistryKey, on_events};
use understory_delegate::register::on_event;

fn gen_buttons(doc: &Document, n: usize) -> Vec<NodeRef> {
    let root = doc.root();
    (0..n)
        .map(|_| {
            let b = doc.create_element("button", None, &["action"]);
            root.append_child(&b);
            b
        })
        .collect()
}

fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_event");
    let doc = Document::new();
    let list = doc.create_element("ul", None, &[]);
    doc.root().append_child(&list);
    let handler = Callback::handler(|_: &NodeRef, _, _| {});

    group.bench_function("direct", |b| {
        b.iter(|| {
            let reg = on_event(vec![
                Arg::target(list.clone()),
                "click".into(),
                handler.clone().into(),
                Options::new().detach(true).into(),
            ])
            .unwrap();
            black_box(reg.detach_handle().map(|h| h.detach()));
        });
    });
    group.bench_function("delegated_shuffled", |b| {
        b.iter(|| {
            let reg = on_event(vec![
                handler.clone().into(),
                Options::new().detach(true).capture(true).into(),
                "click".into(),
                Arg::target(list.clone()),
                "li.item".into(),
            ])
            .unwrap();
            black_box(reg.detach_handle().map(|h| h.detach()));
        });
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_events");
    for &n in &[16usize, 64, 256] {
        let doc = Document::new();
        let buttons = gen_buttons(&doc, n);
        let handler = Callback::handler(|_: &NodeRef, _, _| {});
        group.throughput(Throughput::Elements((n * 3) as u64));
        group.bench_function(format!("register_off_all_n{}", n), |b| {
            b.iter(|| {
                let batch = on_events(vec![
                    Arg::targets(buttons.iter().cloned()),
                    "click keydown focus".into(),
                    handler.clone().into(),
                ])
                .unwrap();
                black_box(batch.off_all());
            });
        });
        group.bench_function(format!("off_by_event_n{}", n), |b| {
            b.iter_batched(
                || {
                    on_events(vec![
                        Arg::targets(buttons.iter().cloned()),
                        "click keydown focus".into(),
                        handler.clone().into(),
                    ])
                    .unwrap()
                },
                |batch| {
                    let removed = batch.off([RegistryKey::event("keydown")]);
                    black_box(removed);
                    batch.off_all();
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single, bench_batch);
criterion_main!(benches);
