// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dom::{Dom, NodeId};
use understory_event_path::{BouncedPath, BuildOptions, PathScope};

/// A chain of `depth` shadow hosts, each slotting the next level into a
/// `slot` of its shadow tree, so every level adds a slotted context.
fn slotted_hosts(depth: usize) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let mut parent = dom.document();
    for _ in 0..depth {
        let host = dom.create_element("x-host");
        dom.append_child(parent, host).unwrap();
        let shadow = dom.attach_shadow(host).unwrap();
        let slot = dom.create_element("slot");
        dom.append_child(shadow, slot).unwrap();
        let light = dom.create_element("div");
        dom.append_child(host, light).unwrap();
        parent = light;
    }
    let leaf = dom.create_element("span");
    dom.append_child(parent, leaf).unwrap();
    (dom, leaf)
}

/// A plain light-DOM chain of `depth` elements.
fn flat_chain(depth: usize) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let mut parent = dom.document();
    for _ in 0..depth {
        let el = dom.create_element("div");
        dom.append_child(parent, el).unwrap();
        parent = el;
    }
    (dom, parent)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_path/build");
    for depth in [4usize, 16, 64] {
        group.throughput(Throughput::Elements(depth as u64));

        let (dom, leaf) = flat_chain(depth);
        group.bench_with_input(BenchmarkId::new("flat", depth), &depth, |b, _| {
            b.iter(|| {
                let path = BouncedPath::build(&dom, black_box(leaf), &BuildOptions::default());
                black_box(path.unwrap());
            });
        });

        let (dom, leaf) = slotted_hosts(depth);
        group.bench_with_input(BenchmarkId::new("slotted_bounce", depth), &depth, |b, _| {
            b.iter(|| {
                let path = BouncedPath::build(&dom, black_box(leaf), &BuildOptions::default());
                black_box(path.unwrap());
            });
        });

        let local = BuildOptions {
            root: None,
            scope: PathScope::Local,
        };
        group.bench_with_input(BenchmarkId::new("slotted_local", depth), &depth, |b, _| {
            b.iter(|| {
                let path = BouncedPath::build(&dom, black_box(leaf), &local);
                black_box(path.unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
