// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dispatch::{DispatchOptions, Engine, Event, EventCx, Listener};
use understory_dom::{Dom, NodeId};
use understory_listener::ListenerOptions;

/// `depth` nested shadow hosts, each with `per_node` capture and bubble
/// listeners on the host and its shadow root.
fn engine(depth: usize, per_node: usize) -> (Engine<Dom>, NodeId, Rc<Cell<u64>>) {
    let mut dom = Dom::new();
    let mut parent = dom.document();
    let mut nodes = Vec::new();
    for _ in 0..depth {
        let host = dom.create_element("x-host");
        dom.append_child(parent, host).unwrap();
        let shadow = dom.attach_shadow(host).unwrap();
        nodes.extend([host, shadow]);
        parent = shadow;
    }
    let leaf = dom.create_element("span");
    dom.append_child(parent, leaf).unwrap();
    nodes.push(leaf);

    let mut engine = Engine::new(dom);
    let hits = Rc::new(Cell::new(0_u64));
    for node in nodes {
        for _ in 0..per_node {
            let hits = hits.clone();
            let listener = Listener::new(move |_: &mut EventCx<'_, Dom>| {
                hits.set(hits.get() + 1);
                Ok(())
            });
            for options in [ListenerOptions::CAPTURE, ListenerOptions::empty()] {
                engine
                    .add_event_listener(node, "ping", &listener, options)
                    .unwrap();
            }
        }
    }
    (engine, leaf, hits)
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/sync");
    for depth in [2usize, 8, 32] {
        let (mut engine, leaf, hits) = engine(depth, 4);
        group.throughput(Throughput::Elements(depth as u64));

        group.bench_function(BenchmarkId::new("composed", depth), |b| {
            b.iter(|| {
                let event = Event::new("ping").with_bubbles(true).with_composed(true);
                let outcome = engine.dispatch_event(black_box(leaf), event, DispatchOptions::default());
                black_box(outcome.unwrap());
            });
        });

        group.bench_function(BenchmarkId::new("bounce", depth), |b| {
            b.iter(|| {
                let event = Event::new("ping").with_bubbles(true);
                let outcome = engine.dispatch_event(black_box(leaf), event, DispatchOptions::default());
                black_box(outcome.unwrap());
            });
        });
        black_box(hits.get());
    }
    group.finish();
}

fn bench_async(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/async");
    for depth in [2usize, 8, 32] {
        let (mut engine, leaf, _) = engine(depth, 4);
        group.bench_function(BenchmarkId::new("run_until_idle", depth), |b| {
            b.iter(|| {
                let event = Event::new("ping").with_bubbles(true).with_composed(true);
                engine
                    .dispatch_event(black_box(leaf), event, DispatchOptions::asynchronous())
                    .unwrap();
                black_box(engine.run_until_idle());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_async);
criterion_main!(benches);
