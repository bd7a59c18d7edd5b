//! Benchmarks for pipeline parsing, construction and execution
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdb_rs::backend::{Program, SnapshotBuilder};
use sdb_rs::pipeline::{executor::print_stream, parse_line, stage, OutputBuffer, Session};
use std::sync::Arc;

const LIST: u64 = 0x1000;
const NODES: u64 = 0x10_0000;
const NODE_SIZE: u64 = 32;

/// A `list_t` at `LIST` holding `len` `struct item`s
fn list_program(len: u64) -> Arc<Program> {
    let mut b = SnapshotBuilder::new();
    b.define_struct(
        "list_node",
        16,
        &[("next", "struct list_node *", 0), ("prev", "struct list_node *", 8)],
    )
    .unwrap();
    b.typedef("list_node_t", "struct list_node").unwrap();
    b.define_struct(
        "list",
        32,
        &[
            ("list_size", "unsigned long", 0),
            ("list_offset", "unsigned long", 8),
            ("list_head", "list_node_t", 16),
        ],
    )
    .unwrap();
    b.typedef("list_t", "struct list").unwrap();
    b.define_struct(
        "item",
        NODE_SIZE,
        &[("value", "unsigned long", 0), ("link", "list_node_t", 8)],
    )
    .unwrap();
    b.symbol("items", "list_t", LIST).unwrap();

    let head = LIST + 16;
    b.write_u64(LIST, NODE_SIZE).write_u64(LIST + 8, 8);
    let mut prev = head;
    for i in 0..len {
        let node = NODES + i * NODE_SIZE;
        b.write_u64(node, i);
        b.write_u64(prev, node + 8);
        prev = node + 8;
    }
    b.write_u64(prev, head);
    b.build()
}

fn bench_parse(c: &mut Criterion) {
    let line = "addr items | list | cast struct item * | filter obj.value > 10 | member value ! sort -n";
    c.bench_function("parse_line", |b| b.iter(|| parse_line(black_box(line)).unwrap()));
}

fn bench_build(c: &mut Criterion) {
    let session = Session::new(list_program(1)).with_output(OutputBuffer::new());
    let stages = [
        "addr items",
        "list",
        "cast struct item *",
        "filter obj.value > 10",
        "member value",
    ];
    c.bench_function("build_pipeline", |b| {
        b.iter(|| session.build(black_box(&stages)).unwrap())
    });
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute_list_walk");

    for len in [100u64, 1_000, 10_000].iter() {
        let session = Session::new(list_program(*len)).with_output(OutputBuffer::new());
        let pipeline = session
            .build(&["addr items", "list", "cast struct item *", "member value"])
            .unwrap();
        group.throughput(Throughput::Elements(*len));
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| {
                let mut sink = std::io::sink();
                print_stream(pipeline.execute(stage::empty()), &mut sink).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_build, bench_execute);
criterion_main!(benches);
