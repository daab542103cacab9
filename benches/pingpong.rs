//! Round-trip latency of the accelerated slot handoff vs the direct call.
//!
//! The accelerated number is only meaningful on a multi-core machine with
//! the worker spinning on its own core.

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use fastcall::{Requester, Server, SlotTable, Token};

fn pin_to_core(core_id: usize) {
    core_affinity::set_for_current(core_affinity::CoreId { id: core_id });
}

fn resolve(request: u64) -> u64 {
    request.wrapping_mul(0x9e37_79b9).rotate_left(13)
}

fn bench_pingpong(c: &mut Criterion) {
    let mut group = c.benchmark_group("pingpong");
    group.throughput(Throughput::Elements(1));

    group.bench_function("direct", |b| {
        b.iter(|| resolve(black_box(7)));
    });

    group.bench_function("accelerated", |b| {
        let table = Arc::new(SlotTable::new(1).unwrap());
        let worker = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                pin_to_core(1);
                Server::new(table).run(resolve);
            })
        };
        pin_to_core(0);
        let requester = Requester::new(Arc::clone(&table), Token::new(0)).unwrap();

        b.iter(|| requester.call(black_box(7)).unwrap());

        table.shutdown();
        worker.join().unwrap();
    });

    group.finish();
}

criterion_group!(benches, bench_pingpong);
criterion_main!(benches);
