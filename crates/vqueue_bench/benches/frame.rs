//! Frame codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vqueue_bench::payloads;
use vqueue_core::frame;

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");
    for len in [16usize, 256, 4096] {
        let payload = payloads(1, len).pop().unwrap();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(format!("{len}b"), |b| {
            b.iter(|| frame::encode(black_box(&payload)).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");
    for len in [16usize, 256, 4096] {
        let payload = payloads(1, len).pop().unwrap();
        let encoded = frame::encode(&payload).unwrap();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(format!("{len}b"), |b| {
            b.iter(|| frame::decode(black_box(&encoded)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
