//! # Vernite Transport Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Envelope pack (Task) | < 1µs |
//! | Envelope unpack (Task) | < 1µs |
//! | Registry name lookup | < 100ns |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use vernite_schema::{communicator_model, BasicAction, Task};
use vernite_transport::{EnvelopeCodec, TypeRegistry};

fn codec() -> EnvelopeCodec {
    EnvelopeCodec::new(Arc::new(
        TypeRegistry::vernite().expect("catalog registry"),
    ))
}

fn sample_task(description_len: usize) -> Task {
    Task {
        id: 42,
        project_id: 7,
        status_id: 3,
        name: "Prepare sprint review".into(),
        description: "x".repeat(description_len),
        deadline: Some(1_760_000_000_000),
        action: Some(BasicAction::Updated as i32),
    }
}

fn bench_pack(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("envelope-pack");

    for size in [0usize, 256, 4096] {
        let task = sample_task(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("task", size), &task, |b, task| {
            b.iter(|| black_box(codec.pack(black_box(task)).expect("pack")))
        });
    }

    group.finish();
}

fn bench_unpack(c: &mut Criterion) {
    let codec = codec();
    let mut group = c.benchmark_group("envelope-unpack");

    for size in [0usize, 256, 4096] {
        let frame = codec.pack(&sample_task(size)).expect("pack");
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("task", size), &frame, |b, frame| {
            b.iter(|| black_box(codec.unpack(black_box(frame)).expect("unpack")))
        });
    }

    let nested = codec
        .pack(&communicator_model::Message {
            id: "M1".into(),
            content: "release is out".into(),
            ..Default::default()
        })
        .expect("pack");
    group.bench_function("nested-message", |b| {
        b.iter(|| black_box(codec.unpack(black_box(&nested)).expect("unpack")))
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let registry = TypeRegistry::vernite().expect("catalog registry");

    c.bench_function("registry-resolve-decoder", |b| {
        b.iter(|| black_box(registry.resolve_decoder(black_box("vernite.CommunicatorModel.User"))))
    });
    c.bench_function("registry-resolve-name", |b| {
        b.iter(|| black_box(registry.resolve_name_of::<Task>()))
    });
}

criterion_group!(benches, bench_pack, bench_unpack, bench_registry);
criterion_main!(benches);
