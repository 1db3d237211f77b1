//! Benchmark for the viewport path: extraction, encoding and frame decoding.
//!
//! Run with: cargo bench --package tessera_networking --bench protocol_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tessera_core::{EntityRegistry, World, WorldPos};
use tessera_networking::protocol::{decode_frame, encode_frame, MessageType, ViewportData, ViewportRequest};
use tessera_networking::ViewportExtractor;
use tessera_procedural::WorldGenerator;

fn extractor() -> ViewportExtractor {
    let world = World::new(8);
    let _ = WorldGenerator::new().generate(&world);
    let entities = EntityRegistry::new();
    for i in 0..64 {
        let _ = entities.register(WorldPos::new(20 + i % 16, 20 + i / 4), 1);
    }
    ViewportExtractor::new(Arc::new(world), Arc::new(entities))
}

fn benchmark_extract(c: &mut Criterion) {
    let extractor = extractor();
    let request = ViewportRequest::new(40.0, 36.0, 64.0, 48.0);

    let mut group = c.benchmark_group("viewport");
    group.throughput(Throughput::Elements(64 * 48));
    group.bench_function("extract_64x48", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&request))));
    });
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let data = extractor().extract(&ViewportRequest::new(40.0, 36.0, 64.0, 48.0));

    c.bench_function("viewport_encode_frame", |b| {
        b.iter(|| {
            let payload = black_box(&data).encode().unwrap_or_default();
            black_box(encode_frame(MessageType::ViewportData, &payload))
        });
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let data = extractor().extract(&ViewportRequest::new(40.0, 36.0, 255.0, 85.0));
    let payload = data.encode().unwrap_or_default();
    let frame = encode_frame(MessageType::ViewportData, &payload).unwrap_or_default();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("frame_and_viewport_255x85", |b| {
        b.iter(|| {
            let frame = decode_frame(black_box(&frame)).ok()?;
            ViewportData::decode(frame.payload).ok()
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_extract, benchmark_encode, benchmark_decode);
criterion_main!(benches);
