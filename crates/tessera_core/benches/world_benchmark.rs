//! Benchmark for tile store access.
//!
//! Run with: cargo bench --package tessera_core --bench world_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tessera_core::{Chunk, ChunkCoord, Tile, World, WorldPos, TILES_PER_CHUNK};

fn filled_world() -> World {
    let world = World::new(8);
    for y in 0..8 {
        for x in 0..8 {
            let _ = world.insert_chunk(Chunk::from_tiles(ChunkCoord::new(x, y), [Tile::new(1, 0, 1); TILES_PER_CHUNK]));
        }
    }
    world
}

fn benchmark_get_tile(c: &mut Criterion) {
    let world = filled_world();

    c.bench_function("get_tile", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = (i + 7) % 128;
            black_box(world.get_tile(black_box(WorldPos::new(i, 127 - i))))
        });
    });
}

fn benchmark_area_read(c: &mut Criterion) {
    let world = filled_world();

    let mut group = c.benchmark_group("area_read");
    group.throughput(Throughput::Elements(64 * 48));
    group.bench_function("tiles_in_area_64x48", |b| {
        b.iter(|| black_box(world.tiles_in_area(black_box(WorldPos::new(-8, 20)), 64, 48)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_get_tile, benchmark_area_read);
criterion_main!(benches);
