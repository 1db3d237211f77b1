//! # World Generation Tests
//!
//! Whole-world properties: completeness, determinism and a sane terrain mix.

use tessera_core::{ChunkCoord, World, WorldPos};
use tessera_procedural::{ElevationBand, GeneratorMode, NoiseSeed, WorldGenerator};

/// Test: generation fills every chunk slot.
#[test]
fn test_generation_fills_world() {
    let world = World::new(4);
    assert!(world.get_tile(WorldPos::new(0, 0)).is_err());

    let report = WorldGenerator::new().generate(&world).expect("generation");
    assert_eq!(report.chunks, 16);
    assert!(world.is_generated());
    assert_eq!(report.band_counts.iter().sum::<usize>(), 16 * 256);

    let edge = world.size_in_tiles();
    for y in 0..edge {
        for x in 0..edge {
            assert!(world.get_tile(WorldPos::new(x, y)).is_ok());
        }
    }
}

/// Test: two runs produce byte-identical chunks.
#[test]
fn test_generation_is_deterministic() {
    let first = World::new(4);
    let second = World::new(4);
    WorldGenerator::new().generate(&first).expect("generation");
    WorldGenerator::new().generate(&second).expect("generation");

    for cy in 0..4 {
        for cx in 0..4 {
            let coord = ChunkCoord::new(cx, cy);
            let a = first.chunk_snapshot(coord).expect("generated");
            let b = second.chunk_snapshot(coord).expect("generated");
            assert_eq!(
                tile_bytes(&a),
                tile_bytes(&b),
                "chunk {coord:?} differs between runs"
            );
        }
    }
}

fn tile_bytes(tiles: &tessera_core::ChunkTiles) -> Vec<u8> {
    tiles
        .iter()
        .flat_map(|t| [t.material, t.surface, t.properties])
        .collect()
}

/// Test: a larger world has more than one kind of terrain.
#[test]
fn test_terrain_mix() {
    let world = World::new(16);
    let report = WorldGenerator::with_seed(NoiseSeed::new(42))
        .generate(&world)
        .expect("generation");

    for band in ElevationBand::ALL {
        println!("{band:?}: {}", report.count(band));
    }
    let present = ElevationBand::ALL.iter().filter(|&&band| report.count(band) > 0).count();
    assert!(present >= 2, "expected varied terrain, got {:?}", report.band_counts);
    assert!(report.count(ElevationBand::Plains) > 0, "no walkable plains at all");
}

/// Test: flat worlds are walkable everywhere.
#[test]
fn test_flat_world_is_walkable() {
    let world = World::new(2);
    WorldGenerator::new()
        .with_mode(GeneratorMode::Flat)
        .generate(&world)
        .expect("generation");
    let edge = world.size_in_tiles();
    for y in 0..edge {
        for x in 0..edge {
            assert!(world.is_walkable(WorldPos::new(x, y)));
        }
    }
}
