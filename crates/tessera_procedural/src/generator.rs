//! # World Generator
//!
//! Fills every chunk of a [`World`] from terrain elevation.
//!
//! ## Pipeline
//!
//! ```text
//! (cx, cy) raster ─▶ (lx, ly) raster ─▶ world (wx, wy) ─▶ × scale
//!     ─▶ TerrainNoise::elevation ─▶ ElevationBand ─▶ Tile ─▶ chunk ─▶ World
//! ```
//!
//! Surfaces always start as `NONE`; overlays are applied later by other
//! systems. Generation runs once, synchronously, before the tick loop.

use std::time::Instant;

use tessera_core::{
    Chunk, ChunkCoord, LocalPos, Tile, TileMaterial, TileProperties, TileSurface, World, WorldPos,
    WorldResult, TILES_PER_CHUNK,
};

use crate::noise::NoiseSeed;
use crate::terrain::TerrainNoise;

/// Elevation thresholds, ascending.
pub mod thresholds {
    /// Below this: water.
    pub const WATER: f64 = -0.3;
    /// Below this: beach.
    pub const BEACH: f64 = -0.2;
    /// Below this: plains.
    pub const MOUNTAIN: f64 = 0.5;
    /// Below this: mountain. At or above: peak.
    pub const PEAK: f64 = 0.7;
}

/// World-tile to noise-space scale.
pub const BASE_SCALE: f64 = 0.05;

/// Terrain class picked from elevation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElevationBand {
    /// Deep water.
    Water,
    /// Shoreline sand.
    Beach,
    /// Regular walkable ground.
    Plains,
    /// Rock, breakable.
    Mountain,
    /// High rock, blocks everything.
    Peak,
}

impl ElevationBand {
    /// All bands, lowest first.
    pub const ALL: [Self; 5] = [Self::Water, Self::Beach, Self::Plains, Self::Mountain, Self::Peak];

    /// Classifies an elevation value.
    #[must_use]
    pub fn classify(elevation: f64) -> Self {
        if elevation < thresholds::WATER {
            Self::Water
        } else if elevation < thresholds::BEACH {
            Self::Beach
        } else if elevation < thresholds::MOUNTAIN {
            Self::Plains
        } else if elevation < thresholds::PEAK {
            Self::Mountain
        } else {
            Self::Peak
        }
    }

    /// Freshly generated tile for this band.
    #[must_use]
    pub const fn tile(self) -> Tile {
        let (material, properties) = match self {
            Self::Water => (
                TileMaterial::Water,
                TileProperties::TRANSPARENT.union(TileProperties::BLOCKS_PROJECTILES),
            ),
            Self::Beach => (
                TileMaterial::Sand,
                TileProperties::WALKABLE.union(TileProperties::BREAKABLE),
            ),
            Self::Plains => (
                TileMaterial::Dirt,
                TileProperties::WALKABLE
                    .union(TileProperties::SOLID)
                    .union(TileProperties::BREAKABLE),
            ),
            Self::Mountain => (
                TileMaterial::Stone,
                TileProperties::SOLID
                    .union(TileProperties::BLOCKS_LIGHT)
                    .union(TileProperties::BREAKABLE),
            ),
            Self::Peak => (
                TileMaterial::Stone,
                TileProperties::SOLID
                    .union(TileProperties::BLOCKS_LIGHT)
                    .union(TileProperties::BLOCKS_PROJECTILES),
            ),
        };
        Tile::typed(material, TileSurface::NONE, properties)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// How tiles are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneratorMode {
    /// Noise-driven terrain.
    #[default]
    Terrain,
    /// Walkable dirt everywhere. Useful for tests and debugging.
    Flat,
}

/// Summary of one generation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Chunks installed.
    pub chunks: usize,
    /// Tile count per band, indexed like [`ElevationBand::ALL`].
    pub band_counts: [usize; 5],
    /// Wall time in milliseconds.
    pub elapsed_ms: u64,
}

impl GenerationReport {
    /// Tiles generated in `band`.
    #[must_use]
    pub const fn count(&self, band: ElevationBand) -> usize {
        self.band_counts[band.slot()]
    }
}

/// Deterministic world generator.
pub struct WorldGenerator {
    terrain: TerrainNoise,
    mode: GeneratorMode,
    scale: f64,
}

impl WorldGenerator {
    /// Generator for the server's fixed world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(NoiseSeed::WORLD)
    }

    /// Generator with an explicit seed.
    #[must_use]
    pub fn with_seed(seed: NoiseSeed) -> Self {
        Self {
            terrain: TerrainNoise::new(seed),
            mode: GeneratorMode::Terrain,
            scale: BASE_SCALE,
        }
    }

    /// Switches the tile source.
    #[must_use]
    pub const fn with_mode(mut self, mode: GeneratorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> GeneratorMode {
        self.mode
    }

    /// Band for a world tile.
    #[must_use]
    pub fn band_at(&self, pos: WorldPos) -> ElevationBand {
        match self.mode {
            GeneratorMode::Flat => ElevationBand::Plains,
            GeneratorMode::Terrain => {
                let elevation = self
                    .terrain
                    .elevation(f64::from(pos.x) * self.scale, f64::from(pos.y) * self.scale);
                ElevationBand::classify(elevation)
            }
        }
    }

    /// Tile for a world position.
    #[must_use]
    pub fn tile_at(&self, pos: WorldPos) -> Tile {
        self.tile_for(self.band_at(pos))
    }

    const fn tile_for(&self, band: ElevationBand) -> Tile {
        match self.mode {
            GeneratorMode::Flat => Tile::typed(
                TileMaterial::Dirt,
                TileSurface::NONE,
                TileProperties::WALKABLE.union(TileProperties::BREAKABLE),
            ),
            GeneratorMode::Terrain => band.tile(),
        }
    }

    /// Builds one chunk, recording band counts into `counts`.
    fn build_chunk(&self, coord: ChunkCoord, counts: &mut [usize; 5]) -> Chunk {
        let mut tiles = [Tile::SENTINEL; TILES_PER_CHUNK];
        for (index, slot) in tiles.iter_mut().enumerate() {
            let pos = WorldPos::from_parts(coord, LocalPos::from_index(index));
            let band = self.band_at(pos);
            counts[band.slot()] += 1;
            *slot = self.tile_for(band);
        }
        Chunk::from_tiles(coord, tiles)
    }

    /// Builds one chunk without installing it.
    #[must_use]
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Chunk {
        let mut counts = [0; 5];
        self.build_chunk(coord, &mut counts)
    }

    /// Generates and installs every chunk of `world`, row by row.
    ///
    /// # Errors
    ///
    /// Propagates store errors; none are expected for a well-formed world.
    pub fn generate(&self, world: &World) -> WorldResult<GenerationReport> {
        let start = Instant::now();
        let size = world.size_in_chunks();
        let mut report = GenerationReport::default();

        tracing::info!(size_in_chunks = size, mode = ?self.mode, "generating world");

        for cy in 0..size {
            for cx in 0..size {
                let chunk = self.build_chunk(ChunkCoord::new(cx, cy), &mut report.band_counts);
                world.insert_chunk(chunk)?;
                report.chunks += 1;
            }
        }

        report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            chunks = report.chunks,
            water = report.count(ElevationBand::Water),
            beach = report.count(ElevationBand::Beach),
            plains = report.count(ElevationBand::Plains),
            mountain = report.count(ElevationBand::Mountain),
            peak = report.count(ElevationBand::Peak),
            elapsed_ms = report.elapsed_ms,
            "world generated"
        );
        Ok(report)
    }
}

impl Default for WorldGenerator {
    fn default() -> Self {
        Self::new()
    }
}
