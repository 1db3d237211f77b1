//! # Chunks
//!
//! A chunk is a 16x16 grid of tiles and the synchronization unit of the store.
//!
//! ## Design
//!
//! - Tiles are stored row-major (`y * CHUNK_SIZE + x`) in a fixed array
//! - One `RwLock` per chunk; every tile read copies the 3-byte value out under
//!   the read guard, so a reader never sees half of a write
//! - Readers never hold the guard across calls

use parking_lot::RwLock;

use crate::coords::{ChunkCoord, LocalPos, CHUNK_SIZE, TILES_PER_CHUNK};
use crate::tile::{Tile, TileEdit};

/// Tile storage for one chunk.
pub type ChunkTiles = [Tile; TILES_PER_CHUNK];

/// A chunk of world data.
pub struct Chunk {
    /// Chunk position in the world.
    coord: ChunkCoord,
    /// Tile data (indexed as `y * CHUNK_SIZE + x`).
    tiles: RwLock<ChunkTiles>,
}

impl Chunk {
    /// Creates a chunk filled with the sentinel tile.
    #[must_use]
    pub fn new(coord: ChunkCoord) -> Self {
        Self::from_tiles(coord, [Tile::SENTINEL; TILES_PER_CHUNK])
    }

    /// Creates a chunk from already generated tiles.
    #[must_use]
    pub fn from_tiles(coord: ChunkCoord, tiles: ChunkTiles) -> Self {
        Self {
            coord,
            tiles: RwLock::new(tiles),
        }
    }

    /// Chunk position in the world.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Reads a tile.
    #[inline]
    #[must_use]
    pub fn get(&self, local: LocalPos) -> Tile {
        self.tiles.read()[local.index()]
    }

    /// Overwrites a tile.
    #[inline]
    pub fn set(&self, local: LocalPos, tile: Tile) {
        self.tiles.write()[local.index()] = tile;
    }

    /// Applies a partial edit and returns the resulting tile.
    #[inline]
    pub fn modify(&self, local: LocalPos, edit: TileEdit) -> Tile {
        let mut tiles = self.tiles.write();
        let slot = &mut tiles[local.index()];
        *slot = edit.apply(*slot);
        *slot
    }

    /// Copies every tile out under a single read guard.
    #[must_use]
    pub fn snapshot(&self) -> ChunkTiles {
        *self.tiles.read()
    }

    /// Renders the chunk as rows of debug glyphs.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        let tiles = self.snapshot();
        let mut out = String::with_capacity(TILES_PER_CHUNK + CHUNK_SIZE);
        for row in tiles.chunks_exact(CHUNK_SIZE) {
            out.extend(row.iter().map(|tile| tile.glyph()));
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk").field("coord", &self.coord).finish_non_exhaustive()
    }
}
