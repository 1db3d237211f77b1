//! # World Store
//!
//! Maps chunk coordinates to chunks for a square world of fixed size.
//!
//! ## Design
//!
//! - `DashMap` gives per-key atomicity without an outer lock
//! - Chunk contents are guarded by the chunk's own `RwLock`
//! - There is no cross-chunk transaction: an area read spanning several
//!   chunks may see some chunks before a tick and others after it
//! - Chunks are inserted once by the generator and never evicted

use dashmap::DashMap;

use crate::chunk::{Chunk, ChunkTiles};
use crate::coords::{ChunkCoord, LocalPos, WorldPos, CHUNK_SIZE};
use crate::error::{WorldError, WorldResult};
use crate::tile::{Tile, TileEdit};

/// The tile world.
pub struct World {
    /// World edge length in chunks.
    size_in_chunks: u8,
    /// Generated chunks.
    chunks: DashMap<ChunkCoord, Chunk>,
}

impl World {
    /// Creates an empty world. Every read fails until chunks are inserted.
    #[must_use]
    pub fn new(size_in_chunks: u8) -> Self {
        let capacity = usize::from(size_in_chunks) * usize::from(size_in_chunks);
        Self {
            size_in_chunks,
            chunks: DashMap::with_capacity(capacity),
        }
    }

    /// World edge length in chunks.
    #[inline]
    #[must_use]
    pub const fn size_in_chunks(&self) -> u8 {
        self.size_in_chunks
    }

    /// World edge length in tiles.
    #[inline]
    #[must_use]
    pub const fn size_in_tiles(&self) -> i32 {
        self.size_in_chunks as i32 * CHUNK_SIZE as i32
    }

    /// Number of chunks currently installed.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true once every chunk slot holds a chunk.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.chunk_count() == usize::from(self.size_in_chunks) * usize::from(self.size_in_chunks)
    }

    /// Returns true if the chunk coordinate has a slot in this world.
    #[inline]
    #[must_use]
    pub const fn is_in_world_bounds(&self, chunk: ChunkCoord) -> bool {
        chunk.is_in_world_bounds(self.size_in_chunks)
    }

    /// Returns true if the world position has a slot in this world.
    #[inline]
    #[must_use]
    pub const fn contains(&self, pos: WorldPos) -> bool {
        let edge = self.size_in_tiles();
        pos.x >= 0 && pos.y >= 0 && pos.x < edge && pos.y < edge
    }

    /// Splits a world position into chunk and local parts.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if the position has no chunk slot.
    pub fn locate(&self, pos: WorldPos) -> WorldResult<(ChunkCoord, LocalPos)> {
        if !self.contains(pos) {
            return Err(WorldError::OutOfBounds { x: pos.x, y: pos.y });
        }
        let chunk = pos.chunk().ok_or(WorldError::OutOfBounds { x: pos.x, y: pos.y })?;
        Ok((chunk, pos.local()))
    }

    /// Installs a generated chunk, replacing any previous one.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if the chunk's coordinate is outside the world.
    pub fn insert_chunk(&self, chunk: Chunk) -> WorldResult<()> {
        let coord = chunk.coord();
        if !self.is_in_world_bounds(coord) {
            let origin = coord.origin();
            return Err(WorldError::OutOfBounds {
                x: origin.x,
                y: origin.y,
            });
        }
        if self.chunks.insert(coord, chunk).is_some() {
            tracing::warn!(chunk_x = coord.x, chunk_y = coord.y, "chunk replaced");
        }
        Ok(())
    }

    fn with_chunk<R>(&self, pos: WorldPos, f: impl FnOnce(&Chunk, LocalPos) -> R) -> WorldResult<R> {
        let (coord, local) = self.locate(pos)?;
        let chunk = self.chunks.get(&coord).ok_or(WorldError::ChunkNotGenerated {
            chunk_x: coord.x,
            chunk_y: coord.y,
        })?;
        Ok(f(chunk.value(), local))
    }

    /// Reads a tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world, `ChunkNotGenerated` for an empty slot.
    pub fn get_tile(&self, pos: WorldPos) -> WorldResult<Tile> {
        self.with_chunk(pos, |chunk, local| chunk.get(local))
    }

    /// Overwrites a tile.
    ///
    /// # Errors
    ///
    /// Same contract as [`World::get_tile`].
    pub fn set_tile(&self, pos: WorldPos, tile: Tile) -> WorldResult<()> {
        self.with_chunk(pos, |chunk, local| chunk.set(local, tile))
    }

    /// Applies a partial edit and returns the stored result.
    ///
    /// # Errors
    ///
    /// Same contract as [`World::get_tile`].
    pub fn modify_tile(&self, pos: WorldPos, edit: TileEdit) -> WorldResult<Tile> {
        self.with_chunk(pos, |chunk, local| chunk.modify(local, edit))
    }

    /// Reads a tile, substituting the sentinel for anything unreadable.
    #[inline]
    #[must_use]
    pub fn tile_or_sentinel(&self, pos: WorldPos) -> Tile {
        self.get_tile(pos).unwrap_or(Tile::SENTINEL)
    }

    /// Reads a `width x height` rectangle starting at `top_left`.
    ///
    /// Row-major (`y * width + x`). Off-world cells are the sentinel.
    #[must_use]
    pub fn tiles_in_area(&self, top_left: WorldPos, width: usize, height: usize) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(width * height);
        for dy in 0..height {
            for dx in 0..width {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let pos = top_left.offset(dx as i32, dy as i32);
                tiles.push(self.tile_or_sentinel(pos));
            }
        }
        tiles
    }

    /// Returns true if the position exists and is walkable.
    #[must_use]
    pub fn is_walkable(&self, pos: WorldPos) -> bool {
        self.get_tile(pos).is_ok_and(Tile::is_walkable)
    }

    /// Finds the closest tile of `material`, searching rings of growing
    /// Chebyshev radius around `origin`.
    #[must_use]
    pub fn find_nearest_material(&self, origin: WorldPos, material: u8, max_radius: u32) -> Option<WorldPos> {
        let max_radius = i32::try_from(max_radius).unwrap_or(i32::MAX);
        for radius in 0..=max_radius {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    // Ring only; the inside was searched at a smaller radius.
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let pos = origin.offset(dx, dy);
                    if self.get_tile(pos).is_ok_and(|tile| tile.material == material) {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    /// Copies a whole chunk.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` or `ChunkNotGenerated`.
    pub fn chunk_snapshot(&self, coord: ChunkCoord) -> WorldResult<ChunkTiles> {
        self.with_chunk(coord.origin(), |chunk, _| chunk.snapshot())
    }

    /// ASCII dump of one chunk.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` or `ChunkNotGenerated`.
    pub fn render_ascii(&self, coord: ChunkCoord) -> WorldResult<String> {
        self.with_chunk(coord.origin(), |chunk, _| chunk.render_ascii())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(crate::coords::DEFAULT_WORLD_SIZE_IN_CHUNKS)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("size_in_chunks", &self.size_in_chunks)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::TILES_PER_CHUNK;

    fn filled_world(size: u8, tile: Tile) -> World {
        let world = World::new(size);
        for y in 0..size {
            for x in 0..size {
                world
                    .insert_chunk(Chunk::from_tiles(ChunkCoord::new(x, y), [tile; TILES_PER_CHUNK]))
                    .unwrap();
            }
        }
        world
    }

    #[test]
    fn test_empty_world_reads_fail() {
        let world = World::new(2);
        assert!(!world.is_generated());
        assert_eq!(
            world.get_tile(WorldPos::new(0, 0)),
            Err(WorldError::ChunkNotGenerated { chunk_x: 0, chunk_y: 0 })
        );
    }

    #[test]
    fn test_set_then_get() {
        let world = filled_world(2, Tile::new(1, 0, 1));
        assert!(world.is_generated());
        let pos = WorldPos::new(17, 31);
        world.set_tile(pos, Tile::new(9, 4, 16)).unwrap();
        assert_eq!(world.get_tile(pos), Ok(Tile::new(9, 4, 16)));
        assert_eq!(world.get_tile(WorldPos::new(16, 31)), Ok(Tile::new(1, 0, 1)));
    }

    #[test]
    fn test_out_of_bounds() {
        let world = filled_world(2, Tile::new(1, 0, 1));
        for pos in [
            WorldPos::new(-1, 0),
            WorldPos::new(0, -1),
            WorldPos::new(32, 0),
            WorldPos::new(0, 32),
            WorldPos::new(i32::MIN, i32::MAX),
        ] {
            assert_eq!(world.get_tile(pos), Err(WorldError::OutOfBounds { x: pos.x, y: pos.y }));
            assert_eq!(
                world.set_tile(pos, Tile::new(2, 0, 0)),
                Err(WorldError::OutOfBounds { x: pos.x, y: pos.y })
            );
        }
        // The wrapped local of (-1, 0) must not have been written.
        assert_eq!(world.get_tile(WorldPos::new(15, 0)), Ok(Tile::new(1, 0, 1)));
    }

    #[test]
    fn test_insert_outside_world_rejected() {
        let world = World::new(2);
        assert!(world.insert_chunk(Chunk::new(ChunkCoord::new(2, 0))).is_err());
        assert_eq!(world.chunk_count(), 0);
    }

    #[test]
    fn test_modify_tile() {
        let world = filled_world(1, Tile::new(1, 0, 1));
        let result = world
            .modify_tile(
                WorldPos::new(3, 3),
                TileEdit {
                    material: Some(2),
                    ..TileEdit::default()
                },
            )
            .unwrap();
        assert_eq!(result, Tile::new(2, 0, 1));
    }

    #[test]
    fn test_tiles_in_area_straddling_edge() {
        let world = filled_world(1, Tile::new(1, 0, 1));
        let tiles = world.tiles_in_area(WorldPos::new(14, -1), 4, 2);
        assert_eq!(tiles.len(), 8);
        // Row -1 is off-world.
        assert!(tiles[..4].iter().all(|t| t.is_sentinel()));
        // Row 0: x=14, 15 inside, 16, 17 outside.
        assert_eq!(&tiles[4..], &[Tile::new(1, 0, 1), Tile::new(1, 0, 1), Tile::SENTINEL, Tile::SENTINEL]);
    }

    #[test]
    fn test_walkable_and_nearest() {
        let world = filled_world(2, Tile::new(1, 0, 1));
        world.set_tile(WorldPos::new(10, 12), Tile::new(8, 0, 4)).unwrap();
        world.set_tile(WorldPos::new(20, 20), Tile::new(8, 0, 4)).unwrap();

        assert!(world.is_walkable(WorldPos::new(0, 0)));
        assert!(!world.is_walkable(WorldPos::new(10, 12)));
        assert!(!world.is_walkable(WorldPos::new(-5, 0)));

        assert_eq!(world.find_nearest_material(WorldPos::new(8, 8), 8, 10), Some(WorldPos::new(10, 12)));
        assert_eq!(world.find_nearest_material(WorldPos::new(8, 8), 8, 3), None);
        assert_eq!(world.find_nearest_material(WorldPos::new(10, 12), 8, 0), Some(WorldPos::new(10, 12)));
    }

    #[test]
    fn test_chunk_snapshot_and_ascii() {
        let world = filled_world(1, Tile::new(6, 0, 65));
        let snapshot = world.chunk_snapshot(ChunkCoord::new(0, 0)).unwrap();
        assert!(snapshot.iter().all(|t| *t == Tile::new(6, 0, 65)));
        let dump = world.render_ascii(ChunkCoord::new(0, 0)).unwrap();
        assert!(dump.lines().all(|line| line == "................"));
        assert!(world.render_ascii(ChunkCoord::new(1, 0)).is_err());
    }
}
