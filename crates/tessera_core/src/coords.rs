//! # Coordinate Model
//!
//! Three coordinate spaces address the world:
//!
//! ```text
//! world (i32, tiles) ──div_euclid──▶ chunk (u8, chunks)
//!                    └─rem_euclid──▶ local (u8, 0..CHUNK_SIZE)
//! ```
//!
//! Bounds are always checked against the signed world coordinate. A negative
//! coordinate never aliases into chunk 0 through wrapping arithmetic.

/// Chunk width/height in tiles.
pub const CHUNK_SIZE: usize = 16;

/// Tiles per chunk.
pub const TILES_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Default world edge length in chunks.
pub const DEFAULT_WORLD_SIZE_IN_CHUNKS: u8 = 8;

/// Tile position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorldPos {
    /// X coordinate (tiles).
    pub x: i32,
    /// Y coordinate (tiles).
    pub y: i32,
}

impl WorldPos {
    /// Creates a new world position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the chunk holding this position.
    ///
    /// `None` when either component falls outside the unsigned byte range
    /// chunk coordinates live in (including any negative coordinate).
    #[inline]
    #[must_use]
    pub fn chunk(self) -> Option<ChunkCoord> {
        let cx = self.x.div_euclid(CHUNK_SIZE as i32);
        let cy = self.y.div_euclid(CHUNK_SIZE as i32);
        match (u8::try_from(cx), u8::try_from(cy)) {
            (Ok(x), Ok(y)) => Some(ChunkCoord::new(x, y)),
            _ => None,
        }
    }

    /// Returns the position inside its chunk.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn local(self) -> LocalPos {
        LocalPos {
            x: self.x.rem_euclid(CHUNK_SIZE as i32) as u8,
            y: self.y.rem_euclid(CHUNK_SIZE as i32) as u8,
        }
    }

    /// Rebuilds a world position from its chunk and local parts.
    #[inline]
    #[must_use]
    pub const fn from_parts(chunk: ChunkCoord, local: LocalPos) -> Self {
        let origin = chunk.origin();
        Self {
            x: origin.x + local.x as i32,
            y: origin.y + local.y as i32,
        }
    }

    /// Returns this position shifted by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Chebyshev distance to another position.
    #[inline]
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Chunk coordinate in the chunk grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not tiles).
    pub x: u8,
    /// Y coordinate (in chunks, not tiles).
    pub y: u8,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// World position of the chunk's top-left tile.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> WorldPos {
        WorldPos {
            x: self.x as i32 * CHUNK_SIZE as i32,
            y: self.y as i32 * CHUNK_SIZE as i32,
        }
    }

    /// Returns true if the chunk lies inside a square world of `size_in_chunks`.
    #[inline]
    #[must_use]
    pub const fn is_in_world_bounds(self, size_in_chunks: u8) -> bool {
        self.x < size_in_chunks && self.y < size_in_chunks
    }
}

/// Tile position inside a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    /// Local X (0-15).
    pub x: u8,
    /// Local Y (0-15).
    pub y: u8,
}

impl LocalPos {
    /// Creates a local position, rejecting anything outside the chunk.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(x: i32, y: i32) -> Option<Self> {
        if is_in_chunk_bounds(x, y) {
            Some(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    /// Row-major index into a chunk's tile array.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.y as usize * CHUNK_SIZE + self.x as usize
    }

    /// Inverse of [`LocalPos::index`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize) -> Self {
        Self {
            x: (index % CHUNK_SIZE) as u8,
            y: (index / CHUNK_SIZE) as u8,
        }
    }
}

/// Returns true if `(x, y)` is a valid local tile coordinate.
#[inline]
#[must_use]
pub const fn is_in_chunk_bounds(x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x < CHUNK_SIZE as i32 && y < CHUNK_SIZE as i32
}
