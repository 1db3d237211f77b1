//! # World Error Types
//!
//! All errors that can occur when addressing the tile store.

use thiserror::Error;

/// Errors that can occur in the world store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// The world coordinate has no backing chunk slot.
    #[error("coordinate ({x}, {y}) is outside the world")]
    OutOfBounds {
        /// World X (tiles).
        x: i32,
        /// World Y (tiles).
        y: i32,
    },

    /// The chunk slot exists but has not been generated yet.
    #[error("chunk ({chunk_x}, {chunk_y}) has not been generated")]
    ChunkNotGenerated {
        /// Chunk X.
        chunk_x: u8,
        /// Chunk Y.
        chunk_y: u8,
    },

    /// Local tile coordinate outside `[0, CHUNK_SIZE)`.
    #[error("local coordinate ({x}, {y}) is outside the chunk")]
    LocalOutOfRange {
        /// Local X.
        x: i32,
        /// Local Y.
        y: i32,
    },

    /// Every 32-bit wire id is in use.
    #[error("entity wire id pool exhausted")]
    IdPoolExhausted,
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
