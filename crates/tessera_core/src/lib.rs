//! # TESSERA Core
//!
//! The memory-resident tile world the server is authoritative over.
//!
//! ## Architecture
//!
//! ```text
//! World ─── DashMap<ChunkCoord, Chunk>
//!             └── Chunk ─── RwLock<[Tile; 256]>
//!                             └── Tile { material, surface, properties }
//!
//! EntityRegistry ─── DashMap<EntityId, EntityState>
//! ```
//!
//! - Addressing goes world position → chunk coordinate + local position
//! - A chunk is the unit of generation and of locking
//! - Entities live beside the world, not inside it
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{World, WorldPos, Tile};
//!
//! let world = World::new(8);
//! // ... generator installs chunks ...
//! world.set_tile(WorldPos::new(10, 4), Tile::new(2, 0, 16))?;
//! let tile = world.get_tile(WorldPos::new(10, 4))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod coords;
pub mod entity;
pub mod error;
pub mod ids;
pub mod tile;
pub mod world;

pub use chunk::{Chunk, ChunkTiles};
pub use coords::{
    is_in_chunk_bounds, ChunkCoord, LocalPos, WorldPos, CHUNK_SIZE, DEFAULT_WORLD_SIZE_IN_CHUNKS,
    TILES_PER_CHUNK,
};
pub use entity::{EntityAction, EntityId, EntityRegistry, EntityState, Facing};
pub use error::{WorldError, WorldResult};
pub use ids::IdPool;
pub use tile::{Tile, TileEdit, TileMaterial, TileProperties, TileSurface};
pub use world::World;
