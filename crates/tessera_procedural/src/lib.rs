//! # TESSERA Procedural Generation
//!
//! Deterministic terrain for the tile world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: the same seed always produces the same world
//! 2. **Chunked**: the world is generated one chunk at a time, in raster order
//! 3. **One-shot**: generation runs once before the simulation starts
//!
//! ## Core Components
//!
//! - `GradientNoise`: lattice gradient noise with fractal octaves
//! - `TerrainNoise`: three-layer blend with a contrast curve
//! - `WorldGenerator`: elevation bands to tiles, installed into a `World`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::World;
//! use tessera_procedural::WorldGenerator;
//!
//! let world = World::new(8);
//! let report = WorldGenerator::new().generate(&world)?;
//! assert!(world.is_generated());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod generator;
pub mod noise;
pub mod terrain;

pub use generator::{ElevationBand, GenerationReport, GeneratorMode, WorldGenerator, BASE_SCALE};
pub use noise::{GradientNoise, NoiseSeed};
pub use terrain::{TerrainConfig, TerrainLayer, TerrainNoise};
