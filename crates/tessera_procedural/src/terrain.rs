//! # Terrain Elevation
//!
//! Blends three gradient-noise layers at different base frequencies and
//! sharpens the result with a power-law contrast curve.
//!
//! ```text
//! n = Σ wᵢ · octaved(x·fᵢ, y·fᵢ) / Σ wᵢ        n ∈ [-1, 1]
//! e = 2 · ((n + 1) / 2)^contrast − 1            e ∈ [-1, 1]
//! ```

use crate::noise::{GradientNoise, NoiseSeed};

/// One blended noise layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainLayer {
    /// Base frequency multiplier.
    pub frequency: f64,
    /// Blend weight.
    pub weight: f64,
}

/// Terrain shaping parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainConfig {
    /// The three layers, broadest first.
    pub layers: [TerrainLayer; 3],
    /// Octaves per layer.
    pub octaves: u32,
    /// Amplitude decay per octave.
    pub persistence: f64,
    /// Frequency growth per octave.
    pub lacunarity: f64,
    /// Exponent of the contrast curve. Above 1 pushes mid values down.
    pub contrast: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            layers: [
                TerrainLayer {
                    frequency: 1.0,
                    weight: 1.0,
                },
                TerrainLayer {
                    frequency: 2.0,
                    weight: 0.5,
                },
                TerrainLayer {
                    frequency: 4.0,
                    weight: 0.25,
                },
            ],
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            contrast: 1.2,
        }
    }
}

/// Elevation sampler.
pub struct TerrainNoise {
    /// One independent lattice per layer.
    layers: [GradientNoise; 3],
    config: TerrainConfig,
}

impl TerrainNoise {
    /// Creates a sampler with the default shape.
    #[must_use]
    pub fn new(seed: NoiseSeed) -> Self {
        Self::with_config(seed, TerrainConfig::default())
    }

    /// Creates a sampler with explicit parameters.
    #[must_use]
    pub fn with_config(seed: NoiseSeed, config: TerrainConfig) -> Self {
        Self {
            layers: [
                GradientNoise::new(seed.derive(1)),
                GradientNoise::new(seed.derive(2)),
                GradientNoise::new(seed.derive(3)),
            ],
            config,
        }
    }

    /// Shaping parameters.
    #[must_use]
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Elevation at `(x, y)` in noise space, in `[-1, 1]`.
    #[must_use]
    pub fn elevation(&self, x: f64, y: f64) -> f64 {
        let cfg = &self.config;
        let mut total = 0.0;
        let mut total_weight = 0.0;

        for (noise, layer) in self.layers.iter().zip(cfg.layers.iter()) {
            let value = noise.octaved(
                x * layer.frequency,
                y * layer.frequency,
                cfg.octaves,
                cfg.persistence,
                cfg.lacunarity,
            );
            total += value * layer.weight;
            total_weight += layer.weight;
        }

        let blended = if total_weight > 0.0 { total / total_weight } else { 0.0 };
        let normalized = ((blended + 1.0) * 0.5).clamp(0.0, 1.0);
        normalized.powf(cfg.contrast) * 2.0 - 1.0
    }
}
