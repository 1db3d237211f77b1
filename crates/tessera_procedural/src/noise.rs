//! # Gradient Noise
//!
//! Lattice gradient noise with quintic fade interpolation.
//!
//! ## Guarantees
//!
//! - Deterministic: an integer lattice point always maps to the same gradient
//! - Continuous: values blend smoothly between neighbouring lattice points
//! - Bounded: a single octave stays in `[-1, 1]`
//!
//! The lattice is a 256-entry permutation shuffled by ChaCha8 from a
//! [`NoiseSeed`], so the same seed yields the same values on any platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoiseSeed(u64);

impl NoiseSeed {
    /// Seed baked into the server's world.
    pub const WORLD: Self = Self(0x7E55_E7A0_2D1F_0001);

    /// Creates a new seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for a given purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0 ^ purpose;
        hash = hash.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        hash ^= hash >> 31;
        Self(hash)
    }
}

impl Default for NoiseSeed {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Eight unit gradients at 45 degree steps.
const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (0.0, 1.0),
    (-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (-1.0, 0.0),
    (-std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
    (0.0, -1.0),
    (std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
];

/// Shuffled permutation, doubled so lookups never wrap.
struct PermutationTable {
    perm: [u8; 512],
}

impl PermutationTable {
    fn new(seed: NoiseSeed) -> Self {
        let mut perm = [0u8; 512];
        for (slot, value) in perm.iter_mut().zip(0..=u8::MAX) {
            *slot = value;
        }

        // Fisher-Yates
        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        for i in (1..256usize).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }

        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);

        Self { perm }
    }

    /// Hashes a lattice point to a gradient index.
    #[inline]
    fn hash(&self, ix: i32, iy: i32) -> usize {
        let x = (ix & 255) as usize;
        let y = (iy & 255) as usize;
        usize::from(self.perm[usize::from(self.perm[x]) + y]) & 7
    }
}

/// 2D gradient noise generator.
pub struct GradientNoise {
    table: PermutationTable,
}

impl GradientNoise {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn new(seed: NoiseSeed) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    /// Gradient vector at an integer lattice point.
    #[inline]
    #[must_use]
    pub fn gradient_at(&self, ix: i32, iy: i32) -> (f64, f64) {
        GRADIENTS[self.table.hash(ix, iy)]
    }

    #[inline]
    fn dot_grid_gradient(&self, ix: i32, iy: i32, x: f64, y: f64) -> f64 {
        let (gx, gy) = self.gradient_at(ix, iy);
        let dx = x - f64::from(ix);
        let dy = y - f64::from(iy);
        dx * gx + dy * gy
    }

    /// Samples one octave at `(x, y)`. Zero at every lattice point.
    ///
    /// # Returns
    ///
    /// A value in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = fast_floor(x);
        let y0 = fast_floor(y);
        let x1 = x0.wrapping_add(1);
        let y1 = y0.wrapping_add(1);

        let u = fade(x - f64::from(x0));
        let v = fade(y - f64::from(y0));

        let n00 = self.dot_grid_gradient(x0, y0, x, y);
        let n10 = self.dot_grid_gradient(x1, y0, x, y);
        let n01 = self.dot_grid_gradient(x0, y1, x, y);
        let n11 = self.dot_grid_gradient(x1, y1, x, y);

        let top = lerp(n00, n10, u);
        let bottom = lerp(n01, n11, u);

        // Unit gradients cap the raw value at sqrt(0.5).
        (lerp(top, bottom, v) * std::f64::consts::SQRT_2).clamp(-1.0, 1.0)
    }

    /// Fractal noise: `octaves` layers, each at `lacunarity` times the
    /// previous frequency and `persistence` times the previous amplitude.
    ///
    /// Normalized by the total amplitude, so the result stays in `[-1, 1]`.
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude == 0.0 {
            0.0
        } else {
            total / max_amplitude
        }
    }
}

/// Quintic smoothstep: zero first and second derivative at 0 and 1.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Floor to lattice index.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}
