//! # Tiles
//!
//! A tile is a 3-byte value: a material id, a surface overlay bit set and a
//! property bit set. Tiles live by value inside their chunk.
//!
//! Unknown bit patterns are stored and returned untouched; the store never
//! normalizes what a writer put in.

use std::ops::{BitOr, BitOrAssign};

use bytemuck::{Pod, Zeroable};

/// Terrain material ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TileMaterial {
    /// Nothing / off-world sentinel.
    None = 0,
    /// Dirt.
    Dirt = 1,
    /// Stone.
    Stone = 2,
    /// Wood.
    Wood = 3,
    /// Metal.
    Metal = 4,
    /// Ice.
    Ice = 5,
    /// Sand.
    Sand = 6,
    /// Water.
    Water = 8,
    /// Lava.
    Lava = 9,
    /// Snow.
    Snow = 10,
    /// Blood.
    Blood = 12,
    /// Mud.
    Mud = 13,
}

impl TileMaterial {
    /// Parses a raw material byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Dirt,
            2 => Self::Stone,
            3 => Self::Wood,
            4 => Self::Metal,
            5 => Self::Ice,
            6 => Self::Sand,
            8 => Self::Water,
            9 => Self::Lava,
            10 => Self::Snow,
            12 => Self::Blood,
            13 => Self::Mud,
            _ => return None,
        })
    }

    /// Debug glyph used by ASCII chunk dumps.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Water => '~',
            Self::Sand => '.',
            Self::Dirt => ',',
            Self::Stone => '#',
            _ => '?',
        }
    }
}

macro_rules! tile_flags {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$fmeta:meta])* $flag:ident = $bit:expr, )* }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name(u8);

        impl $name {
            /// No flags set.
            pub const NONE: Self = Self(0);
            $( $(#[$fmeta])* pub const $flag: Self = Self($bit); )*

            /// Wraps raw bits.
            #[inline]
            #[must_use]
            pub const fn from_bits(bits: u8) -> Self {
                Self(bits)
            }

            /// Raw bits.
            #[inline]
            #[must_use]
            pub const fn bits(self) -> u8 {
                self.0
            }

            /// Returns true if every flag in `other` is set.
            #[inline]
            #[must_use]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            /// Returns true if no flag is set.
            #[inline]
            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Union of two flag sets.
            #[inline]
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Clears the flags in `other`.
            #[inline]
            #[must_use]
            pub const fn without(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = self.union(rhs);
            }
        }
    };
}

tile_flags! {
    /// Dynamic surface overlay. Always `NONE` right after generation.
    TileSurface {
        /// Short grass.
        SHORT_GRASS = 1,
        /// Snow cover.
        SNOW = 2,
        /// Moss.
        MOSS = 4,
        /// Shallow water.
        WATER = 8,
        /// Blood.
        BLOOD = 16,
        /// Mud.
        MUD = 32,
        /// Tall grass.
        TALL_GRASS = 64,
        /// Flowers.
        FLOWERS = 128,
    }
}

tile_flags! {
    /// Static tile properties.
    TileProperties {
        /// Entities can stand here.
        WALKABLE = 1,
        /// Stops light.
        BLOCKS_LIGHT = 2,
        /// Can be seen through.
        TRANSPARENT = 4,
        /// Stops projectiles.
        BLOCKS_PROJECTILES = 8,
        /// Collides.
        SOLID = 16,
        /// Can be interacted with.
        INTERACTIVE = 32,
        /// Can be broken.
        BREAKABLE = 64,
        /// Reserved.
        RESERVED = 128,
    }
}

/// A single tile.
///
/// Layout matches the wire record: material, surface, properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Tile {
    /// Material id (see [`TileMaterial`]).
    pub material: u8,
    /// Surface flags (see [`TileSurface`]).
    pub surface: u8,
    /// Property flags (see [`TileProperties`]).
    pub properties: u8,
}

impl Tile {
    /// Off-world sentinel: material 0, no flags.
    pub const SENTINEL: Self = Self {
        material: 0,
        surface: 0,
        properties: 0,
    };

    /// Creates a tile from raw bytes.
    #[inline]
    #[must_use]
    pub const fn new(material: u8, surface: u8, properties: u8) -> Self {
        Self {
            material,
            surface,
            properties,
        }
    }

    /// Creates a tile from typed parts.
    #[inline]
    #[must_use]
    pub const fn typed(material: TileMaterial, surface: TileSurface, properties: TileProperties) -> Self {
        Self {
            material: material as u8,
            surface: surface.bits(),
            properties: properties.bits(),
        }
    }

    /// Typed material, `None` for unknown ids.
    #[inline]
    #[must_use]
    pub const fn material(self) -> Option<TileMaterial> {
        TileMaterial::from_u8(self.material)
    }

    /// Surface flags.
    #[inline]
    #[must_use]
    pub const fn surface(self) -> TileSurface {
        TileSurface::from_bits(self.surface)
    }

    /// Property flags.
    #[inline]
    #[must_use]
    pub const fn properties(self) -> TileProperties {
        TileProperties::from_bits(self.properties)
    }

    /// Returns true for the off-world sentinel material.
    #[inline]
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.material == 0
    }

    /// Returns true if entities can stand here.
    #[inline]
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        self.properties().contains(TileProperties::WALKABLE)
    }

    /// Returns true if the tile collides.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        self.properties().contains(TileProperties::SOLID)
    }

    /// Returns true if the tile can be seen through.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.properties().contains(TileProperties::TRANSPARENT)
    }

    /// Returns true if the tile can be broken.
    #[inline]
    #[must_use]
    pub const fn is_breakable(self) -> bool {
        self.properties().contains(TileProperties::BREAKABLE)
    }

    /// Returns true if the tile stops light.
    #[inline]
    #[must_use]
    pub const fn blocks_light(self) -> bool {
        self.properties().contains(TileProperties::BLOCKS_LIGHT)
    }

    /// Returns true if the tile stops projectiles.
    #[inline]
    #[must_use]
    pub const fn blocks_projectiles(self) -> bool {
        self.properties().contains(TileProperties::BLOCKS_PROJECTILES)
    }

    /// Glyph for ASCII dumps. Non-walkable tiles of an unknown kind show as `X`.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self.material() {
            Some(TileMaterial::None) | None => '?',
            Some(material) => {
                let glyph = material.glyph();
                if glyph == '?' && !self.is_walkable() {
                    'X'
                } else {
                    glyph
                }
            }
        }
    }
}

/// Partial tile update. `None` fields keep the stored value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileEdit {
    /// New material.
    pub material: Option<u8>,
    /// New surface flags.
    pub surface: Option<u8>,
    /// New property flags.
    pub properties: Option<u8>,
}

impl TileEdit {
    /// Edit that overwrites every field with `tile`.
    #[must_use]
    pub const fn replace(tile: Tile) -> Self {
        Self {
            material: Some(tile.material),
            surface: Some(tile.surface),
            properties: Some(tile.properties),
        }
    }

    /// Edit that only changes the surface overlay.
    #[must_use]
    pub const fn surface(surface: TileSurface) -> Self {
        Self {
            material: None,
            surface: Some(surface.bits()),
            properties: None,
        }
    }

    /// Applies the edit to `tile`.
    #[inline]
    #[must_use]
    pub fn apply(self, tile: Tile) -> Tile {
        Tile {
            material: self.material.unwrap_or(tile.material),
            surface: self.surface.unwrap_or(tile.surface),
            properties: self.properties.unwrap_or(tile.properties),
        }
    }
}
