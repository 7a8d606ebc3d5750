//! Terrain classification and the spice amounts tied to it.

use serde::{Deserialize, Serialize};

/// Lower bound of spice seeded into a plain spice tile.
pub const RANDOM_SPICE_MIN: i32 = 111;
/// Upper bound of spice seeded into a plain spice tile.
pub const RANDOM_SPICE_MAX: i32 = 191;
/// Lower bound of spice seeded into a thick spice tile.
pub const RANDOM_THICK_SPICE_MIN: i32 = 222;
/// Upper bound of spice seeded into a thick spice tile.
pub const RANDOM_THICK_SPICE_MAX: i32 = 444;
/// Spice left behind when a thick spice tile thins out to plain spice.
pub const THIN_SPICE_LAYER: i32 = RANDOM_SPICE_MIN;

/// Terrain of a single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainType {
    /// Concrete laid on rock.
    Slab,
    /// Open desert.
    Sand,
    /// Buildable bedrock.
    Rock,
    /// Impassable rock outcrop.
    Mountain,
    /// Sand dunes, treated like sand by the simulation.
    Dunes,
    /// Sand carrying a spice deposit.
    Spice,
    /// Sand carrying a dense spice deposit.
    ThickSpice,
    /// Bloom that erupts into a spice field when triggered.
    SpiceBloom,
    /// Bloom with a random bonus when triggered.
    SpecialBloom,
}

impl TerrainType {
    /// Rock-like terrain blocks sandworms and supports structures.
    #[must_use]
    pub const fn is_rock(self) -> bool {
        matches!(self, Self::Rock | Self::Slab | Self::Mountain)
    }

    /// Terrain that can hold or receive spice.
    #[must_use]
    pub const fn is_sand(self) -> bool {
        matches!(self, Self::Sand | Self::Dunes)
    }

    /// Spice carrying terrain.
    #[must_use]
    pub const fn is_spice(self) -> bool {
        matches!(self, Self::Spice | Self::ThickSpice)
    }

    /// Either kind of bloom.
    #[must_use]
    pub const fn bloom_kind(self) -> Option<BloomKind> {
        match self {
            Self::SpiceBloom => Some(BloomKind::Spice),
            Self::SpecialBloom => Some(BloomKind::Special),
            _ => None,
        }
    }
}

/// Distinguishes the two bloom tile variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloomKind {
    /// Plain spice bloom.
    Spice,
    /// Special bloom granting a random bonus.
    Special,
}

/// Category of a decorative terrain scar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecalKind {
    /// Scorch on rock or slab.
    Rock,
    /// Crater in sand or spice.
    Sand,
}
