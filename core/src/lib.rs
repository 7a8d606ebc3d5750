#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Arrakis simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the per-cycle systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point and reports what happened as
//! [`Event`] values. Everything that must be bit-identical across replays
//! (identifiers, coordinates, fixed-point math, the random stream) lives
//! here.

use serde::{Deserialize, Serialize};

pub mod fixed_point;
pub mod items;
pub mod random;
pub mod terrain;

pub use fixed_point::{
    fix, fixed_serde, fixed_sqrt, round_to_i32, rounded_length, FixedPoint,
    DIAGONAL_COST_MINUS_ONE, DIAGONAL_SPEED_CONST, FIXED_EPSILON,
};
pub use items::{BaseStats, BulletId, ItemId};
pub use random::Random;
pub use terrain::{
    BloomKind, DecalKind, TerrainType, RANDOM_SPICE_MAX, RANDOM_SPICE_MIN,
    RANDOM_THICK_SPICE_MAX, RANDOM_THICK_SPICE_MIN, THIN_SPICE_LAYER,
};

/// Edge length of a tile in world units.
pub const TILESIZE: i32 = 64;

/// Number of teams tracked by per-tile exploration state.
pub const NUM_TEAMS: usize = 6;

/// Number of infantry that can share a single tile.
pub const NUM_INFANTRY_PER_TILE: usize = 5;

/// Cap on decorative damage and dead-unit decals per tile.
pub const DAMAGE_PER_TILE: usize = 5;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation by one game cycle.
    Tick,
    /// Requests that a house places a structure anchored at `origin`.
    PlaceStructure {
        /// House that will own the structure.
        house: HouseId,
        /// Structure type to place.
        item: ItemId,
        /// Upper-left tile of the footprint.
        origin: Coord,
    },
    /// Orders a unit to travel to a tile.
    MoveUnit {
        /// Unit receiving the order.
        unit: ObjectId,
        /// Tile to travel to.
        destination: Coord,
    },
    /// Orders a harvester to collect spice starting at a tile.
    HarvestAt {
        /// Harvester receiving the order.
        unit: ObjectId,
        /// Tile to start harvesting at.
        destination: Coord,
    },
    /// Orders a harvester back to a refinery.
    ReturnHarvester {
        /// Harvester receiving the order.
        unit: ObjectId,
    },
    /// Orders an infantry unit to capture a structure.
    CaptureStructure {
        /// Infantry receiving the order.
        unit: ObjectId,
        /// Structure to capture.
        structure: ObjectId,
    },
    /// Orders a unit to a repair yard.
    RepairUnit {
        /// Unit receiving the order.
        unit: ObjectId,
        /// Repair yard to dock at.
        yard: ObjectId,
    },
    /// Changes the attack mode of a unit.
    SetAttackMode {
        /// Unit receiving the order.
        unit: ObjectId,
        /// Attack mode to adopt.
        mode: AttackMode,
    },
    /// Applies area damage around a point.
    Damage {
        /// Parameters of the explosion.
        blast: Blast,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A game cycle finished.
    CycleAdvanced {
        /// Cycle counter after the advance.
        cycle: u32,
    },
    /// An object entered the world.
    ObjectCreated {
        /// Identifier allocated to the object.
        id: ObjectId,
        /// Type of the object.
        item: ItemId,
        /// Owning house.
        owner: HouseId,
        /// Tile the object occupies, or the footprint origin for structures.
        location: Coord,
    },
    /// An object left the world.
    ObjectDestroyed {
        /// Identifier of the removed object.
        id: ObjectId,
        /// Type of the object.
        item: ItemId,
        /// Owning house at the time of destruction.
        owner: HouseId,
        /// Last known tile of the object.
        location: Coord,
    },
    /// A placement request succeeded.
    StructurePlaced {
        /// Identifier allocated to the structure.
        id: ObjectId,
        /// Structure type.
        item: ItemId,
        /// Owning house.
        owner: HouseId,
        /// Upper-left tile of the footprint.
        origin: Coord,
    },
    /// Concrete slabs were laid on rock.
    ConcreteLaid {
        /// House owning the concrete.
        owner: HouseId,
        /// Upper-left tile of the slab.
        origin: Coord,
        /// Tiles covered by the slab.
        size: FootprintSize,
    },
    /// A placement request was refused.
    StructurePlacementRejected {
        /// House that requested the placement.
        house: HouseId,
        /// Structure type requested.
        item: ItemId,
        /// Requested upper-left tile.
        origin: Coord,
        /// Why the placement failed.
        reason: PlacementError,
    },
    /// Infantry took over an enemy structure.
    StructureCaptured {
        /// Identifier of the structure that was replaced.
        previous: ObjectId,
        /// Identifier of the replacement owned by the capturer.
        replacement: ObjectId,
        /// Structure type.
        item: ItemId,
        /// House that lost the structure.
        from: HouseId,
        /// House that gained the structure.
        to: HouseId,
    },
    /// A deviator hit switched a unit to another house.
    UnitDeviated {
        /// Affected unit.
        unit: ObjectId,
        /// Owner before the hit.
        from: HouseId,
        /// Owner after the hit.
        to: HouseId,
    },
    /// A deviation wore off.
    UnitReverted {
        /// Affected unit.
        unit: ObjectId,
        /// Owner the unit returned to.
        to: HouseId,
    },
    /// A bloom tile erupted.
    BloomTriggered {
        /// Tile of the bloom.
        location: Coord,
        /// Which bloom variant erupted.
        kind: BloomKind,
        /// House credited with the trigger, if any.
        house: Option<HouseId>,
    },
    /// A unit entered a repair yard.
    UnitDockedForRepair {
        /// Unit being repaired.
        unit: ObjectId,
        /// Repair yard hosting the unit.
        yard: ObjectId,
    },
    /// A repaired unit left its repair yard.
    UnitRepaired {
        /// Repaired unit.
        unit: ObjectId,
        /// Repair yard the unit left.
        yard: ObjectId,
        /// Tile the unit was placed on.
        location: Coord,
    },
    /// A harvester docked at a refinery.
    HarvesterDocked {
        /// Docking harvester.
        harvester: ObjectId,
        /// Refinery accepting the harvester.
        refinery: ObjectId,
    },
    /// A harvester left a refinery or was delivered next to one.
    HarvesterDeployed {
        /// Deployed harvester.
        harvester: ObjectId,
        /// Refinery the harvester came from.
        refinery: ObjectId,
        /// Tile the harvester was placed on.
        location: Coord,
    },
    /// Credits moved between two houses.
    CreditsTransferred {
        /// House that lost the credits.
        from: HouseId,
        /// House that gained the credits.
        to: HouseId,
        /// Amount moved.
        amount: FixedPoint,
    },
}

/// Unique identifier assigned to every structure and unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates an identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The factions that own objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HouseId {
    /// House Harkonnen.
    Harkonnen,
    /// House Atreides.
    Atreides,
    /// House Ordos.
    Ordos,
    /// The Fremen.
    Fremen,
    /// The Sardaukar.
    Sardaukar,
    /// Mercenaries.
    Mercenary,
}

impl HouseId {
    /// All houses in index order.
    pub const ALL: [HouseId; 6] = [
        Self::Harkonnen,
        Self::Atreides,
        Self::Ordos,
        Self::Fremen,
        Self::Sardaukar,
        Self::Mercenary,
    ];

    /// Dense index of the house.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Chance that a unit of this house succumbs to a deviator hit.
    #[must_use]
    pub const fn deviate_weakness(self) -> FixedPoint {
        match self {
            Self::Harkonnen => FixedPoint::from_bits(2_576_980_378),
            Self::Atreides => FixedPoint::from_bits(1_288_490_189),
            Self::Ordos => FixedPoint::from_bits(858_993_459),
            Self::Fremen => FixedPoint::from_bits(644_245_094),
            Self::Sardaukar => FixedPoint::from_bits(1_073_741_824),
            Self::Mercenary => FixedPoint::from_bits(2_147_483_648),
        }
    }
}

/// Alliance a house belongs to; exploration is shared within a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u8);

impl TeamId {
    /// Creates a team identifier. Values are folded into `0..NUM_TEAMS`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value % NUM_TEAMS as u8)
    }

    /// Dense index used for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer position, either a tile index or a world point in whole units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Coord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the coordinate shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev distance.
    #[must_use]
    pub fn maximum_distance(self, other: Coord) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }

    /// Octile distance where a diagonal step costs `sqrt(2)`.
    #[must_use]
    pub fn block_distance(self, other: Coord) -> FixedPoint {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        fix(dx.max(dy)) + fix(dx.min(dy)) * DIAGONAL_COST_MINUS_ONE
    }

    /// Cheaper octile estimate where a diagonal step costs `1.5`.
    #[must_use]
    pub fn block_distance_approx(self, other: Coord) -> FixedPoint {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        fix(dx.max(dy)) + fix(dx.min(dy)) / 2
    }

    /// Euclidean distance rounded to the nearest integer.
    #[must_use]
    pub fn distance_to(self, other: Coord) -> i32 {
        rounded_length(self.x - other.x, self.y - other.y)
    }

    /// Tile containing this world point.
    #[must_use]
    pub const fn world_to_tile(self) -> Coord {
        Self::new(self.x.div_euclid(TILESIZE), self.y.div_euclid(TILESIZE))
    }

    /// World point at the centre of this tile.
    #[must_use]
    pub const fn tile_center(self) -> Coord {
        Self::new(
            self.x * TILESIZE + TILESIZE / 2,
            self.y * TILESIZE + TILESIZE / 2,
        )
    }
}

/// Sub-tile precise position in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal component.
    #[serde(with = "fixed_serde")]
    pub x: FixedPoint,
    /// Vertical component.
    #[serde(with = "fixed_serde")]
    pub y: FixedPoint,
}

impl WorldPoint {
    /// Creates a world point.
    #[must_use]
    pub const fn new(x: FixedPoint, y: FixedPoint) -> Self {
        Self { x, y }
    }

    /// Centre of a tile, shifted by an infantry slot offset.
    #[must_use]
    pub fn at_tile(tile: Coord, offset: (i32, i32)) -> Self {
        let center = tile.tile_center();
        Self::new(fix(center.x + offset.0), fix(center.y + offset.1))
    }

    /// Tile containing the point.
    #[must_use]
    pub fn tile(self) -> Coord {
        self.rounded().world_to_tile()
    }

    /// The point rounded to whole world units.
    #[must_use]
    pub fn rounded(self) -> Coord {
        Coord::new(round_to_i32(self.x), round_to_i32(self.y))
    }
}

/// Size of a footprint measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FootprintSize {
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl FootprintSize {
    /// A single tile.
    pub const SINGLE: FootprintSize = FootprintSize::new(1, 1);

    /// Creates a footprint size.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether `tile` lies inside the footprint anchored at `origin`.
    #[must_use]
    pub const fn contains(self, origin: Coord, tile: Coord) -> bool {
        tile.x >= origin.x
            && tile.y >= origin.y
            && tile.x < origin.x + self.width
            && tile.y < origin.y + self.height
    }

    /// Footprint tile closest to `point`.
    #[must_use]
    pub fn closest_point(self, origin: Coord, point: Coord) -> Coord {
        Coord::new(
            point.x.clamp(origin.x, origin.x + self.width - 1),
            point.y.clamp(origin.y, origin.y + self.height - 1),
        )
    }
}

/// Eight compass directions in the order used for drawing and navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facing {
    /// Toward increasing x.
    Right,
    /// Toward increasing x and decreasing y.
    RightUp,
    /// Toward decreasing y.
    Up,
    /// Toward decreasing x and decreasing y.
    LeftUp,
    /// Toward decreasing x.
    Left,
    /// Toward decreasing x and increasing y.
    LeftDown,
    /// Toward increasing y.
    Down,
    /// Toward increasing x and increasing y.
    RightDown,
}

impl Facing {
    /// All facings in enumeration order.
    pub const ALL: [Facing; 8] = [
        Self::Right,
        Self::RightUp,
        Self::Up,
        Self::LeftUp,
        Self::Left,
        Self::LeftDown,
        Self::Down,
        Self::RightDown,
    ];

    /// Tile delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::RightUp => (1, -1),
            Self::Up => (0, -1),
            Self::LeftUp => (-1, -1),
            Self::Left => (-1, 0),
            Self::LeftDown => (-1, 1),
            Self::Down => (0, 1),
            Self::RightDown => (1, 1),
        }
    }

    /// Whether a step in this direction moves along both axes.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// Direction of the step from `from` toward `to`, or `None` if equal.
    #[must_use]
    pub fn between(from: Coord, to: Coord) -> Option<Facing> {
        let delta = ((to.x - from.x).signum(), (to.y - from.y).signum());
        Self::ALL
            .into_iter()
            .find(|facing| facing.delta() == delta)
    }
}

/// One of the five sub-tile positions an infantry unit can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfantrySlot(u8);

impl InfantrySlot {
    /// The tile centre.
    pub const CENTER: InfantrySlot = InfantrySlot(0);

    /// All slots in preference order.
    pub const ALL: [InfantrySlot; NUM_INFANTRY_PER_TILE] = [
        InfantrySlot(0),
        InfantrySlot(1),
        InfantrySlot(2),
        InfantrySlot(3),
        InfantrySlot(4),
    ];

    const OFFSETS: [(i32, i32); NUM_INFANTRY_PER_TILE] = [
        (0, 0),
        (-TILESIZE / 4, -TILESIZE / 4),
        (TILESIZE / 4, -TILESIZE / 4),
        (-TILESIZE / 4, TILESIZE / 4),
        (TILESIZE / 4, TILESIZE / 4),
    ];

    /// Creates a slot from its index, rejecting indices past the last slot.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_INFANTRY_PER_TILE {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Index of the slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Offset of the slot from the tile centre in world units.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        Self::OFFSETS[self.0 as usize]
    }
}

/// Standing orders that govern how a unit reacts to enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMode {
    /// Hold position and engage enemies in range.
    Guard,
    /// Engage enemies within a wider radius of the guard point.
    AreaGuard,
    /// Hold fire until discovered.
    Ambush,
    /// Seek out enemies across the map.
    Hunt,
    /// Do nothing.
    Stop,
    /// Infantry walks into the target structure to capture it.
    Capture,
}

/// Reasons a structure placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested item is not a structure.
    NotAStructure,
    /// The footprint extends beyond the map.
    OutOfBounds,
    /// A footprint tile is not rock.
    UnsuitableTerrain,
    /// Concrete is required under every footprint tile.
    ConcreteRequired,
    /// A footprint tile holds a ground object.
    Occupied,
    /// No footprint tile is near enough to a tile owned by the house.
    OutOfBuildRange,
    /// The structure would close the traffic lane around a neighbor.
    NoStructureGap,
}

/// Parameters of a single explosion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blast {
    /// Object that caused the damage, if known.
    pub damager: Option<ObjectId>,
    /// House of the damager, if known.
    pub damager_owner: Option<HouseId>,
    /// Centre of the explosion in world units.
    pub real_pos: Coord,
    /// Projectile that exploded.
    pub bullet: BulletId,
    /// Damage at the centre.
    pub damage: i32,
    /// Radius of the blast in world units.
    pub radius: i32,
    /// Whether the explosion happened in the air.
    pub air: bool,
}
