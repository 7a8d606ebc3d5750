//! Object arena holding every structure and unit in the world.
//!
//! Tiles and other objects refer to entries only through [`ObjectId`]
//! handles. Identifiers are never reused, so a lookup of a destroyed object
//! simply yields `None`.

use std::collections::{BTreeMap, VecDeque};

use arrakis_core::{
    fix, fixed_serde, AttackMode, BaseStats, Coord, Facing, FixedPoint, FootprintSize, HouseId,
    InfantrySlot, ItemId, ObjectId, WorldPoint, TILESIZE,
};
use serde::{Deserialize, Serialize};

/// Most smoke plumes a damaged structure shows at once.
pub const MAX_SMOKE: usize = 5;

/// Health ratio below which an object counts as badly damaged.
pub const RED_BAND: FixedPoint = FixedPoint::from_bits(1 << 30);

/// A structure or unit owned by the arena.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameObject {
    /// Identifier of the object.
    pub id: ObjectId,
    /// Type of the object.
    pub item: ItemId,
    /// House currently controlling the object.
    pub owner: HouseId,
    /// House that originally built the object.
    pub original_house: HouseId,
    /// Occupied tile, or the upper-left footprint tile for structures.
    pub location: Coord,
    /// Precise position in world units.
    pub real_pos: WorldPoint,
    /// Remaining hit points.
    #[serde(with = "fixed_serde")]
    pub health: FixedPoint,
    /// Hit points of an undamaged instance.
    pub max_health: i32,
    /// Exploration radius in tiles.
    pub view_range: i32,
    /// Collision radius in world units.
    pub radius: i32,
    /// Whether the object is part of the player's selection.
    pub selected: bool,
    /// Structure or unit specific state.
    pub kind: ObjectKind,
}

/// Closed set of object categories.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A building occupying a footprint.
    Structure(StructureState),
    /// A unit occupying a single tile.
    Unit(UnitState),
}

/// State shared by all structures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureState {
    /// Footprint in tiles.
    pub size: FootprintSize,
    /// Smoke plumes rising from the structure.
    pub smoke: Vec<Smoke>,
    /// Structure specific behavior.
    pub role: StructureRole,
}

impl StructureState {
    /// Adds a smoke plume unless the structure already shows the maximum.
    pub fn add_smoke(&mut self, real_pos: Coord, cycle: u32) {
        if self.smoke.len() < MAX_SMOKE {
            self.smoke.push(Smoke {
                real_pos,
                start_cycle: cycle,
            });
        }
    }
}

/// Smoke plume on a damaged structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Smoke {
    /// Position of the plume in world units.
    pub real_pos: Coord,
    /// Cycle in which the plume appeared.
    pub start_cycle: u32,
}

/// Structure roles with extra state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureRole {
    /// No extra behavior.
    Plain,
    /// Accepts harvesters and turns their spice into credits.
    Refinery(RefineryState),
    /// Repairs one vehicle at a time.
    RepairYard(RepairYardState),
    /// Adds spice storage capacity.
    Silo,
}

/// Reservation counter of a refinery or repair yard.
pub trait Bookable {
    /// Number of outstanding reservations.
    fn bookings(&self) -> u32;
    /// Adds a reservation.
    fn book(&mut self);
    /// Removes a reservation.
    fn unbook(&mut self);
}

/// Docking state of a refinery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefineryState {
    /// Harvesters heading toward this refinery.
    pub bookings: u32,
    /// Harvester currently unloading.
    pub docked_harvester: Option<ObjectId>,
    /// Whether spice is being extracted this cycle.
    pub extracting: bool,
}

impl Bookable for RefineryState {
    fn bookings(&self) -> u32 {
        self.bookings
    }

    fn book(&mut self) {
        self.bookings = self.bookings.saturating_add(1);
    }

    fn unbook(&mut self) {
        self.bookings = self.bookings.saturating_sub(1);
    }
}

/// Repair state of a repair yard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepairYardState {
    /// Units heading toward this yard.
    pub bookings: u32,
    /// Unit currently being repaired.
    pub repair_unit: Option<ObjectId>,
}

impl Bookable for RepairYardState {
    fn bookings(&self) -> u32 {
        self.bookings
    }

    fn book(&mut self) {
        self.bookings = self.bookings.saturating_add(1);
    }

    fn unbook(&mut self) {
        self.bookings = self.bookings.saturating_sub(1);
    }
}

/// State shared by all units.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitState {
    /// Tile the unit is ordered to reach.
    pub destination: Option<Coord>,
    /// Object the unit is ordered to act on.
    pub target: Option<ObjectId>,
    /// Refinery or repair yard holding a reservation for this unit.
    pub booking: Option<ObjectId>,
    /// Standing orders.
    pub attack_mode: AttackMode,
    /// Whether the unit is travelling toward `next_spot`.
    pub moving: bool,
    /// Set for the cycle in which the unit arrived on a tile.
    pub just_stopped_moving: bool,
    /// Tile the current step leads to.
    pub next_spot: Option<Coord>,
    /// Tile the current step started from.
    pub old_location: Coord,
    /// Horizontal speed in world units per cycle.
    #[serde(with = "fixed_serde")]
    pub x_speed: FixedPoint,
    /// Vertical speed in world units per cycle.
    #[serde(with = "fixed_serde")]
    pub y_speed: FixedPoint,
    /// Top speed in world units per cycle.
    #[serde(with = "fixed_serde")]
    pub max_speed: FixedPoint,
    /// Direction of travel.
    pub facing: Facing,
    /// Remaining tiles of the planned route.
    pub path: VecDeque<Coord>,
    /// Whether the unit stands on the map; docked harvesters are inactive.
    pub active: bool,
    /// Cycles left until a deviated unit reverts to its original house.
    pub deviation_timer: Option<u32>,
    /// Unit specific behavior.
    pub role: UnitRole,
}

impl UnitState {
    /// Whether a speed has been set for the current step.
    #[must_use]
    pub fn has_speed(&self) -> bool {
        self.x_speed != FixedPoint::ZERO || self.y_speed != FixedPoint::ZERO
    }

    /// Clears the current route and stops after the current step.
    pub fn clear_path(&mut self) {
        self.path.clear();
    }
}

/// Unit roles with extra state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    /// Ordinary ground vehicle.
    Vehicle,
    /// Foot soldier sharing tiles through slots.
    Infantry(InfantryState),
    /// Spice collector.
    Harvester(HarvesterState),
    /// Aircraft.
    Air,
    /// Desert sandworm travelling underground.
    Sandworm,
}

/// Sub-tile placement of an infantry unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfantryState {
    /// Slot held on the current tile.
    pub tile_position: Option<InfantrySlot>,
    /// Slot held on the tile the current step started from.
    pub old_tile_position: Option<InfantrySlot>,
}

/// Cargo and mode of a harvester.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HarvesterState {
    /// Spice carried.
    #[serde(with = "fixed_serde")]
    pub spice: FixedPoint,
    /// Whether the harvester collects spice at its destination.
    pub harvesting_mode: bool,
    /// Whether the harvester is heading back to a refinery.
    pub returning: bool,
}

impl HarvesterState {
    /// Removes up to `amount` spice and returns what was removed.
    pub fn extract_spice(&mut self, amount: FixedPoint) -> FixedPoint {
        let extracted = amount.min(self.spice).max(FixedPoint::ZERO);
        self.spice -= extracted;
        extracted
    }
}

impl GameObject {
    /// Creates a structure anchored at `origin`.
    #[must_use]
    pub fn new_structure(
        id: ObjectId,
        item: ItemId,
        owner: HouseId,
        origin: Coord,
        stats: BaseStats,
    ) -> Self {
        let size = item.footprint();
        let role = match item {
            ItemId::Refinery => StructureRole::Refinery(RefineryState::default()),
            ItemId::RepairYard => StructureRole::RepairYard(RepairYardState::default()),
            ItemId::Silo => StructureRole::Silo,
            _ => StructureRole::Plain,
        };
        let corner = Coord::new(origin.x * TILESIZE, origin.y * TILESIZE);
        Self {
            id,
            item,
            owner,
            original_house: owner,
            location: origin,
            real_pos: WorldPoint::new(fix(corner.x), fix(corner.y)),
            health: fix(stats.max_health),
            max_health: stats.max_health,
            view_range: stats.view_range,
            radius: stats.radius,
            selected: false,
            kind: ObjectKind::Structure(StructureState {
                size,
                smoke: Vec::new(),
                role,
            }),
        }
    }

    /// Creates a unit standing on the centre of `location`.
    #[must_use]
    pub fn new_unit(
        id: ObjectId,
        item: ItemId,
        owner: HouseId,
        location: Coord,
        stats: BaseStats,
    ) -> Self {
        let role = if item == ItemId::Harvester {
            UnitRole::Harvester(HarvesterState::default())
        } else if item.is_infantry() {
            UnitRole::Infantry(InfantryState::default())
        } else if item.is_aircraft() {
            UnitRole::Air
        } else if item == ItemId::Sandworm {
            UnitRole::Sandworm
        } else {
            UnitRole::Vehicle
        };
        Self {
            id,
            item,
            owner,
            original_house: owner,
            location,
            real_pos: WorldPoint::at_tile(location, (0, 0)),
            health: fix(stats.max_health),
            max_health: stats.max_health,
            view_range: stats.view_range,
            radius: stats.radius,
            selected: false,
            kind: ObjectKind::Unit(UnitState {
                destination: None,
                target: None,
                booking: None,
                attack_mode: AttackMode::Guard,
                moving: false,
                just_stopped_moving: false,
                next_spot: None,
                old_location: location,
                x_speed: FixedPoint::ZERO,
                y_speed: FixedPoint::ZERO,
                max_speed: stats.max_speed,
                facing: Facing::Down,
                path: VecDeque::new(),
                active: true,
                deviation_timer: None,
                role,
            }),
        }
    }

    /// Whether the object is a structure.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        matches!(self.kind, ObjectKind::Structure(_))
    }

    /// Whether the object is infantry.
    #[must_use]
    pub fn is_infantry(&self) -> bool {
        self.as_infantry().is_some()
    }

    /// Tiles covered by the object.
    #[must_use]
    pub fn footprint(&self) -> FootprintSize {
        match &self.kind {
            ObjectKind::Structure(structure) => structure.size,
            ObjectKind::Unit(_) => FootprintSize::SINGLE,
        }
    }

    /// Whether `tile` is covered by the object.
    #[must_use]
    pub fn covers(&self, tile: Coord) -> bool {
        self.footprint().contains(self.location, tile)
    }

    /// Covered tile closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Coord) -> Coord {
        self.footprint().closest_point(self.location, point)
    }

    /// Centre of the object in whole world units.
    #[must_use]
    pub fn center_point(&self) -> Coord {
        match &self.kind {
            ObjectKind::Structure(structure) => Coord::new(
                self.location.x * TILESIZE + structure.size.width * TILESIZE / 2,
                self.location.y * TILESIZE + structure.size.height * TILESIZE / 2,
            ),
            ObjectKind::Unit(_) => self.real_pos.rounded(),
        }
    }

    /// Remaining health as a fraction of the maximum.
    #[must_use]
    pub fn health_ratio(&self) -> FixedPoint {
        if self.max_health <= 0 {
            return FixedPoint::ZERO;
        }
        self.health / fix(self.max_health)
    }

    /// Whether the health ratio lies in the red band.
    #[must_use]
    pub fn is_badly_damaged(&self) -> bool {
        self.health_ratio() < RED_BAND
    }

    /// Whether the unit stands on the map. Structures always do.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.as_unit().map_or(true, |unit| unit.active)
    }

    /// Structure state, if this is a structure.
    #[must_use]
    pub fn as_structure(&self) -> Option<&StructureState> {
        match &self.kind {
            ObjectKind::Structure(structure) => Some(structure),
            ObjectKind::Unit(_) => None,
        }
    }

    /// Mutable structure state, if this is a structure.
    pub fn as_structure_mut(&mut self) -> Option<&mut StructureState> {
        match &mut self.kind {
            ObjectKind::Structure(structure) => Some(structure),
            ObjectKind::Unit(_) => None,
        }
    }

    /// Unit state, if this is a unit.
    #[must_use]
    pub fn as_unit(&self) -> Option<&UnitState> {
        match &self.kind {
            ObjectKind::Unit(unit) => Some(unit),
            ObjectKind::Structure(_) => None,
        }
    }

    /// Mutable unit state, if this is a unit.
    pub fn as_unit_mut(&mut self) -> Option<&mut UnitState> {
        match &mut self.kind {
            ObjectKind::Unit(unit) => Some(unit),
            ObjectKind::Structure(_) => None,
        }
    }

    /// Refinery state, if this is a refinery.
    #[must_use]
    pub fn as_refinery(&self) -> Option<&RefineryState> {
        match &self.as_structure()?.role {
            StructureRole::Refinery(refinery) => Some(refinery),
            _ => None,
        }
    }

    /// Mutable refinery state, if this is a refinery.
    pub fn as_refinery_mut(&mut self) -> Option<&mut RefineryState> {
        match &mut self.as_structure_mut()?.role {
            StructureRole::Refinery(refinery) => Some(refinery),
            _ => None,
        }
    }

    /// Repair yard state, if this is a repair yard.
    #[must_use]
    pub fn as_repair_yard(&self) -> Option<&RepairYardState> {
        match &self.as_structure()?.role {
            StructureRole::RepairYard(yard) => Some(yard),
            _ => None,
        }
    }

    /// Mutable repair yard state, if this is a repair yard.
    pub fn as_repair_yard_mut(&mut self) -> Option<&mut RepairYardState> {
        match &mut self.as_structure_mut()?.role {
            StructureRole::RepairYard(yard) => Some(yard),
            _ => None,
        }
    }

    /// Harvester state, if this is a harvester.
    #[must_use]
    pub fn as_harvester(&self) -> Option<&HarvesterState> {
        match &self.as_unit()?.role {
            UnitRole::Harvester(harvester) => Some(harvester),
            _ => None,
        }
    }

    /// Mutable harvester state, if this is a harvester.
    pub fn as_harvester_mut(&mut self) -> Option<&mut HarvesterState> {
        match &mut self.as_unit_mut()?.role {
            UnitRole::Harvester(harvester) => Some(harvester),
            _ => None,
        }
    }

    /// Infantry state, if this is infantry.
    #[must_use]
    pub fn as_infantry(&self) -> Option<&InfantryState> {
        match &self.as_unit()?.role {
            UnitRole::Infantry(infantry) => Some(infantry),
            _ => None,
        }
    }

    /// Reservation counter, if this is a refinery or repair yard.
    pub fn as_bookable_mut(&mut self) -> Option<&mut dyn Bookable> {
        match &mut self.as_structure_mut()?.role {
            StructureRole::Refinery(refinery) => Some(refinery),
            StructureRole::RepairYard(yard) => Some(yard),
            _ => None,
        }
    }

    /// Mutable infantry state, if this is infantry.
    pub fn as_infantry_mut(&mut self) -> Option<&mut InfantryState> {
        match &mut self.as_unit_mut()?.role {
            UnitRole::Infantry(infantry) => Some(infantry),
            _ => None,
        }
    }
}

/// Registry that stores objects and manages identifier allocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectManager {
    entries: BTreeMap<ObjectId, GameObject>,
    next_id: u32,
}

impl ObjectManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next identifier.
    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Stores an object under its identifier.
    pub fn insert(&mut self, object: GameObject) {
        let _ = self.entries.insert(object.id, object);
    }

    /// Looks up an object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.entries.get(&id)
    }

    /// Looks up an object for mutation.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.entries.get_mut(&id)
    }

    /// Removes an object, handing ownership to the caller.
    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        self.entries.remove(&id)
    }

    /// Whether the object is alive.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Snapshot of the live identifiers in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.entries.keys().copied().collect()
    }

    /// Iterates over the live objects in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.entries.values()
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no objects are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
