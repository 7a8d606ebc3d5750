//! Per-cell terrain, occupancy and visibility bookkeeping.

use arrakis_core::{
    fix, fixed_serde, BloomKind, Coord, DecalKind, FixedPoint, HouseId, InfantrySlot, ItemId,
    ObjectId, TeamId, TerrainType, DAMAGE_PER_TILE, NUM_INFANTRY_PER_TILE, NUM_TEAMS,
    THIN_SPICE_LAYER,
};
use serde::{Deserialize, Serialize};

/// Sand region id of rock tiles, which belong to no region.
pub const NO_SAND_REGION: u32 = u32::MAX;

/// Decorative scar left on the ground by an explosion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainDecal {
    /// Rock scorch or sand crater.
    pub kind: DecalKind,
    /// Graphic variant within the kind.
    pub variant: u8,
    /// Centre of the decal in world units.
    pub real_pos: Coord,
}

/// Remains of a destroyed unit drawn on the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeadUnitDecal {
    /// Type of the destroyed unit.
    pub item: ItemId,
    /// House that owned the unit.
    pub house: HouseId,
    /// Whether the remains lie on sand.
    pub on_sand: bool,
    /// Position of the remains in world units.
    pub real_pos: Coord,
}

/// One cell of the world grid.
///
/// A tile only indexes the objects standing on it; the object arena owns
/// them. Callers are responsible for keeping each object assigned to at most
/// one tile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    location: Coord,
    terrain: TerrainType,
    #[serde(with = "fixed_serde")]
    spice: FixedPoint,
    owner: Option<HouseId>,
    explored: [bool; NUM_TEAMS],
    last_access: [u32; NUM_TEAMS],
    sand_region: u32,
    damage: Vec<TerrainDecal>,
    dead_units: Vec<DeadUnitDecal>,
    air_units: Vec<ObjectId>,
    infantry: Vec<(ObjectId, InfantrySlot)>,
    underground_units: Vec<ObjectId>,
    non_infantry_ground_objects: Vec<ObjectId>,
}

impl Tile {
    /// Creates an empty, unexplored tile.
    #[must_use]
    pub fn new(location: Coord, terrain: TerrainType) -> Self {
        Self {
            location,
            terrain,
            spice: FixedPoint::ZERO,
            owner: None,
            explored: [false; NUM_TEAMS],
            last_access: [0; NUM_TEAMS],
            sand_region: NO_SAND_REGION,
            damage: Vec::new(),
            dead_units: Vec::new(),
            air_units: Vec::new(),
            infantry: Vec::new(),
            underground_units: Vec::new(),
            non_infantry_ground_objects: Vec::new(),
        }
    }

    /// Grid position of the tile.
    #[must_use]
    pub const fn location(&self) -> Coord {
        self.location
    }

    /// Current terrain type.
    #[must_use]
    pub const fn terrain(&self) -> TerrainType {
        self.terrain
    }

    /// Replaces the terrain type.
    pub fn set_terrain(&mut self, terrain: TerrainType) {
        self.terrain = terrain;
    }

    /// Spice stored on the tile.
    #[must_use]
    pub const fn spice(&self) -> FixedPoint {
        self.spice
    }

    /// Overwrites the stored spice, clamping negatives to zero.
    pub fn set_spice(&mut self, spice: FixedPoint) {
        self.spice = spice.max(FixedPoint::ZERO);
    }

    /// House owning the tile through a structure or slab.
    #[must_use]
    pub const fn owner(&self) -> Option<HouseId> {
        self.owner
    }

    /// Sets or clears the owning house.
    pub fn set_owner(&mut self, owner: Option<HouseId>) {
        self.owner = owner;
    }

    /// Connectivity id of the sand region containing the tile.
    #[must_use]
    pub const fn sand_region(&self) -> u32 {
        self.sand_region
    }

    pub(crate) fn set_sand_region(&mut self, region: u32) {
        self.sand_region = region;
    }

    /// Whether the team has ever seen the tile.
    #[must_use]
    pub fn is_explored_by_team(&self, team: TeamId) -> bool {
        self.explored[team.index()]
    }

    /// Last cycle in which the team saw the tile.
    #[must_use]
    pub fn last_access(&self, team: TeamId) -> u32 {
        self.last_access[team.index()]
    }

    /// Marks the tile as seen by `team` during `cycle`.
    ///
    /// Neither the explored flag nor the last access cycle ever move
    /// backwards.
    pub fn set_explored(&mut self, team: TeamId, cycle: u32) {
        let index = team.index();
        self.explored[index] = true;
        self.last_access[index] = self.last_access[index].max(cycle);
    }

    /// Whether the tile is hidden for `team` at `cycle`.
    #[must_use]
    pub fn is_fogged_by_team(&self, team: TeamId, cycle: u32, timeout: u32) -> bool {
        !self.is_explored_by_team(team) || cycle.saturating_sub(self.last_access(team)) > timeout
    }

    /// Rock, concrete or mountain.
    #[must_use]
    pub const fn is_rock(&self) -> bool {
        self.terrain.is_rock()
    }

    /// Plain sand or dunes.
    #[must_use]
    pub const fn is_sand(&self) -> bool {
        self.terrain.is_sand()
    }

    /// Plain or thick spice.
    #[must_use]
    pub const fn is_spice(&self) -> bool {
        self.terrain.is_spice()
    }

    /// Thick spice.
    #[must_use]
    pub fn is_thick_spice(&self) -> bool {
        self.terrain == TerrainType::ThickSpice
    }

    /// Concrete slab.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.terrain == TerrainType::Slab
    }

    /// Impassable mountain.
    #[must_use]
    pub fn is_mountain(&self) -> bool {
        self.terrain == TerrainType::Mountain
    }

    /// Either kind of bloom.
    #[must_use]
    pub const fn is_bloom(&self) -> bool {
        self.terrain.bloom_kind().is_some()
    }

    /// At least one infantry unit stands on the tile.
    #[must_use]
    pub fn has_infantry(&self) -> bool {
        !self.infantry.is_empty()
    }

    /// Another infantry unit fits on the tile.
    #[must_use]
    pub fn infantry_not_full(&self) -> bool {
        self.infantry.len() < NUM_INFANTRY_PER_TILE
    }

    /// A structure or vehicle stands on the tile.
    #[must_use]
    pub fn has_a_non_infantry_ground_object(&self) -> bool {
        !self.non_infantry_ground_objects.is_empty()
    }

    /// Infantry, a structure or a vehicle stands on the tile.
    #[must_use]
    pub fn has_a_ground_object(&self) -> bool {
        self.has_infantry() || self.has_a_non_infantry_ground_object()
    }

    /// An aircraft hovers over the tile.
    #[must_use]
    pub fn has_an_air_unit(&self) -> bool {
        !self.air_units.is_empty()
    }

    /// A sandworm travels under the tile.
    #[must_use]
    pub fn has_an_underground_unit(&self) -> bool {
        !self.underground_units.is_empty()
    }

    /// Any object at all is indexed by the tile.
    #[must_use]
    pub fn has_an_object(&self) -> bool {
        self.has_a_ground_object() || self.has_an_air_unit() || self.has_an_underground_unit()
    }

    /// Ground units cannot enter the tile.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.is_mountain() || self.has_a_ground_object()
    }

    /// Aircraft over the tile.
    #[must_use]
    pub fn air_units(&self) -> &[ObjectId] {
        &self.air_units
    }

    /// Infantry on the tile with their sub-tile slots.
    #[must_use]
    pub fn infantry(&self) -> &[(ObjectId, InfantrySlot)] {
        &self.infantry
    }

    /// Sandworms under the tile.
    #[must_use]
    pub fn underground_units(&self) -> &[ObjectId] {
        &self.underground_units
    }

    /// Structures and vehicles on the tile.
    #[must_use]
    pub fn non_infantry_ground_objects(&self) -> &[ObjectId] {
        &self.non_infantry_ground_objects
    }

    /// Ground and underground objects, infantry first.
    pub fn ground_object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.infantry
            .iter()
            .map(|(id, _)| *id)
            .chain(self.non_infantry_ground_objects.iter().copied())
            .chain(self.underground_units.iter().copied())
    }

    /// Every object indexed by the tile: ground, underground, then air.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ground_object_ids().chain(self.air_units.iter().copied())
    }

    /// Whether `id` is indexed by this tile.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.object_ids().any(|candidate| candidate == id)
    }

    /// Slot held by an infantry unit on this tile.
    #[must_use]
    pub fn infantry_slot_of(&self, id: ObjectId) -> Option<InfantrySlot> {
        self.infantry
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, slot)| *slot)
    }

    /// First free slot, preferring `preferred` when it is free.
    #[must_use]
    pub fn free_infantry_slot(&self, preferred: Option<InfantrySlot>) -> Option<InfantrySlot> {
        if !self.infantry_not_full() {
            return None;
        }
        let is_free = |slot: InfantrySlot| self.infantry.iter().all(|(_, used)| *used != slot);
        preferred
            .filter(|slot| is_free(*slot))
            .or_else(|| InfantrySlot::ALL.into_iter().find(|slot| is_free(*slot)))
    }

    /// Indexes an aircraft on this tile.
    pub fn assign_air_unit(&mut self, id: ObjectId) {
        self.air_units.push(id);
    }

    /// Indexes a sandworm on this tile.
    pub fn assign_underground_unit(&mut self, id: ObjectId) {
        self.underground_units.push(id);
    }

    /// Indexes a structure or vehicle on this tile.
    pub fn assign_non_infantry_ground_object(&mut self, id: ObjectId) {
        self.non_infantry_ground_objects.push(id);
    }

    /// Indexes an infantry unit and returns the slot it received.
    ///
    /// Returns `None` and leaves the tile unchanged when every slot is taken.
    pub fn assign_infantry(
        &mut self,
        id: ObjectId,
        preferred: Option<InfantrySlot>,
    ) -> Option<InfantrySlot> {
        let slot = self.free_infantry_slot(preferred)?;
        self.infantry.push((id, slot));
        Some(slot)
    }

    /// Removes `id` from every occupant list. Absent ids are ignored.
    pub fn unassign_object(&mut self, id: ObjectId) {
        self.air_units.retain(|candidate| *candidate != id);
        self.infantry.retain(|(candidate, _)| *candidate != id);
        self.underground_units.retain(|candidate| *candidate != id);
        self.non_infantry_ground_objects
            .retain(|candidate| *candidate != id);
    }

    /// Extracts up to `rate` spice and returns the amount actually removed.
    ///
    /// An exhausted thick spice tile thins out to plain spice with a fresh
    /// layer; an exhausted plain spice tile turns back into sand.
    pub fn harvest_spice(&mut self, rate: FixedPoint) -> FixedPoint {
        let old = self.spice;
        self.spice = (old - rate).max(FixedPoint::ZERO);
        let extracted = old - self.spice;

        if self.spice == FixedPoint::ZERO {
            match self.terrain {
                TerrainType::ThickSpice => {
                    self.terrain = TerrainType::Spice;
                    self.spice = fix(THIN_SPICE_LAYER);
                }
                TerrainType::Spice => self.terrain = TerrainType::Sand,
                _ => {}
            }
        }

        extracted
    }

    /// Adds spice, turning sand into spice when it receives any.
    pub fn add_spice(&mut self, amount: FixedPoint) {
        if amount <= FixedPoint::ZERO {
            return;
        }
        self.spice += amount;
        if self.is_sand() {
            self.terrain = TerrainType::Spice;
        }
    }

    /// Turns a bloom back into sand, reporting which bloom it was.
    ///
    /// Calling this on any other terrain does nothing.
    pub fn trigger_bloom(&mut self) -> Option<BloomKind> {
        let kind = self.terrain.bloom_kind()?;
        self.terrain = TerrainType::Sand;
        Some(kind)
    }

    /// Terrain scars on the tile.
    #[must_use]
    pub fn damage(&self) -> &[TerrainDecal] {
        &self.damage
    }

    /// Adds a terrain scar unless the tile already carries the maximum.
    pub fn add_damage(&mut self, decal: TerrainDecal) {
        if self.damage.len() < DAMAGE_PER_TILE {
            self.damage.push(decal);
        }
    }

    /// Remains of destroyed units on the tile.
    #[must_use]
    pub fn dead_units(&self) -> &[DeadUnitDecal] {
        &self.dead_units
    }

    /// Adds unit remains unless the tile already carries the maximum.
    pub fn assign_dead_unit(&mut self, decal: DeadUnitDecal) {
        if self.dead_units.len() < DAMAGE_PER_TILE {
            self.dead_units.push(decal);
        }
    }
}
