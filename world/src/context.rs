//! Mutable game state shared by every simulation system.

use std::collections::BTreeMap;

use arrakis_core::{
    fix, BloomKind, Coord, Event, FixedPoint, FootprintSize, HouseId, ItemId, ObjectId,
    PlacementError, Random, TeamId, TerrainType, WorldPoint,
};

use crate::{
    house::House,
    map::{Map, Mobility, PlacementQuery},
    objects::{GameObject, ObjectKind, ObjectManager, StructureRole, UnitRole},
    rules::Rules,
    tile::DeadUnitDecal,
};

/// Radius of the spice field left by an ordinary bloom.
pub const BLOOM_FIELD_RADIUS: i32 = 5;

/// Radius of the spice field a special bloom may leave.
pub const SPECIAL_BLOOM_FIELD_RADIUS: i32 = 3;

/// Smallest credit reward of a special bloom.
pub const SPECIAL_BLOOM_MIN_CREDITS: i32 = 150;

/// Largest credit reward of a special bloom.
pub const SPECIAL_BLOOM_MAX_CREDITS: i32 = 400;

/// Everything a simulation step reads or writes.
///
/// Systems receive the context explicitly; there is no global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameContext {
    /// Terrain and tile occupancy.
    pub map: Map,
    /// Every structure and unit.
    pub objects: ObjectManager,
    /// Participating houses.
    pub houses: BTreeMap<HouseId, House>,
    /// Deterministic random source.
    pub random: Random,
    /// Game rules.
    pub rules: Rules,
    /// Number of completed simulation cycles.
    pub cycle: u32,
}

impl GameContext {
    /// Creates a context around `map` without houses or objects.
    #[must_use]
    pub fn new(map: Map, rules: Rules, seed: u64) -> Self {
        Self {
            map,
            objects: ObjectManager::new(),
            houses: BTreeMap::new(),
            random: Random::from_seed(seed),
            rules,
            cycle: 0,
        }
    }

    /// Registers a house, replacing any earlier registration.
    pub fn add_house(&mut self, id: HouseId, team: TeamId, starting_credits: FixedPoint) {
        let _ = self
            .houses
            .insert(id, House::new(id, team, starting_credits));
    }

    /// Registered house with the given identifier.
    #[must_use]
    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(&id)
    }

    /// Mutable registered house with the given identifier.
    pub fn house_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(&id)
    }

    /// Team of a house. Unregistered houses play on their own team.
    #[must_use]
    pub fn team_of(&self, house: HouseId) -> TeamId {
        self.house(house).map_or_else(
            || TeamId::new(house.index() as u8),
            |house| house.team(),
        )
    }

    fn house_entry(&mut self, id: HouseId) -> &mut House {
        self.houses
            .entry(id)
            .or_insert_with(|| House::new(id, TeamId::new(id.index() as u8), FixedPoint::ZERO))
    }

    /// Reveals the surroundings of an object to its owner's team.
    pub fn view_from(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get(id) else {
            return;
        };
        if !object.is_active() {
            return;
        }
        let team = self.team_of(object.owner);
        let location = object.center_point().world_to_tile();
        let range = object.view_range;
        self.map.view_map(team, location, range, self.cycle);
    }

    /// Creates a unit of `house` on `location`.
    ///
    /// Returns `None` when `item` is not a unit, the tile does not exist or
    /// an infantry unit finds the tile full.
    pub fn create_unit(
        &mut self,
        house: HouseId,
        item: ItemId,
        location: Coord,
        out_events: &mut Vec<Event>,
    ) -> Option<ObjectId> {
        if !item.is_unit() || !self.map.tile_exists(location.x, location.y) {
            return None;
        }
        let id = self.objects.allocate_id();
        let mut unit = GameObject::new_unit(id, item, house, location, self.rules.stats(item));
        if !self.map.assign_object(&mut unit) {
            log::debug!("no room for {item:?} on {location:?}");
            return None;
        }
        if let Some(slot) = unit.as_infantry().and_then(|infantry| infantry.tile_position) {
            unit.real_pos = WorldPoint::at_tile(location, slot.offset());
        }
        self.objects.insert(unit);
        self.house_entry(house).increment_units(item);
        self.view_from(id);
        log::debug!("{house:?} created {item:?} {id:?} on {location:?}");
        out_events.push(Event::ObjectCreated {
            id,
            item,
            owner: house,
            location,
        });
        Some(id)
    }

    /// Places a structure without validating the location.
    ///
    /// Concrete slabs turn rock into owned concrete and create no object. A
    /// new refinery comes with a free harvester.
    pub fn place_structure(
        &mut self,
        house: HouseId,
        item: ItemId,
        origin: Coord,
        out_events: &mut Vec<Event>,
    ) -> Option<ObjectId> {
        let id = self.erect_structure(house, item, origin, out_events)?;
        if item == ItemId::Refinery {
            let _ = self.free_harvester(house, id, out_events);
        }
        Some(id)
    }

    /// Places a structure like [`GameContext::place_structure`] but without
    /// the free harvester of a refinery.
    pub fn erect_structure(
        &mut self,
        house: HouseId,
        item: ItemId,
        origin: Coord,
        out_events: &mut Vec<Event>,
    ) -> Option<ObjectId> {
        if !item.is_structure() {
            return None;
        }
        let size = item.footprint();
        if !self.map.tile_exists(origin.x, origin.y)
            || !self
                .map
                .tile_exists(origin.x + size.width - 1, origin.y + size.height - 1)
        {
            return None;
        }

        if item.is_slab() {
            self.lay_concrete(house, origin, size, out_events);
            return None;
        }

        let id = self.objects.allocate_id();
        let mut structure =
            GameObject::new_structure(id, item, house, origin, self.rules.stats(item));
        let _ = self.map.assign_object(&mut structure);
        self.objects.insert(structure);
        let storage = self.rules.storage_of(item);
        self.house_entry(house).increment_structures(item, storage);
        self.view_from(id);
        log::debug!("{house:?} placed {item:?} {id:?} at {origin:?}");
        out_events.push(Event::StructurePlaced {
            id,
            item,
            owner: house,
            origin,
        });
        Some(id)
    }

    fn lay_concrete(
        &mut self,
        house: HouseId,
        origin: Coord,
        size: FootprintSize,
        out_events: &mut Vec<Event>,
    ) {
        self.map.for_each_mut(
            origin.x,
            origin.y,
            origin.x + size.width,
            origin.y + size.height,
            |tile| {
                if tile.is_rock() && !tile.is_mountain() {
                    tile.set_terrain(TerrainType::Slab);
                    tile.set_owner(Some(house));
                }
            },
        );
        out_events.push(Event::ConcreteLaid {
            owner: house,
            origin,
            size,
        });
    }

    /// Validates and places a structure on behalf of a house.
    ///
    /// A rejected request leaves the world untouched and reports the reason
    /// through a [`Event::StructurePlacementRejected`] event.
    pub fn try_place_structure(
        &mut self,
        house: HouseId,
        item: ItemId,
        origin: Coord,
        out_events: &mut Vec<Event>,
    ) -> Result<Option<ObjectId>, PlacementError> {
        match self.check_placement(house, item, origin) {
            Ok(()) => Ok(self.place_structure(house, item, origin, out_events)),
            Err(reason) => {
                log::debug!("{house:?} may not place {item:?} at {origin:?}: {reason:?}");
                out_events.push(Event::StructurePlacementRejected {
                    house,
                    item,
                    origin,
                    reason,
                });
                Err(reason)
            }
        }
    }

    fn check_placement(
        &self,
        house: HouseId,
        item: ItemId,
        origin: Coord,
    ) -> Result<(), PlacementError> {
        if !item.is_structure() {
            return Err(PlacementError::NotAStructure);
        }
        let size = item.footprint();
        let query = PlacementQuery {
            origin,
            size,
            concrete_required: self.rules.concrete_required && !item.is_slab(),
            house: Some(house),
            build_range: self.rules.build_range,
            ignore_units: false,
        };
        self.map.check_structure_placement(&self.objects, &query)?;
        if !item.is_slab()
            && !self
                .map
                .is_a_structure_gap(&self.objects, origin.x, origin.y, size.width, size.height)
        {
            return Err(PlacementError::NoStructureGap);
        }
        Ok(())
    }

    /// Puts a free harvester down next to a refinery.
    ///
    /// The harvester starts in harvesting mode so it immediately looks for
    /// spice.
    pub fn free_harvester(
        &mut self,
        house: HouseId,
        refinery: ObjectId,
        out_events: &mut Vec<Event>,
    ) -> Option<ObjectId> {
        let (origin, size) = {
            let structure = self.objects.get(refinery)?;
            (structure.location, structure.footprint())
        };
        let Some(location) =
            self.map
                .find_deploy_spot(origin, size, None, Mobility::Ground, &mut self.random)
        else {
            log::warn!("no room to deploy a harvester next to refinery {refinery:?}");
            return None;
        };
        let harvester = self.create_unit(house, ItemId::Harvester, location, out_events)?;
        if let Some(state) = self
            .objects
            .get_mut(harvester)
            .and_then(GameObject::as_harvester_mut)
        {
            state.harvesting_mode = true;
        }
        out_events.push(Event::HarvesterDeployed {
            harvester,
            refinery,
            location,
        });
        Some(harvester)
    }

    /// Reserves a slot for `unit` at a refinery or repair yard.
    ///
    /// Any earlier reservation of the unit is released first.
    pub fn book(&mut self, unit: ObjectId, structure: ObjectId) -> bool {
        self.unbook(unit);
        let Some(bookable) = self
            .objects
            .get_mut(structure)
            .and_then(GameObject::as_bookable_mut)
        else {
            return false;
        };
        bookable.book();
        if let Some(state) = self.objects.get_mut(unit).and_then(GameObject::as_unit_mut) {
            state.booking = Some(structure);
        }
        true
    }

    /// Releases the reservation `unit` holds, if any.
    pub fn unbook(&mut self, unit: ObjectId) {
        let Some(structure) = self
            .objects
            .get_mut(unit)
            .and_then(GameObject::as_unit_mut)
            .and_then(|state| state.booking.take())
        else {
            return;
        };
        if let Some(bookable) = self
            .objects
            .get_mut(structure)
            .and_then(GameObject::as_bookable_mut)
        {
            bookable.unbook();
        }
    }

    /// Removes an object from the world.
    ///
    /// Destroying a refinery or repair yard also destroys the unit inside
    /// it. Ground units leave a wreck on their tile and harvesters spill
    /// their load onto the surrounding sand.
    pub fn destroy_object(&mut self, id: ObjectId, out_events: &mut Vec<Event>) {
        self.unbook(id);
        let Some(object) = self.objects.remove(id) else {
            return;
        };
        self.map.remove_object_from_map(id);

        match &object.kind {
            ObjectKind::Structure(structure) => {
                let size = structure.size;
                let owner = object.owner;
                self.map.for_each_mut(
                    object.location.x,
                    object.location.y,
                    object.location.x + size.width,
                    object.location.y + size.height,
                    |tile| {
                        if tile.owner() == Some(owner) && !tile.has_a_ground_object() {
                            tile.set_owner(None);
                        }
                    },
                );
                let storage = self.rules.storage_of(object.item);
                self.house_entry(owner)
                    .decrement_structures(object.item, storage);

                let occupant = match &structure.role {
                    StructureRole::Refinery(refinery) => refinery.docked_harvester,
                    StructureRole::RepairYard(yard) => yard.repair_unit,
                    StructureRole::Plain | StructureRole::Silo => None,
                };
                if let Some(occupant) = occupant {
                    self.destroy_object(occupant, out_events);
                }
                self.forget_structure(id);
            }
            ObjectKind::Unit(unit) => {
                if unit.active {
                    let spilled = match &unit.role {
                        UnitRole::Harvester(harvester) => harvester.spice,
                        _ => FixedPoint::ZERO,
                    };
                    let leaves_wreck = !matches!(unit.role, UnitRole::Air | UnitRole::Sandworm);
                    if let Some(tile) = self
                        .map
                        .try_get_tile_mut(object.location.x, object.location.y)
                    {
                        if leaves_wreck {
                            let on_sand = tile.is_sand() || tile.is_spice();
                            tile.assign_dead_unit(DeadUnitDecal {
                                item: object.item,
                                house: object.owner,
                                on_sand,
                                real_pos: object.real_pos.rounded(),
                            });
                        }
                    }
                    if spilled > FixedPoint::ZERO {
                        self.map.diffuse_spice(object.location, spilled);
                    }
                }
                self.house_entry(object.owner).decrement_units(object.item);
                self.release_occupancy(id);
            }
        }

        log::debug!("{:?} {:?} {id:?} destroyed", object.owner, object.item);
        out_events.push(Event::ObjectDestroyed {
            id,
            item: object.item,
            owner: object.owner,
            location: object.location,
        });
    }

    fn forget_structure(&mut self, structure: ObjectId) {
        for id in self.objects.ids() {
            let Some(unit) = self.objects.get_mut(id).and_then(GameObject::as_unit_mut) else {
                continue;
            };
            if unit.target == Some(structure) {
                unit.target = None;
            }
            if unit.booking == Some(structure) {
                unit.booking = None;
            }
        }
    }

    fn release_occupancy(&mut self, unit: ObjectId) {
        for id in self.objects.ids() {
            let Some(structure) = self
                .objects
                .get_mut(id)
                .and_then(GameObject::as_structure_mut)
            else {
                continue;
            };
            match &mut structure.role {
                StructureRole::Refinery(refinery) if refinery.docked_harvester == Some(unit) => {
                    refinery.docked_harvester = None;
                    refinery.extracting = false;
                }
                StructureRole::RepairYard(yard) if yard.repair_unit == Some(unit) => {
                    yard.repair_unit = None;
                }
                _ => {}
            }
        }
    }

    /// Subtracts health from an object, destroying it at zero.
    pub fn handle_damage(&mut self, id: ObjectId, amount: FixedPoint, out_events: &mut Vec<Event>) {
        if amount <= FixedPoint::ZERO {
            return;
        }
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        object.health = (object.health - amount).max(FixedPoint::ZERO);
        if object.health == FixedPoint::ZERO {
            self.destroy_object(id, out_events);
        }
    }

    /// Hands a unit over to `house` for the configured number of cycles.
    ///
    /// Structures, sandworms and units already owned by `house` are
    /// unaffected.
    pub fn deviate(&mut self, id: ObjectId, house: HouseId, out_events: &mut Vec<Event>) {
        let deviation_cycles = self.rules.deviation_cycles;
        let Some(object) = self.objects.get(id) else {
            return;
        };
        if object.is_structure() || object.item == ItemId::Sandworm || object.owner == house {
            return;
        }
        let from = object.owner;
        let item = object.item;

        self.unbook(id);
        if let Some(object) = self.objects.get_mut(id) {
            object.owner = house;
            if let Some(unit) = object.as_unit_mut() {
                unit.deviation_timer = Some(deviation_cycles);
                unit.target = None;
                unit.destination = None;
                if let UnitRole::Harvester(harvester) = &mut unit.role {
                    harvester.returning = false;
                }
            }
        }
        self.house_entry(from).decrement_units(item);
        self.house_entry(house).increment_units(item);
        self.view_from(id);
        log::debug!("{id:?} deviated from {from:?} to {house:?}");
        out_events.push(Event::UnitDeviated {
            unit: id,
            from,
            to: house,
        });
    }

    /// Returns a deviated unit to the house that built it.
    pub fn revert_deviation(&mut self, id: ObjectId, out_events: &mut Vec<Event>) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        let from = object.owner;
        let to = object.original_house;
        let item = object.item;
        object.owner = to;
        if let Some(unit) = object.as_unit_mut() {
            unit.deviation_timer = None;
            unit.target = None;
        }
        if from != to {
            self.house_entry(from).decrement_units(item);
            self.house_entry(to).increment_units(item);
        }
        out_events.push(Event::UnitReverted { unit: id, to });
    }

    /// Sets off the bloom on `location`, if there is one.
    ///
    /// An ordinary bloom leaves a spice field. A special bloom rewards
    /// `house` with credits, a free trike or a smaller spice field.
    pub fn trigger_bloom(
        &mut self,
        location: Coord,
        house: Option<HouseId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(kind) = self
            .map
            .try_get_tile_mut(location.x, location.y)
            .and_then(|tile| tile.trigger_bloom())
        else {
            return;
        };
        log::debug!("{kind:?} bloom triggered on {location:?} by {house:?}");
        out_events.push(Event::BloomTriggered {
            location,
            kind,
            house,
        });

        match (kind, house) {
            (BloomKind::Special, Some(house)) => match self.random.rand(0, 2) {
                0 => {
                    let amount = fix(
                        self.random
                            .rand(SPECIAL_BLOOM_MIN_CREDITS, SPECIAL_BLOOM_MAX_CREDITS),
                    );
                    self.house_entry(house).return_credits(amount);
                }
                1 => {
                    let spot = self.map.find_deploy_spot(
                        location,
                        FootprintSize::SINGLE,
                        None,
                        Mobility::Ground,
                        &mut self.random,
                    );
                    if let Some(spot) = spot {
                        let _ = self.create_unit(house, ItemId::Trike, spot, out_events);
                    }
                }
                _ => self.map.create_spice_field(
                    location,
                    SPECIAL_BLOOM_FIELD_RADIUS,
                    false,
                    &mut self.random,
                ),
            },
            (BloomKind::Special, None) => self.map.create_spice_field(
                location,
                SPECIAL_BLOOM_FIELD_RADIUS,
                false,
                &mut self.random,
            ),
            (BloomKind::Spice, _) => {
                self.map
                    .create_spice_field(location, BLOOM_FIELD_RADIUS, false, &mut self.random)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rock_and_sand() -> GameContext {
        let map = Map::from_fn(12, 12, |location| {
            if location.x < 6 {
                TerrainType::Rock
            } else {
                TerrainType::Sand
            }
        });
        let mut context = GameContext::new(map, Rules::default(), 7);
        context.add_house(HouseId::Atreides, TeamId::new(0), fix(1000));
        context.add_house(HouseId::Ordos, TeamId::new(1), fix(1000));
        context
    }

    fn bookings(context: &GameContext, refinery: ObjectId) -> Option<u32> {
        context
            .objects
            .get(refinery)
            .and_then(GameObject::as_refinery)
            .map(|state| state.bookings)
    }

    #[test]
    fn created_units_are_indexed_counted_and_see() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let id = context
            .create_unit(HouseId::Atreides, ItemId::Trike, Coord::new(3, 3), &mut events)
            .expect("trike");

        assert!(context.map.get_tile(3, 3).contains(id));
        assert_eq!(
            context.house(HouseId::Atreides).map(|h| h.num_units()),
            Some(1)
        );
        assert!(context
            .map
            .get_tile(3, 3)
            .is_explored_by_team(TeamId::new(0)));
        assert!(matches!(events[0], Event::ObjectCreated { id: created, .. } if created == id));
    }

    #[test]
    fn sixth_infantry_does_not_fit() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        for _ in 0..5 {
            assert!(context
                .create_unit(HouseId::Atreides, ItemId::Soldier, Coord::new(2, 2), &mut events)
                .is_some());
        }
        assert!(context
            .create_unit(HouseId::Atreides, ItemId::Soldier, Coord::new(2, 2), &mut events)
            .is_none());
        assert_eq!(context.map.get_tile(2, 2).infantry().len(), 5);
    }

    #[test]
    fn refinery_comes_with_a_harvester() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let refinery = context
            .place_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(1, 1), &mut events)
            .expect("refinery");

        let harvesters: Vec<_> = context
            .objects
            .iter()
            .filter(|object| object.item == ItemId::Harvester)
            .collect();
        assert_eq!(harvesters.len(), 1);
        assert!(!context.objects.get(refinery).expect("refinery").covers(harvesters[0].location));
        assert_eq!(
            context.house(HouseId::Atreides).map(House::capacity),
            Some(context.rules.refinery_capacity)
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HarvesterDeployed { .. })));
    }

    #[test]
    fn slabs_become_owned_concrete() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        assert!(context
            .place_structure(HouseId::Atreides, ItemId::Slab4, Coord::new(0, 0), &mut events)
            .is_none());
        assert!(context.map.get_tile(1, 1).is_concrete());
        assert_eq!(context.map.get_tile(1, 1).owner(), Some(HouseId::Atreides));
        assert!(context.objects.is_empty());
    }

    #[test]
    fn rejected_placement_reports_the_reason() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let result = context.try_place_structure(
            HouseId::Atreides,
            ItemId::Silo,
            Coord::new(7, 7),
            &mut events,
        );
        assert_eq!(result, Err(PlacementError::UnsuitableTerrain));
        assert!(matches!(
            events.last(),
            Some(Event::StructurePlacementRejected {
                reason: PlacementError::UnsuitableTerrain,
                ..
            })
        ));
    }

    #[test]
    fn destroying_a_refinery_takes_the_docked_harvester_along() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let refinery = context
            .place_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(1, 1), &mut events)
            .expect("refinery");
        let harvester = context
            .objects
            .iter()
            .find(|object| object.item == ItemId::Harvester)
            .map(|object| object.id)
            .expect("harvester");
        let harvester_object = context.objects.get(harvester).cloned().expect("harvester");
        context.map.unassign_object(&harvester_object);
        if let Some(unit) = context.objects.get_mut(harvester).and_then(GameObject::as_unit_mut) {
            unit.active = false;
        }
        if let Some(state) = context
            .objects
            .get_mut(refinery)
            .and_then(GameObject::as_refinery_mut)
        {
            state.docked_harvester = Some(harvester);
        }

        context.destroy_object(refinery, &mut events);

        assert!(!context.objects.contains(refinery));
        assert!(!context.objects.contains(harvester));
        assert_eq!(context.map.get_tile(1, 1).owner(), None);
        let house = context.house(HouseId::Atreides).expect("house");
        assert_eq!(house.num_units(), 0);
        assert_eq!(house.num_structures(), 0);
    }

    #[test]
    fn destroyed_harvester_spills_spice_and_leaves_a_wreck() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let harvester = context
            .create_unit(HouseId::Ordos, ItemId::Harvester, Coord::new(9, 9), &mut events)
            .expect("harvester");
        if let Some(state) = context
            .objects
            .get_mut(harvester)
            .and_then(GameObject::as_harvester_mut)
        {
            state.spice = fix(90);
        }

        context.handle_damage(harvester, fix(100_000), &mut events);

        assert!(!context.objects.contains(harvester));
        assert_eq!(context.map.get_tile(9, 9).dead_units().len(), 1);
        let mut spilled = FixedPoint::ZERO;
        context.map.for_each(8, 8, 11, 11, |tile| spilled += tile.spice());
        assert_eq!(spilled, fix(90));
    }

    #[test]
    fn booking_follows_the_unit() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let refinery = context
            .place_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(1, 1), &mut events)
            .expect("refinery");
        let trike = context
            .create_unit(HouseId::Atreides, ItemId::Trike, Coord::new(5, 5), &mut events)
            .expect("trike");

        assert!(context.book(trike, refinery));
        assert_eq!(bookings(&context, refinery), Some(1));
        context.destroy_object(trike, &mut events);
        assert_eq!(bookings(&context, refinery), Some(0));
    }

    #[test]
    fn deviation_moves_the_unit_between_houses() {
        let mut context = rock_and_sand();
        let mut events = Vec::new();
        let tank = context
            .create_unit(HouseId::Atreides, ItemId::Tank, Coord::new(4, 4), &mut events)
            .expect("tank");

        context.deviate(tank, HouseId::Ordos, &mut events);
        assert_eq!(context.objects.get(tank).map(|o| o.owner), Some(HouseId::Ordos));
        assert_eq!(context.house(HouseId::Ordos).map(|h| h.num_units()), Some(1));

        context.revert_deviation(tank, &mut events);
        assert_eq!(context.objects.get(tank).map(|o| o.owner), Some(HouseId::Atreides));
        assert_eq!(context.house(HouseId::Ordos).map(|h| h.num_units()), Some(0));
        assert_eq!(context.house(HouseId::Atreides).map(|h| h.num_units()), Some(1));
    }

    #[test]
    fn spice_bloom_leaves_a_field() {
        let mut context = rock_and_sand();
        context
            .map
            .get_tile_mut(9, 6)
            .set_terrain(TerrainType::SpiceBloom);
        let mut events = Vec::new();

        context.trigger_bloom(Coord::new(9, 6), Some(HouseId::Ordos), &mut events);

        assert!(!context.map.get_tile(9, 6).is_bloom());
        assert!(context.map.get_tile(9, 6).spice() > FixedPoint::ZERO);
        assert!(matches!(
            events[0],
            Event::BloomTriggered {
                kind: BloomKind::Spice,
                ..
            }
        ));
    }
}
