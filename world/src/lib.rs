#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state of the Arrakis simulation.
//!
//! The world owns the tile map, the object arena and the houses. Systems
//! mutate it through [`GameContext`] and [`apply`]; adapters read it through
//! [`query`].

pub mod box_offsets;
pub mod context;
pub mod damage;
pub mod house;
pub mod map;
pub mod objects;
mod pathfinder;
pub mod persistence;
pub mod rules;
pub mod selection;
pub mod tile;

pub use box_offsets::{BoxOffsetTable, BoxOffsets};
pub use context::GameContext;
pub use house::House;
pub use map::{Map, Mobility, PlacementQuery, SearchResult};
pub use objects::{GameObject, ObjectKind, ObjectManager, StructureRole, UnitRole};
pub use persistence::PersistenceError;
pub use rules::{Rules, RulesError};
pub use selection::{Selection, SelectionRequest};
pub use tile::Tile;

use arrakis_core::{AttackMode, Command, Coord, Event, FixedPoint, ObjectId};

/// Executes a command against the world.
///
/// [`Command::Tick`] only advances the cycle counter; the per-object work of
/// a cycle is done by the simulation systems before they forward the tick.
/// Orders naming missing or unsuitable objects are ignored.
pub fn apply(context: &mut GameContext, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            context.cycle = context.cycle.wrapping_add(1);
            out_events.push(Event::CycleAdvanced {
                cycle: context.cycle,
            });
        }
        Command::PlaceStructure {
            house,
            item,
            origin,
        } => {
            let _ = context.try_place_structure(house, item, origin, out_events);
        }
        Command::MoveUnit { unit, destination } => {
            if !is_ground_unit(context, unit) {
                return;
            }
            context.unbook(unit);
            if let Some(object) = context.objects.get_mut(unit) {
                if let Some(state) = object.as_unit_mut() {
                    state.destination = Some(destination);
                    state.target = None;
                    state.clear_path();
                    if let UnitRole::Harvester(harvester) = &mut state.role {
                        harvester.harvesting_mode = false;
                        harvester.returning = false;
                    }
                }
            }
        }
        Command::HarvestAt { unit, destination } => {
            if context
                .objects
                .get(unit)
                .and_then(GameObject::as_harvester)
                .is_none()
            {
                return;
            }
            context.unbook(unit);
            if let Some(state) = context.objects.get_mut(unit).and_then(GameObject::as_unit_mut) {
                state.destination = Some(destination);
                state.target = None;
                state.clear_path();
                if let UnitRole::Harvester(harvester) = &mut state.role {
                    harvester.harvesting_mode = true;
                    harvester.returning = false;
                }
            }
        }
        Command::ReturnHarvester { unit } => {
            if let Some(harvester) = context
                .objects
                .get_mut(unit)
                .and_then(GameObject::as_harvester_mut)
            {
                if harvester.spice > FixedPoint::ZERO {
                    harvester.returning = true;
                }
            }
        }
        Command::CaptureStructure { unit, structure } => {
            order_capture(context, unit, structure);
        }
        Command::RepairUnit { unit, yard } => {
            order_repair(context, unit, yard);
        }
        Command::SetAttackMode { unit, mode } => {
            if let Some(state) = context.objects.get_mut(unit).and_then(GameObject::as_unit_mut) {
                state.attack_mode = mode;
            }
        }
        Command::Damage { blast } => context.damage(&blast, out_events),
    }
}

fn is_ground_unit(context: &GameContext, unit: ObjectId) -> bool {
    context.objects.get(unit).is_some_and(|object| {
        object.as_unit().is_some_and(|state| {
            state.active && !matches!(state.role, UnitRole::Air | UnitRole::Sandworm)
        })
    })
}

fn approach_point(context: &GameContext, unit: ObjectId, structure: ObjectId) -> Option<Coord> {
    let from = context.objects.get(unit)?.location;
    Some(context.objects.get(structure)?.closest_point(from))
}

fn order_capture(context: &mut GameContext, unit: ObjectId, structure: ObjectId) {
    let Some(infantry) = context.objects.get(unit) else {
        return;
    };
    let Some(target) = context.objects.get(structure) else {
        return;
    };
    if !infantry.item.can_capture() || !target.is_structure() || target.owner == infantry.owner {
        return;
    }
    let Some(destination) = approach_point(context, unit, structure) else {
        return;
    };
    if let Some(state) = context.objects.get_mut(unit).and_then(GameObject::as_unit_mut) {
        state.attack_mode = AttackMode::Capture;
        state.target = Some(structure);
        state.destination = Some(destination);
        state.clear_path();
    }
}

fn order_repair(context: &mut GameContext, unit: ObjectId, yard: ObjectId) {
    let Some(vehicle) = context.objects.get(unit) else {
        return;
    };
    let Some(repair_yard) = context.objects.get(yard) else {
        return;
    };
    let suitable = repair_yard.as_repair_yard().is_some()
        && repair_yard.owner == vehicle.owner
        && vehicle.is_active()
        && !vehicle.is_infantry()
        && is_ground_unit(context, unit);
    if !suitable {
        return;
    }
    let Some(destination) = approach_point(context, unit, yard) else {
        return;
    };
    let _ = context.book(unit, yard);
    if let Some(state) = context.objects.get_mut(unit).and_then(GameObject::as_unit_mut) {
        state.target = Some(yard);
        state.destination = Some(destination);
        state.clear_path();
    }
}

/// Read-only views of the world for adapters and reports.
pub mod query {
    use arrakis_core::{Coord, FixedPoint, HouseId, ObjectId, TeamId};

    use super::{GameContext, GameObject, Tile};

    /// Object with the given identifier.
    #[must_use]
    pub fn object(context: &GameContext, id: ObjectId) -> Option<&GameObject> {
        context.objects.get(id)
    }

    /// Objects currently owned by `house` in identifier order.
    #[must_use]
    pub fn objects_of(context: &GameContext, house: HouseId) -> Vec<&GameObject> {
        context
            .objects
            .iter()
            .filter(|object| object.owner == house)
            .collect()
    }

    /// Tile at `location`, if it lies on the map.
    #[must_use]
    pub fn tile(context: &GameContext, location: Coord) -> Option<&Tile> {
        context.map.try_get_tile(location.x, location.y)
    }

    /// Credits available to `house`, zero for unknown houses.
    #[must_use]
    pub fn credits(context: &GameContext, house: HouseId) -> FixedPoint {
        context
            .house(house)
            .map_or(FixedPoint::ZERO, |house| house.credits())
    }

    /// Spice lying on the map.
    #[must_use]
    pub fn spice_on_map(context: &GameContext) -> FixedPoint {
        context.map.tiles().iter().map(Tile::spice).sum()
    }

    /// Number of tiles `team` has explored.
    #[must_use]
    pub fn explored_tiles(context: &GameContext, team: TeamId) -> usize {
        context
            .map
            .tiles()
            .iter()
            .filter(|tile| tile.is_explored_by_team(team))
            .count()
    }
}
