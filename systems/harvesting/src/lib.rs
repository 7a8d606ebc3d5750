#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Harvester and refinery behavior.
//!
//! A harvester in harvesting mode drives to the closest spice, extracts it
//! until its hold is full and then returns to the least booked refinery of
//! its house. A refinery takes one harvester at a time off the map, turns
//! its load into credits and puts it back down next to itself.

use arrakis_core::{Coord, Event, FixedPoint, ObjectId, WorldPoint};
use arrakis_world::{GameContext, GameObject, Mobility};

/// Pure harvesting system; all state lives on the objects.
#[derive(Debug, Default)]
pub struct Harvesting;

impl Harvesting {
    /// Runs one cycle for `id` if it is a harvester or a refinery.
    pub fn update(&mut self, context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
        let Some(object) = context.objects.get(id) else {
            return;
        };
        if object.as_harvester().is_some() {
            update_harvester(context, id, out_events);
        } else if object.as_refinery().is_some() {
            update_refinery(context, id, out_events);
        }
    }
}

/// Sends a harvester to the closest free spice tile.
///
/// Returns `false` when no spice is left anywhere.
pub fn seek_spice(context: &mut GameContext, id: ObjectId) -> bool {
    let Some(location) = context
        .objects
        .get(id)
        .filter(|object| object.as_harvester().is_some())
        .map(|object| object.location)
    else {
        return false;
    };
    let Some(spot) = context.map.find_spice(location, Some(id), &mut context.random) else {
        return false;
    };
    let Some(object) = context.objects.get_mut(id) else {
        return false;
    };
    if let Some(unit) = object.as_unit_mut() {
        unit.destination = Some(spot);
        unit.target = None;
        unit.clear_path();
    }
    if let Some(state) = object.as_harvester_mut() {
        state.harvesting_mode = true;
    }
    true
}

/// Refinery of the harvester's house with the fewest bookings, the closest
/// one among equals.
#[must_use]
pub fn choose_refinery(context: &GameContext, id: ObjectId) -> Option<ObjectId> {
    let harvester = context.objects.get(id)?;
    context
        .objects
        .iter()
        .filter(|object| object.owner == harvester.owner)
        .filter_map(|object| {
            let refinery = object.as_refinery()?;
            let distance = object
                .closest_point(harvester.location)
                .block_distance(harvester.location);
            Some(((refinery.bookings, distance), object.id))
        })
        .min()
        .map(|(_, refinery)| refinery)
}

/// Books a refinery for the harvester and heads toward it.
///
/// Returns `false` when the house owns no refinery; the harvester then keeps
/// its load and tries again later.
pub fn do_return(context: &mut GameContext, id: ObjectId) -> bool {
    if let Some(state) = context.objects.get_mut(id).and_then(GameObject::as_harvester_mut) {
        state.returning = true;
    }
    let Some(refinery) = choose_refinery(context, id) else {
        log::debug!("harvester {id:?} has no refinery to return to");
        return false;
    };
    let _ = context.book(id, refinery);
    let approach = context
        .objects
        .get(id)
        .map(|object| object.location)
        .and_then(|from| {
            context
                .objects
                .get(refinery)
                .map(|structure| structure.closest_point(from))
        });
    if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
        unit.target = Some(refinery);
        unit.destination = approach;
        unit.clear_path();
    }
    true
}

fn is_own_refinery(context: &GameContext, harvester: &GameObject, refinery: ObjectId) -> bool {
    context
        .objects
        .get(refinery)
        .is_some_and(|object| object.owner == harvester.owner && object.as_refinery().is_some())
}

fn is_next_to(structure: &GameObject, location: Coord) -> bool {
    structure.closest_point(location).maximum_distance(location) <= 1
}

fn update_harvester(context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
    let Some(object) = context.objects.get(id) else {
        return;
    };
    let (Some(unit), Some(state)) = (object.as_unit(), object.as_harvester().copied()) else {
        return;
    };
    if !unit.active || unit.moving {
        return;
    }
    let location = object.location;
    let destination = unit.destination;

    if state.returning {
        let refinery = unit
            .target
            .filter(|target| is_own_refinery(context, object, *target));
        let Some(refinery) = refinery else {
            let _ = do_return(context, id);
            return;
        };
        let adjacent = context
            .objects
            .get(refinery)
            .is_some_and(|structure| is_next_to(structure, location));
        if adjacent {
            let _ = dock(context, id, refinery, out_events);
        } else if destination.is_none() {
            let _ = do_return(context, id);
        }
        return;
    }

    if !state.harvesting_mode {
        return;
    }
    let capacity = context.rules.harvester_capacity;
    if state.spice >= capacity {
        let _ = do_return(context, id);
        return;
    }
    if destination.is_some_and(|destination| destination != location) {
        return;
    }

    let rate = context.rules.harvest_speed.min(capacity - state.spice);
    let extracted = context.map.harvest_spice(location, rate);
    if extracted > FixedPoint::ZERO {
        let full = context
            .objects
            .get_mut(id)
            .and_then(GameObject::as_harvester_mut)
            .map(|state| {
                state.spice += extracted;
                state.spice >= capacity
            })
            .unwrap_or(false);
        if full {
            log::debug!("harvester {id:?} is full");
            let _ = do_return(context, id);
        }
        return;
    }

    if seek_spice(context, id) {
        return;
    }
    if state.spice > FixedPoint::ZERO {
        let _ = do_return(context, id);
    } else if let Some(state) = context.objects.get_mut(id).and_then(GameObject::as_harvester_mut) {
        log::debug!("harvester {id:?} found no spice and stops harvesting");
        state.harvesting_mode = false;
    }
}

/// Takes a harvester off the map and into a free refinery.
fn dock(
    context: &mut GameContext,
    id: ObjectId,
    refinery: ObjectId,
    out_events: &mut Vec<Event>,
) -> bool {
    let free = context
        .objects
        .get(refinery)
        .and_then(GameObject::as_refinery)
        .is_some_and(|state| state.docked_harvester.is_none());
    if !free {
        return false;
    }

    let Some(object) = context.objects.get_mut(id) else {
        return false;
    };
    context.map.unassign_object(object);
    if let Some(unit) = object.as_unit_mut() {
        unit.active = false;
        unit.moving = false;
        unit.destination = None;
        unit.next_spot = None;
        unit.clear_path();
    }
    if let Some(state) = context
        .objects
        .get_mut(refinery)
        .and_then(GameObject::as_refinery_mut)
    {
        state.docked_harvester = Some(id);
        state.extracting = true;
    }
    log::debug!("harvester {id:?} docked at refinery {refinery:?}");
    out_events.push(Event::HarvesterDocked {
        harvester: id,
        refinery,
    });
    true
}

fn update_refinery(context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
    let Some(refinery) = context.objects.get(id) else {
        return;
    };
    let owner = refinery.owner;
    let Some(harvester) = refinery.as_refinery().and_then(|state| state.docked_harvester) else {
        return;
    };

    let unload_speed = context.rules.unload_speed;
    let unloaded = context
        .objects
        .get_mut(harvester)
        .and_then(GameObject::as_harvester_mut)
        .map(|state| (state.extract_spice(unload_speed), state.spice));
    let Some((amount, remaining)) = unloaded else {
        if let Some(state) = context.objects.get_mut(id).and_then(GameObject::as_refinery_mut) {
            state.docked_harvester = None;
            state.extracting = false;
        }
        return;
    };

    if let Some(house) = context.house_mut(owner) {
        house.add_credits(amount, true);
    }
    if let Some(state) = context.objects.get_mut(id).and_then(GameObject::as_refinery_mut) {
        state.extracting = amount > FixedPoint::ZERO;
    }
    if remaining == FixedPoint::ZERO {
        let _ = deploy_harvester(context, id, harvester, out_events);
    }
}

/// Puts an unloaded harvester back on the map beside its refinery and sends
/// it after spice again. Leaves it docked while no tile is free.
fn deploy_harvester(
    context: &mut GameContext,
    refinery: ObjectId,
    harvester: ObjectId,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some((origin, size)) = context
        .objects
        .get(refinery)
        .map(|structure| (structure.location, structure.footprint()))
    else {
        return false;
    };
    let Some(spot) =
        context
            .map
            .find_deploy_spot(origin, size, None, Mobility::Ground, &mut context.random)
    else {
        log::debug!("refinery {refinery:?} has no room to release harvester {harvester:?}");
        return false;
    };

    context.unbook(harvester);
    if let Some(state) = context
        .objects
        .get_mut(refinery)
        .and_then(GameObject::as_refinery_mut)
    {
        state.docked_harvester = None;
        state.extracting = false;
    }
    let Some(object) = context.objects.get_mut(harvester) else {
        return false;
    };
    object.location = spot;
    object.real_pos = WorldPoint::at_tile(spot, (0, 0));
    if let Some(unit) = object.as_unit_mut() {
        unit.active = true;
        unit.target = None;
        unit.destination = None;
        unit.old_location = spot;
    }
    if let Some(state) = object.as_harvester_mut() {
        state.returning = false;
        state.harvesting_mode = true;
    }
    let _ = context.map.assign_object(object);
    context.view_from(harvester);

    log::debug!("refinery {refinery:?} released harvester {harvester:?} at {spot:?}");
    out_events.push(Event::HarvesterDeployed {
        harvester,
        refinery,
        location: spot,
    });
    let _ = seek_spice(context, harvester);
    true
}
