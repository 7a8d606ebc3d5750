//! Repair yard docking, healing and release.

use arrakis_core::{fix, Coord, Event, ObjectId, WorldPoint};
use arrakis_world::{GameContext, GameObject, Mobility};

/// Takes a unit into the repair yard it booked once it stands next to it.
pub(crate) fn update_unit(context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
    let Some(object) = context.objects.get(id) else {
        return;
    };
    let Some(unit) = object.as_unit() else {
        return;
    };
    if !unit.active || unit.moving || object.is_infantry() {
        return;
    }
    let Some(yard) = unit.booking.filter(|booking| unit.target == Some(*booking)) else {
        return;
    };
    let location = object.location;
    let owner = object.owner;
    let ready = context.objects.get(yard).is_some_and(|structure| {
        structure.owner == owner
            && structure
                .as_repair_yard()
                .is_some_and(|state| state.repair_unit.is_none())
            && structure.closest_point(location).maximum_distance(location) <= 1
    });
    if !ready {
        return;
    }

    let Some(object) = context.objects.get_mut(id) else {
        return;
    };
    context.map.unassign_object(object);
    if let Some(unit) = object.as_unit_mut() {
        unit.active = false;
        unit.destination = None;
        unit.next_spot = None;
        unit.clear_path();
    }
    if let Some(state) = context
        .objects
        .get_mut(yard)
        .and_then(GameObject::as_repair_yard_mut)
    {
        state.repair_unit = Some(id);
    }
    log::debug!("{id:?} entered repair yard {yard:?}");
    out_events.push(Event::UnitDockedForRepair { unit: id, yard });
}

/// Heals the unit inside a repair yard and releases it once whole.
pub(crate) fn update_yard(context: &mut GameContext, yard: ObjectId, out_events: &mut Vec<Event>) {
    let Some(unit) = context
        .objects
        .get(yard)
        .and_then(GameObject::as_repair_yard)
        .and_then(|state| state.repair_unit)
    else {
        return;
    };
    let repair_speed = context.rules.repair_speed;
    let Some(object) = context.objects.get_mut(unit) else {
        return;
    };
    let max_health = fix(object.max_health);
    object.health = (object.health + repair_speed).min(max_health);
    if object.health < max_health {
        return;
    }
    let _ = release(context, yard, unit, out_events);
}

fn release(
    context: &mut GameContext,
    yard: ObjectId,
    unit: ObjectId,
    out_events: &mut Vec<Event>,
) -> Option<Coord> {
    let (origin, size) = context
        .objects
        .get(yard)
        .map(|structure| (structure.location, structure.footprint()))?;
    let Some(spot) =
        context
            .map
            .find_deploy_spot(origin, size, None, Mobility::Ground, &mut context.random)
    else {
        log::debug!("repair yard {yard:?} has no room to release {unit:?}");
        return None;
    };

    context.unbook(unit);
    if let Some(state) = context
        .objects
        .get_mut(yard)
        .and_then(GameObject::as_repair_yard_mut)
    {
        state.repair_unit = None;
    }
    let object = context.objects.get_mut(unit)?;
    object.location = spot;
    object.real_pos = WorldPoint::at_tile(spot, (0, 0));
    if let Some(state) = object.as_unit_mut() {
        state.active = true;
        state.target = None;
        state.old_location = spot;
    }
    let _ = context.map.assign_object(object);
    context.view_from(unit);
    log::debug!("{unit:?} left repair yard {yard:?} on {spot:?}");
    out_events.push(Event::UnitRepaired {
        unit,
        yard,
        location: spot,
    });
    Some(spot)
}
