#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that routes units and moves them between
//! tiles.
//!
//! A unit standing still picks the next tile of its route and starts moving
//! toward it. Once it is more than half a tile away from the centre of the
//! tile it leaves, it is taken off that tile and put on the next one. A unit
//! that finds the next tile taken at that moment turns back.

use arrakis_core::{
    fix, fixed_sqrt, Coord, Facing, FixedPoint, InfantrySlot, ObjectId, WorldPoint, TILESIZE,
};
use arrakis_world::{objects::UnitState, GameContext, GameObject, Mobility, ObjectManager, Tile};

/// What happened to a unit during one movement update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Tile the unit crossed into during the update.
    pub entered: Option<Coord>,
    /// Whether the unit came to rest during the update.
    pub arrived: bool,
}

/// Pure movement system; all state lives on the units.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Advances one unit by one cycle.
    pub fn update(&mut self, context: &mut GameContext, id: ObjectId) -> MoveReport {
        let mut report = MoveReport::default();
        let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) else {
            return report;
        };
        if !unit.active || !unit.has_speed() {
            return report;
        }
        unit.just_stopped_moving = false;
        let moving = unit.moving;

        if !moving {
            navigate(context, id);
        }
        if is_moving(&context.objects, id) {
            integrate(context, id, &mut report);
        }
        report
    }
}

fn is_moving(objects: &ObjectManager, id: ObjectId) -> bool {
    objects
        .get(id)
        .and_then(GameObject::as_unit)
        .is_some_and(|unit| unit.moving)
}

fn holds_structure(objects: &ObjectManager, tile: &Tile) -> bool {
    tile.non_infantry_ground_objects()
        .iter()
        .any(|id| objects.get(*id).is_some_and(GameObject::is_structure))
}

/// Route from `from` toward `to` for units of the given mobility.
///
/// Impassable terrain blocks every class but aircraft; structures block
/// everything that moves on the ground.
pub fn plan_route(
    context: &mut GameContext,
    from: Coord,
    to: Coord,
    mobility: Mobility,
) -> Vec<Coord> {
    let objects = &context.objects;
    context.map.find_path(from, to, |tile| {
        mobility.is_impassable(tile)
            || (mobility != Mobility::Air && holds_structure(objects, tile))
    })
}

fn slot_offset(slot: Option<InfantrySlot>) -> (i32, i32) {
    slot.map_or((0, 0), InfantrySlot::offset)
}

fn target_point(object: &GameObject) -> Option<WorldPoint> {
    let unit = object.as_unit()?;
    let next = unit.next_spot?;
    let slot = object.as_infantry().and_then(|infantry| infantry.tile_position);
    Some(WorldPoint::at_tile(next, slot_offset(slot)))
}

fn aim(unit: &mut UnitState, from: WorldPoint, to: WorldPoint) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = fixed_sqrt(dx * dx + dy * dy);
    if length == FixedPoint::ZERO {
        unit.x_speed = FixedPoint::ZERO;
        unit.y_speed = FixedPoint::ZERO;
        return;
    }
    unit.x_speed = dx * unit.max_speed / length;
    unit.y_speed = dy * unit.max_speed / length;
}

fn retarget(object: &mut GameObject) {
    let Some(target) = target_point(object) else {
        return;
    };
    let from = object.real_pos;
    if let Some(unit) = object.as_unit_mut() {
        aim(unit, from, target);
    }
}

fn navigate(context: &mut GameContext, id: ObjectId) {
    let Some(object) = context.objects.get(id) else {
        return;
    };
    let Some(unit) = object.as_unit() else {
        return;
    };
    let location = object.location;
    let Some(destination) = unit.destination else {
        return;
    };
    if destination == location {
        if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
            unit.destination = None;
            unit.clear_path();
        }
        return;
    }

    let mobility = Mobility::of(object.item);
    let current_slot = object.as_infantry().and_then(|infantry| infantry.tile_position);
    if unit.path.is_empty() {
        let route = plan_route(context, location, destination, mobility);
        let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) else {
            return;
        };
        if route.is_empty() {
            log::trace!("{id:?} has no route from {location:?} to {destination:?}");
            unit.destination = None;
            return;
        }
        unit.path = route.into();
    }

    let Some(next) = context
        .objects
        .get(id)
        .and_then(GameObject::as_unit)
        .and_then(|unit| unit.path.front().copied())
    else {
        return;
    };
    let enterable = context
        .map
        .try_get_tile(next.x, next.y)
        .filter(|tile| mobility.can_enter(tile));
    let Some(tile) = enterable else {
        if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
            if next == destination {
                unit.destination = None;
            }
            unit.clear_path();
        }
        return;
    };
    let next_slot = match mobility {
        Mobility::Foot => tile.free_infantry_slot(current_slot),
        _ => None,
    };

    let Some(object) = context.objects.get_mut(id) else {
        return;
    };
    if let Some(infantry) = object.as_infantry_mut() {
        infantry.old_tile_position = infantry.tile_position;
        infantry.tile_position = next_slot;
    }
    if let Some(unit) = object.as_unit_mut() {
        let _ = unit.path.pop_front();
        unit.moving = true;
        unit.next_spot = Some(next);
        unit.old_location = location;
        if let Some(facing) = Facing::between(location, next) {
            unit.facing = facing;
        }
    }
    retarget(object);
}

fn integrate(context: &mut GameContext, id: ObjectId, report: &mut MoveReport) {
    let Some(object) = context.objects.get_mut(id) else {
        return;
    };
    let Some(target) = target_point(object) else {
        return;
    };
    let half_speed = object.is_badly_damaged() && Mobility::of(object.item) != Mobility::Air;
    let Some(unit) = object.as_unit() else {
        return;
    };
    let (mut step_x, mut step_y) = (unit.x_speed, unit.y_speed);
    if half_speed {
        step_x /= 2;
        step_y /= 2;
    }

    let remaining_x = target.x - object.real_pos.x;
    let remaining_y = target.y - object.real_pos.y;
    let mut reached = remaining_x.abs() <= step_x.abs() && remaining_y.abs() <= step_y.abs();
    if reached {
        object.real_pos = target;
    } else {
        object.real_pos = WorldPoint::new(object.real_pos.x + step_x, object.real_pos.y + step_y);
    }

    let location = object.location;
    let next_spot = object.as_unit().and_then(|unit| unit.next_spot);
    if let Some(next) = next_spot.filter(|next| *next != location) {
        let anchor = location.tile_center();
        let threshold = fix(TILESIZE / 2);
        let left_old_tile = (object.real_pos.x - fix(anchor.x)).abs() > threshold
            || (object.real_pos.y - fix(anchor.y)).abs() > threshold;
        if left_old_tile {
            if cross(context, id, next) {
                report.entered = Some(next);
            } else {
                reached = false;
            }
        }
    }

    if reached {
        if let Some(object) = context.objects.get_mut(id) {
            if let Some(infantry) = object.as_infantry_mut() {
                infantry.old_tile_position = None;
            }
            if let Some(unit) = object.as_unit_mut() {
                unit.moving = false;
                unit.just_stopped_moving = true;
                unit.next_spot = None;
                unit.x_speed = FixedPoint::ZERO;
                unit.y_speed = FixedPoint::ZERO;
            }
            report.arrived = true;
        }
    }
}

/// Moves the unit's tile assignment to `next`, or turns it back when `next`
/// has been taken in the meantime. Returns whether the unit crossed.
fn cross(context: &mut GameContext, id: ObjectId, next: Coord) -> bool {
    let Some(object) = context.objects.get(id) else {
        return false;
    };
    let mobility = Mobility::of(object.item);
    let enterable = context
        .map
        .try_get_tile(next.x, next.y)
        .is_some_and(|tile| mobility.can_enter(tile));

    let Some(object) = context.objects.get_mut(id) else {
        return false;
    };
    if !enterable {
        turn_back(object);
        return false;
    }

    let old = object.location;
    context.map.unassign_object(object);
    object.location = next;
    if !context.map.assign_object(object) {
        object.location = old;
        let _ = context.map.assign_object(object);
        turn_back(object);
        return false;
    }
    retarget(object);

    if !matches!(mobility, Mobility::Air | Mobility::Underground) {
        context.view_from(id);
    }
    true
}

fn turn_back(object: &mut GameObject) {
    let location = object.location;
    log::trace!("{:?} turned back onto {location:?}", object.id);
    if let Some(infantry) = object.as_infantry_mut() {
        if let Some(old_slot) = infantry.old_tile_position.take() {
            infantry.tile_position = Some(old_slot);
        }
    }
    if let Some(unit) = object.as_unit_mut() {
        unit.next_spot = Some(location);
        unit.clear_path();
    }
    retarget(object);
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrakis_core::{HouseId, ItemId, TeamId, TerrainType};
    use arrakis_world::{Map, Rules};

    fn context(map: Map) -> GameContext {
        let mut context = GameContext::new(map, Rules::default(), 21);
        context.add_house(HouseId::Ordos, TeamId::new(0), fix(0));
        context
    }

    fn spawn(context: &mut GameContext, item: ItemId, at: Coord) -> ObjectId {
        let mut events = Vec::new();
        context
            .create_unit(HouseId::Ordos, item, at, &mut events)
            .expect("unit")
    }

    fn order(context: &mut GameContext, id: ObjectId, destination: Coord) {
        if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
            unit.destination = Some(destination);
        }
    }

    fn run(context: &mut GameContext, movement: &mut Movement, id: ObjectId, cycles: usize) {
        for _ in 0..cycles {
            let _ = movement.update(context, id);
        }
    }

    fn tiles_holding(context: &GameContext, id: ObjectId) -> usize {
        context
            .map
            .tiles()
            .iter()
            .filter(|tile| tile.contains(id))
            .count()
    }

    #[test]
    fn trike_reaches_its_destination_and_sees_on_the_way() {
        let mut context = context(Map::new(12, 4, TerrainType::Sand));
        let trike = spawn(&mut context, ItemId::Trike, Coord::new(0, 1));
        order(&mut context, trike, Coord::new(10, 1));
        let mut movement = Movement;

        for _ in 0..400 {
            let _ = movement.update(&mut context, trike);
            assert_eq!(tiles_holding(&context, trike), 1);
        }

        let object = context.objects.get(trike).expect("trike");
        assert_eq!(object.location, Coord::new(10, 1));
        assert_eq!(object.real_pos, WorldPoint::at_tile(Coord::new(10, 1), (0, 0)));
        assert!(context.map.get_tile(10, 1).contains(trike));
        assert!(context.map.get_tile(11, 1).is_explored_by_team(TeamId::new(0)));
        assert_eq!(object.as_unit().and_then(|unit| unit.destination), None);
    }

    #[test]
    fn crossing_happens_past_the_tile_border() {
        let mut context = context(Map::new(4, 1, TerrainType::Sand));
        let quad = spawn(&mut context, ItemId::Quad, Coord::new(0, 0));
        order(&mut context, quad, Coord::new(1, 0));
        let mut movement = Movement;

        let mut entered_at = None;
        for cycle in 0..200 {
            let report = movement.update(&mut context, quad);
            if report.entered.is_some() {
                entered_at = Some(cycle);
                let x = context.objects.get(quad).map(|o| o.real_pos.x).expect("quad");
                assert!(x > fix(TILESIZE));
                break;
            }
            assert!(context.map.get_tile(0, 0).contains(quad));
        }
        assert!(entered_at.is_some());
        assert!(context.map.get_tile(1, 0).contains(quad));
        assert!(!context.map.get_tile(0, 0).contains(quad));
    }

    #[test]
    fn standing_on_the_border_is_not_a_crossing() {
        let mut context = context(Map::new(4, 1, TerrainType::Sand));
        let trike = spawn(&mut context, ItemId::Trike, Coord::new(0, 0));
        order(&mut context, trike, Coord::new(1, 0));
        let mut movement = Movement;
        let border = fix(TILESIZE);

        for _ in 0..8 {
            assert_eq!(movement.update(&mut context, trike).entered, None);
        }
        let x = context.objects.get(trike).map(|o| o.real_pos.x).expect("trike");
        assert_eq!(x, border);
        assert!(context.map.get_tile(0, 0).contains(trike));

        assert_eq!(movement.update(&mut context, trike).entered, Some(Coord::new(1, 0)));
        assert!(context.map.get_tile(1, 0).contains(trike));
    }

    #[test]
    fn vehicles_route_around_mountains() {
        let map = Map::from_fn(7, 5, |location| {
            if location.x == 3 && location.y < 4 {
                TerrainType::Mountain
            } else {
                TerrainType::Sand
            }
        });
        let mut context = context(map);
        let tank = spawn(&mut context, ItemId::Tank, Coord::new(1, 1));
        order(&mut context, tank, Coord::new(5, 1));
        let mut movement = Movement;

        let mut visited = Vec::new();
        for _ in 0..3000 {
            let report = movement.update(&mut context, tank);
            visited.extend(report.entered);
        }

        assert_eq!(context.objects.get(tank).map(|o| o.location), Some(Coord::new(5, 1)));
        assert!(visited.contains(&Coord::new(3, 4)));
        assert!(visited.iter().all(|tile| !context.map.get_tile(tile.x, tile.y).is_mountain()));
    }

    #[test]
    fn infantry_take_a_free_slot_on_the_next_tile() {
        let mut context = context(Map::new(3, 1, TerrainType::Sand));
        let mut events = Vec::new();
        for _ in 0..4 {
            let _ =
                context.create_unit(HouseId::Ordos, ItemId::Soldier, Coord::new(1, 0), &mut events);
        }
        let walker = spawn(&mut context, ItemId::Soldier, Coord::new(0, 0));
        order(&mut context, walker, Coord::new(1, 0));
        let mut movement = Movement;

        run(&mut context, &mut movement, walker, 400);

        let object = context.objects.get(walker).expect("walker");
        assert_eq!(object.location, Coord::new(1, 0));
        let slot = object.as_infantry().and_then(|infantry| infantry.tile_position).expect("slot");
        assert_eq!(context.map.get_tile(1, 0).infantry_slot_of(walker), Some(slot));
        assert_eq!(object.real_pos, WorldPoint::at_tile(Coord::new(1, 0), slot.offset()));
        assert_eq!(context.map.get_tile(1, 0).infantry().len(), 5);
    }

    #[test]
    fn infantry_turn_back_when_the_tile_fills_up() {
        let mut context = context(Map::new(3, 1, TerrainType::Sand));
        let mut events = Vec::new();
        for _ in 0..4 {
            let _ =
                context.create_unit(HouseId::Ordos, ItemId::Soldier, Coord::new(1, 0), &mut events);
        }
        let walker = spawn(&mut context, ItemId::Soldier, Coord::new(0, 0));
        order(&mut context, walker, Coord::new(1, 0));
        let mut movement = Movement;

        let _ = movement.update(&mut context, walker);
        assert!(is_moving(&context.objects, walker));
        let _ = context.create_unit(HouseId::Ordos, ItemId::Trooper, Coord::new(1, 0), &mut events);

        run(&mut context, &mut movement, walker, 400);

        let object = context.objects.get(walker).expect("walker");
        assert_eq!(object.location, Coord::new(0, 0));
        assert!(context.map.get_tile(0, 0).contains(walker));
        assert!(!context.map.get_tile(1, 0).contains(walker));
        assert_eq!(context.map.get_tile(1, 0).infantry().len(), 5);
    }

    #[test]
    fn badly_damaged_units_move_at_half_speed() {
        let mut context = context(Map::new(6, 1, TerrainType::Sand));
        let healthy = spawn(&mut context, ItemId::Trike, Coord::new(0, 0));
        order(&mut context, healthy, Coord::new(5, 0));
        let mut movement = Movement;
        let _ = movement.update(&mut context, healthy);
        let _ = movement.update(&mut context, healthy);
        let full_step = context.objects.get(healthy).map(|o| o.real_pos.x).expect("trike")
            - WorldPoint::at_tile(Coord::new(0, 0), (0, 0)).x;

        let mut context2 = self::context(Map::new(6, 1, TerrainType::Sand));
        let wounded = spawn(&mut context2, ItemId::Trike, Coord::new(0, 0));
        if let Some(object) = context2.objects.get_mut(wounded) {
            object.health = fix(object.max_health) / 10;
        }
        order(&mut context2, wounded, Coord::new(5, 0));
        let _ = movement.update(&mut context2, wounded);
        let _ = movement.update(&mut context2, wounded);
        let half_step = context2.objects.get(wounded).map(|o| o.real_pos.x).expect("trike")
            - WorldPoint::at_tile(Coord::new(0, 0), (0, 0)).x;

        assert!(full_step > FixedPoint::ZERO);
        assert_eq!(half_step * 2, full_step);
    }

    #[test]
    fn unreachable_destinations_are_dropped() {
        let map = Map::from_fn(5, 5, |location| {
            if location.x == 2 {
                TerrainType::Mountain
            } else {
                TerrainType::Sand
            }
        });
        let mut context = context(map);
        let tank = spawn(&mut context, ItemId::Tank, Coord::new(0, 2));
        order(&mut context, tank, Coord::new(4, 2));
        let mut movement = Movement;

        run(&mut context, &mut movement, tank, 500);

        let object = context.objects.get(tank).expect("tank");
        assert_eq!(object.location, Coord::new(1, 2));
        assert_eq!(object.as_unit().and_then(|unit| unit.destination), None);
    }
}
