#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Infantry interaction with structures and blooms.
//!
//! Infantry ordered to capture walk up to an enemy structure and are
//! consumed when they reach it: a structure in the red health band changes
//! hands, a healthier one only takes chip damage. Infantry stepping on a
//! bloom sets it off.

use arrakis_core::{
    fix, round_to_i32, AttackMode, BloomKind, Coord, Event, FixedPoint, HouseId, ItemId,
    ObjectId,
};
use arrakis_world::{objects::StructureRole, GameContext, GameObject};

/// Largest distance between an infantry unit and the closest tile of the
/// structure it captures.
pub const CAPTURE_RANGE: FixedPoint = FixedPoint::from_bits(3 << 31);

/// Pure capture system; all state lives on the objects.
#[derive(Debug, Default)]
pub struct Capture;

impl Capture {
    /// Runs the capture check of an infantry unit standing still.
    pub fn update(&mut self, context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
        let Some(object) = context.objects.get(id) else {
            return;
        };
        let Some(unit) = object.as_unit() else {
            return;
        };
        if !object.is_infantry()
            || !unit.active
            || unit.moving
            || unit.attack_mode != AttackMode::Capture
        {
            return;
        }
        let Some(structure) = unit.target else {
            return;
        };
        let _ = check_capture(context, id, structure, out_events);
    }

    /// Reacts to an infantry unit entering `tile`.
    pub fn on_tile_entered(
        &mut self,
        context: &mut GameContext,
        id: ObjectId,
        tile: Coord,
        out_events: &mut Vec<Event>,
    ) {
        let Some(object) = context.objects.get(id) else {
            return;
        };
        if !object.is_infantry() {
            return;
        }
        let owner = object.owner;
        let Some(kind) = context
            .map
            .try_get_tile(tile.x, tile.y)
            .and_then(|tile| tile.terrain().bloom_kind())
        else {
            return;
        };

        context.trigger_bloom(tile, Some(owner), out_events);
        if kind == BloomKind::Spice {
            log::debug!("{id:?} set off a spice bloom on {tile:?} and died");
            context.destroy_object(id, out_events);
        }
    }
}

/// What an infantry unit did to the structure it reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The structure changed hands.
    Captured {
        /// Structure owned by the capturing house.
        replacement: ObjectId,
    },
    /// The structure was too healthy and only took damage.
    Damaged {
        /// Damage dealt.
        amount: i32,
    },
}

struct Snapshot {
    item: ItemId,
    origin: Coord,
    previous_owner: HouseId,
    original_house: HouseId,
    health: FixedPoint,
    occupant: Option<ObjectId>,
}

fn in_range(structure: &GameObject, location: Coord) -> bool {
    structure.closest_point(location).block_distance(location) <= CAPTURE_RANGE
}

/// Consumes the infantry unit `id` against `structure` if it stands next
/// to it.
///
/// Nothing changes unless every precondition holds: the unit can capture,
/// the structure belongs to another team and is within reach.
pub fn check_capture(
    context: &mut GameContext,
    id: ObjectId,
    structure: ObjectId,
    out_events: &mut Vec<Event>,
) -> Option<CaptureOutcome> {
    let capturer = context.objects.get(id)?;
    let target = context.objects.get(structure)?;
    if !capturer.item.can_capture() || !target.is_structure() {
        return None;
    }
    if context.team_of(capturer.owner) == context.team_of(target.owner) {
        return None;
    }
    if !in_range(target, capturer.location) {
        return None;
    }

    let house = capturer.owner;
    let outcome = if target.is_badly_damaged() {
        let snapshot = Snapshot {
            item: target.item,
            origin: target.location,
            previous_owner: target.owner,
            original_house: target.original_house,
            health: target.health,
            occupant: occupant_of(target),
        };
        let replacement = capture(context, id, structure, house, snapshot, out_events)?;
        CaptureOutcome::Captured { replacement }
    } else {
        let amount = round_to_i32((target.health / 2).min(capturer.health * 2));
        context.handle_damage(structure, fix(amount), out_events);
        CaptureOutcome::Damaged { amount }
    };

    context.destroy_object(id, out_events);
    Some(outcome)
}

fn occupant_of(structure: &GameObject) -> Option<ObjectId> {
    match &structure.as_structure()?.role {
        StructureRole::Refinery(refinery) => refinery.docked_harvester,
        StructureRole::RepairYard(yard) => yard.repair_unit,
        _ => None,
    }
}

fn capture(
    context: &mut GameContext,
    capturer: ObjectId,
    structure: ObjectId,
    house: HouseId,
    snapshot: Snapshot,
    out_events: &mut Vec<Event>,
) -> Option<ObjectId> {
    let target = context.objects.get(structure)?;
    let mut consumed = Vec::new();
    let mut stranded = Vec::new();
    for object in context.objects.iter() {
        if object.id == capturer || !object.is_infantry() {
            continue;
        }
        let partner = object.as_unit().is_some_and(|unit| {
            unit.target == Some(structure) && unit.attack_mode == AttackMode::Capture
        });
        if target.covers(object.location) || (partner && in_range(target, object.location)) {
            consumed.push(object.id);
        } else if partner {
            stranded.push(object.id);
        }
    }
    for id in consumed {
        context.destroy_object(id, out_events);
    }
    for id in stranded {
        if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
            unit.target = None;
            unit.attack_mode = AttackMode::Guard;
        }
    }

    let share = credit_share(context, snapshot.item, snapshot.previous_owner);
    let taken = context
        .house_mut(snapshot.previous_owner)
        .map_or(FixedPoint::ZERO, |owner| owner.take_credits(share));

    if let Some(state) = context
        .objects
        .get_mut(structure)
        .and_then(GameObject::as_structure_mut)
    {
        match &mut state.role {
            StructureRole::Refinery(refinery) => refinery.docked_harvester = None,
            StructureRole::RepairYard(yard) => yard.repair_unit = None,
            _ => {}
        }
    }
    context.destroy_object(structure, out_events);

    let replacement = context.erect_structure(house, snapshot.item, snapshot.origin, out_events)?;
    if let Some(object) = context.objects.get_mut(replacement) {
        object.original_house = snapshot.original_house;
        object.health = snapshot.health;
    }
    if let Some(occupant) = snapshot.occupant {
        reattach(context, replacement, occupant, house);
    }

    if taken > FixedPoint::ZERO {
        if let Some(owner) = context.house_mut(house) {
            owner.add_credits(taken, false);
        }
        out_events.push(Event::CreditsTransferred {
            from: snapshot.previous_owner,
            to: house,
            amount: taken,
        });
    }

    log::info!(
        "{house:?} captured {:?} {structure:?} from {:?}",
        snapshot.item,
        snapshot.previous_owner
    );
    out_events.push(Event::StructureCaptured {
        previous: structure,
        replacement,
        item: snapshot.item,
        from: snapshot.previous_owner,
        to: house,
    });
    Some(replacement)
}

/// Stored credits of `owner` proportional to the storage the structure
/// provides.
fn credit_share(context: &GameContext, item: ItemId, owner: HouseId) -> FixedPoint {
    let storage = context.rules.storage_of(item);
    let Some(house) = context.house(owner) else {
        return FixedPoint::ZERO;
    };
    if storage <= FixedPoint::ZERO || house.capacity() <= FixedPoint::ZERO {
        return FixedPoint::ZERO;
    }
    house.stored_credits() * storage / house.capacity()
}

/// Moves the unit inside a captured refinery or repair yard over to the
/// capturing house and puts it back inside the replacement.
fn reattach(context: &mut GameContext, replacement: ObjectId, occupant: ObjectId, house: HouseId) {
    let Some(object) = context.objects.get_mut(occupant) else {
        return;
    };
    let previous_owner = object.owner;
    let item = object.item;
    object.owner = house;
    if let Some(unit) = object.as_unit_mut() {
        unit.target = Some(replacement);
    }
    if previous_owner != house {
        if let Some(owner) = context.house_mut(previous_owner) {
            owner.decrement_units(item);
        }
        if let Some(owner) = context.house_mut(house) {
            owner.increment_units(item);
        }
    }

    if let Some(state) = context
        .objects
        .get_mut(replacement)
        .and_then(GameObject::as_structure_mut)
    {
        match &mut state.role {
            StructureRole::Refinery(refinery) => {
                refinery.docked_harvester = Some(occupant);
                refinery.extracting = true;
            }
            StructureRole::RepairYard(yard) => yard.repair_unit = Some(occupant),
            _ => {}
        }
    }
    let _ = context.book(occupant, replacement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrakis_core::{TeamId, TerrainType};
    use arrakis_world::{Map, Rules};

    fn battlefield() -> GameContext {
        let mut context =
            GameContext::new(Map::new(14, 10, TerrainType::Rock), Rules::default(), 17);
        context.add_house(HouseId::Harkonnen, TeamId::new(1), fix(0));
        context.add_house(HouseId::Atreides, TeamId::new(0), fix(0));
        context
    }

    fn infantry(context: &mut GameContext, item: ItemId, at: Coord, target: ObjectId) -> ObjectId {
        let mut events = Vec::new();
        let id = context
            .create_unit(HouseId::Atreides, item, at, &mut events)
            .expect("infantry");
        if let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) {
            unit.attack_mode = AttackMode::Capture;
            unit.target = Some(target);
        }
        id
    }

    fn wound(context: &mut GameContext, id: ObjectId, ratio_percent: i32) {
        if let Some(object) = context.objects.get_mut(id) {
            object.health = fix(object.max_health * ratio_percent) / 100;
        }
    }

    #[test]
    fn healthy_structures_only_take_chip_damage() {
        let mut context = battlefield();
        let mut events = Vec::new();
        let silo = context
            .erect_structure(HouseId::Harkonnen, ItemId::Silo, Coord::new(5, 5), &mut events)
            .expect("silo");
        let soldier = infantry(&mut context, ItemId::Soldier, Coord::new(4, 5), silo);

        let outcome = check_capture(&mut context, soldier, silo, &mut events);

        assert_eq!(outcome, Some(CaptureOutcome::Damaged { amount: 40 }));
        let silo = context.objects.get(silo).expect("silo");
        assert_eq!(silo.owner, HouseId::Harkonnen);
        assert_eq!(silo.health, fix(110));
        assert!(context.objects.get(soldier).is_none());
    }

    #[test]
    fn badly_damaged_structures_change_hands_with_nearby_helpers() {
        let mut context = battlefield();
        let mut events = Vec::new();
        let barracks = context
            .erect_structure(HouseId::Harkonnen, ItemId::Barracks, Coord::new(5, 5), &mut events)
            .expect("barracks");
        wound(&mut context, barracks, 20);
        let health = context.objects.get(barracks).map(|object| object.health);
        let trooper = infantry(&mut context, ItemId::Trooper, Coord::new(7, 6), barracks);
        let helper = infantry(&mut context, ItemId::Soldier, Coord::new(4, 4), barracks);
        let straggler = infantry(&mut context, ItemId::Soldier, Coord::new(12, 2), barracks);
        let bystander = context
            .create_unit(HouseId::Atreides, ItemId::Soldier, Coord::new(4, 5), &mut events)
            .expect("bystander");

        let outcome = check_capture(&mut context, trooper, barracks, &mut events);

        let Some(CaptureOutcome::Captured { replacement }) = outcome else {
            panic!("expected a capture, got {outcome:?}");
        };
        let captured = context.objects.get(replacement).expect("replacement");
        assert_eq!(captured.owner, HouseId::Atreides);
        assert_eq!(captured.original_house, HouseId::Harkonnen);
        assert_eq!(captured.location, Coord::new(5, 5));
        assert_eq!(Some(captured.health), health);
        assert!(context.objects.get(barracks).is_none());
        assert!(context.objects.get(trooper).is_none());
        assert!(context.objects.get(helper).is_none());
        assert!(context.objects.get(straggler).is_some());
        assert!(context.objects.get(bystander).is_some());
        assert_eq!(
            context.house(HouseId::Harkonnen).map(|house| house.structure_count(ItemId::Barracks)),
            Some(0)
        );
        assert_eq!(
            context.house(HouseId::Atreides).map(|house| house.structure_count(ItemId::Barracks)),
            Some(1)
        );
        assert!(events.iter().any(|event| matches!(
            event,
            Event::StructureCaptured { previous, to: HouseId::Atreides, .. }
                if *previous == barracks
        )));
    }

    #[test]
    fn distant_capturers_survive_and_stand_down() {
        let mut context =
            GameContext::new(Map::new(40, 10, TerrainType::Rock), Rules::default(), 17);
        context.add_house(HouseId::Harkonnen, TeamId::new(1), fix(0));
        context.add_house(HouseId::Atreides, TeamId::new(0), fix(0));
        let mut events = Vec::new();
        let barracks = context
            .erect_structure(HouseId::Harkonnen, ItemId::Barracks, Coord::new(5, 5), &mut events)
            .expect("barracks");
        wound(&mut context, barracks, 10);
        let near = infantry(&mut context, ItemId::Soldier, Coord::new(4, 5), barracks);
        let far = infantry(&mut context, ItemId::Soldier, Coord::new(38, 9), barracks);

        let outcome = check_capture(&mut context, near, barracks, &mut events);

        assert!(matches!(outcome, Some(CaptureOutcome::Captured { .. })));
        assert!(context.objects.get(near).is_none());
        let survivor = context
            .objects
            .get(far)
            .and_then(GameObject::as_unit)
            .expect("distant soldier survives");
        assert_eq!(survivor.target, None);
        assert_eq!(survivor.attack_mode, AttackMode::Guard);
        assert!(context.map.get_tile(38, 9).contains(far));
    }

    #[test]
    fn captured_refinery_keeps_its_harvester_and_a_credit_share() {
        let mut context = battlefield();
        let mut events = Vec::new();
        let refinery = context
            .erect_structure(HouseId::Harkonnen, ItemId::Refinery, Coord::new(5, 5), &mut events)
            .expect("refinery");
        let _ = context.erect_structure(
            HouseId::Harkonnen,
            ItemId::Silo,
            Coord::new(1, 1),
            &mut events,
        );
        if let Some(house) = context.house_mut(HouseId::Harkonnen) {
            house.add_credits(fix(800), true);
        }
        let harvester = context
            .create_unit(HouseId::Harkonnen, ItemId::Harvester, Coord::new(9, 5), &mut events)
            .expect("harvester");
        if let Some(object) = context.objects.get_mut(harvester) {
            context.map.unassign_object(object);
            if let Some(unit) = object.as_unit_mut() {
                unit.active = false;
            }
        }
        if let Some(state) = context
            .objects
            .get_mut(refinery)
            .and_then(GameObject::as_refinery_mut)
        {
            state.docked_harvester = Some(harvester);
        }
        wound(&mut context, refinery, 10);
        let soldier = infantry(&mut context, ItemId::Soldier, Coord::new(4, 5), refinery);

        let outcome = check_capture(&mut context, soldier, refinery, &mut events);

        let Some(CaptureOutcome::Captured { replacement }) = outcome else {
            panic!("expected a capture, got {outcome:?}");
        };
        let state = context
            .objects
            .get(replacement)
            .and_then(GameObject::as_refinery)
            .expect("refinery");
        assert_eq!(state.docked_harvester, Some(harvester));
        assert_eq!(state.bookings, 1);
        let harvester = context.objects.get(harvester).expect("harvester survives");
        assert_eq!(harvester.owner, HouseId::Atreides);
        assert_eq!(context.house(HouseId::Harkonnen).map(|house| house.num_units()), Some(0));
        assert_eq!(context.house(HouseId::Atreides).map(|house| house.num_units()), Some(1));

        assert_eq!(
            context.house(HouseId::Harkonnen).map(|house| house.stored_credits()),
            Some(fix(400))
        );
        assert_eq!(context.house(HouseId::Atreides).map(|house| house.credits()), Some(fix(400)));
        assert!(events.contains(&Event::CreditsTransferred {
            from: HouseId::Harkonnen,
            to: HouseId::Atreides,
            amount: fix(400),
        }));
    }

    #[test]
    fn out_of_reach_or_friendly_targets_change_nothing() {
        let mut context = battlefield();
        let mut events = Vec::new();
        let enemy = context
            .erect_structure(HouseId::Harkonnen, ItemId::Silo, Coord::new(5, 5), &mut events)
            .expect("silo");
        let own = context
            .erect_structure(HouseId::Atreides, ItemId::Silo, Coord::new(10, 1), &mut events)
            .expect("silo");
        wound(&mut context, enemy, 10);
        wound(&mut context, own, 10);
        let far = infantry(&mut context, ItemId::Soldier, Coord::new(1, 5), enemy);
        let near_own = infantry(&mut context, ItemId::Soldier, Coord::new(9, 1), own);
        let snapshot = context.clone();
        let mut quiet = Vec::new();

        assert_eq!(check_capture(&mut context, far, enemy, &mut quiet), None);
        assert_eq!(check_capture(&mut context, near_own, own, &mut quiet), None);

        assert!(quiet.is_empty());
        assert_eq!(context, snapshot);
    }

    #[test]
    fn moving_infantry_does_not_capture() {
        let mut context = battlefield();
        let mut events = Vec::new();
        let silo = context
            .erect_structure(HouseId::Harkonnen, ItemId::Silo, Coord::new(5, 5), &mut events)
            .expect("silo");
        let soldier = infantry(&mut context, ItemId::Soldier, Coord::new(4, 5), silo);
        if let Some(unit) = context.objects.get_mut(soldier).and_then(GameObject::as_unit_mut) {
            unit.moving = true;
        }

        Capture.update(&mut context, soldier, &mut events);
        assert!(context.objects.get(soldier).is_some());

        if let Some(unit) = context.objects.get_mut(soldier).and_then(GameObject::as_unit_mut) {
            unit.moving = false;
        }
        Capture.update(&mut context, soldier, &mut events);
        assert!(context.objects.get(soldier).is_none());
    }

    #[test]
    fn stepping_on_a_spice_bloom_is_fatal() {
        let mut context = battlefield();
        context.map.get_tile_mut(3, 3).set_terrain(TerrainType::SpiceBloom);
        context.map.get_tile_mut(8, 8).set_terrain(TerrainType::SpecialBloom);
        let mut events = Vec::new();
        let unlucky = context
            .create_unit(HouseId::Atreides, ItemId::Soldier, Coord::new(3, 3), &mut events)
            .expect("soldier");
        let lucky = context
            .create_unit(HouseId::Atreides, ItemId::Trooper, Coord::new(8, 8), &mut events)
            .expect("trooper");

        Capture.on_tile_entered(&mut context, unlucky, Coord::new(3, 3), &mut events);
        Capture.on_tile_entered(&mut context, lucky, Coord::new(8, 8), &mut events);

        assert!(context.objects.get(unlucky).is_none());
        assert!(context.objects.get(lucky).is_some());
        assert!(context.map.get_tile(3, 3).terrain().bloom_kind().is_none());
        assert!(context.map.get_tile(8, 8).terrain().bloom_kind().is_none());
        let blooms = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::BloomTriggered {
                        house: Some(HouseId::Atreides),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(blooms, 2);
    }
}
