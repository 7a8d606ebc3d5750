#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep cycle driver.
//!
//! One cycle visits every object that exists when the cycle starts, in
//! identifier order. Objects removed earlier in the same cycle are skipped.

mod repair;

use arrakis_core::{Command, Event, ObjectId};
use arrakis_system_capture::Capture;
use arrakis_system_harvesting::Harvesting;
use arrakis_system_movement::Movement;
use arrakis_world::{self as world, GameContext, GameObject};

/// Runs every per-object system once per cycle.
#[derive(Debug, Default)]
pub struct Simulation {
    movement: Movement,
    harvesting: Harvesting,
    capture: Capture,
}

impl Simulation {
    /// Creates a simulation driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a command. A tick runs one full cycle before the cycle
    /// counter advances; everything else goes straight to the world.
    pub fn apply(
        &mut self,
        context: &mut GameContext,
        command: Command,
        out_events: &mut Vec<Event>,
    ) {
        if command == Command::Tick {
            self.process_objects(context, out_events);
        }
        world::apply(context, command, out_events);
    }

    /// Updates every live object once.
    pub fn process_objects(&mut self, context: &mut GameContext, out_events: &mut Vec<Event>) {
        for id in context.objects.ids() {
            if !context.objects.contains(id) {
                continue;
            }
            self.update_object(context, id, out_events);
        }
    }

    fn update_object(
        &mut self,
        context: &mut GameContext,
        id: ObjectId,
        out_events: &mut Vec<Event>,
    ) {
        if context.objects.get(id).is_some_and(GameObject::is_structure) {
            self.harvesting.update(context, id, out_events);
            repair::update_yard(context, id, out_events);
            return;
        }

        count_down_deviation(context, id, out_events);
        let report = self.movement.update(context, id);
        if let Some(tile) = report.entered {
            self.capture.on_tile_entered(context, id, tile, out_events);
            if !context.objects.contains(id) {
                return;
            }
        }
        self.harvesting.update(context, id, out_events);
        self.capture.update(context, id, out_events);
        if context.objects.contains(id) {
            repair::update_unit(context, id, out_events);
        }
    }
}

fn count_down_deviation(context: &mut GameContext, id: ObjectId, out_events: &mut Vec<Event>) {
    let Some(unit) = context.objects.get_mut(id).and_then(GameObject::as_unit_mut) else {
        return;
    };
    let Some(remaining) = unit.deviation_timer else {
        return;
    };
    if remaining <= 1 {
        context.revert_deviation(id, out_events);
    } else {
        unit.deviation_timer = Some(remaining - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrakis_core::{fix, Coord, HouseId, ItemId, TeamId, TerrainType};
    use arrakis_world::{query, Map, Rules};

    fn context() -> GameContext {
        let rules = Rules {
            deviation_cycles: 3,
            ..Rules::default()
        };
        let mut context = GameContext::new(Map::new(10, 10, TerrainType::Rock), rules, 2);
        context.add_house(HouseId::Atreides, TeamId::new(0), fix(100));
        context.add_house(HouseId::Ordos, TeamId::new(1), fix(100));
        context
    }

    #[test]
    fn tick_processes_objects_and_advances_the_cycle() {
        let mut context = context();
        let mut events = Vec::new();
        let quad = context
            .create_unit(HouseId::Atreides, ItemId::Quad, Coord::new(1, 1), &mut events)
            .expect("quad");
        let mut simulation = Simulation::new();
        simulation.apply(
            &mut context,
            Command::MoveUnit {
                unit: quad,
                destination: Coord::new(4, 1),
            },
            &mut events,
        );

        simulation.apply(&mut context, Command::Tick, &mut events);

        assert_eq!(context.cycle, 1);
        assert_eq!(events.last(), Some(&Event::CycleAdvanced { cycle: 1 }));
        let unit = query::object(&context, quad)
            .and_then(GameObject::as_unit)
            .expect("quad");
        assert!(unit.moving);
    }

    #[test]
    fn deviation_wears_off() {
        let mut context = context();
        let mut events = Vec::new();
        let trike = context
            .create_unit(HouseId::Atreides, ItemId::Trike, Coord::new(5, 5), &mut events)
            .expect("trike");
        context.deviate(trike, HouseId::Ordos, &mut events);
        let mut simulation = Simulation::new();

        for _ in 0..2 {
            simulation.apply(&mut context, Command::Tick, &mut events);
        }
        assert_eq!(query::object(&context, trike).map(|o| o.owner), Some(HouseId::Ordos));

        simulation.apply(&mut context, Command::Tick, &mut events);
        assert_eq!(query::object(&context, trike).map(|o| o.owner), Some(HouseId::Atreides));
        assert!(events.contains(&Event::UnitReverted {
            unit: trike,
            to: HouseId::Atreides
        }));
    }

    #[test]
    fn repair_yard_heals_and_releases_a_booked_unit() {
        let mut context = context();
        let mut events = Vec::new();
        let yard = context
            .place_structure(HouseId::Atreides, ItemId::RepairYard, Coord::new(4, 4), &mut events)
            .expect("yard");
        let tank = context
            .create_unit(HouseId::Atreides, ItemId::Tank, Coord::new(3, 4), &mut events)
            .expect("tank");
        if let Some(object) = context.objects.get_mut(tank) {
            object.health = fix(190);
        }
        let mut simulation = Simulation::new();
        simulation.apply(&mut context, Command::RepairUnit { unit: tank, yard }, &mut events);

        simulation.apply(&mut context, Command::Tick, &mut events);
        assert!(events.contains(&Event::UnitDockedForRepair { unit: tank, yard }));
        assert!(!context.map.get_tile(3, 4).contains(tank));

        for _ in 0..40 {
            simulation.apply(&mut context, Command::Tick, &mut events);
        }

        let repaired = events.iter().find_map(|event| match event {
            Event::UnitRepaired { unit, location, .. } if *unit == tank => Some(*location),
            _ => None,
        });
        let location = repaired.expect("tank released");
        let object = query::object(&context, tank).expect("tank");
        assert_eq!(object.health, fix(200));
        assert!(object.is_active());
        assert!(context.map.get_tile(location.x, location.y).contains(tank));
        let state = query::object(&context, yard)
            .and_then(GameObject::as_repair_yard)
            .expect("yard");
        assert_eq!(state.repair_unit, None);
        assert_eq!(state.bookings, 0);
    }
}
