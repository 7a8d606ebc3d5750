use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use arrakis_core::{fix, Command, Coord, HouseId, ItemId, ObjectId, TeamId, TerrainType, WorldPoint};
use arrakis_system_movement::Movement;
use arrakis_world::{self as world, query, GameContext, Map, Rules};

#[test]
fn deterministic_replay_produces_identical_snapshots() {
    let first = replay(scripted_orders());
    let second = replay(scripted_orders());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first.units.iter().any(|unit| unit.location != unit.start));
}

fn replay(orders: Vec<(usize, Coord)>) -> ReplayOutcome {
    let map = Map::from_fn(14, 10, |location| {
        if location.x == 6 && location.y > 1 && location.y < 8 {
            TerrainType::Mountain
        } else if location.y > 6 {
            TerrainType::Rock
        } else {
            TerrainType::Sand
        }
    });
    let mut context = GameContext::new(map, Rules::default(), 0xfeed);
    context.add_house(HouseId::Harkonnen, TeamId::new(1), fix(0));
    let mut movement = Movement::default();
    let mut events = Vec::new();

    let roster = [
        (ItemId::Trike, Coord::new(1, 1)),
        (ItemId::Tank, Coord::new(1, 4)),
        (ItemId::Trooper, Coord::new(2, 5)),
        (ItemId::Trooper, Coord::new(2, 5)),
        (ItemId::Soldier, Coord::new(3, 8)),
    ];
    let units: Vec<(ObjectId, Coord)> = roster
        .iter()
        .filter_map(|(item, at)| {
            context
                .create_unit(HouseId::Harkonnen, *item, *at, &mut events)
                .map(|id| (id, *at))
        })
        .collect();

    let mut entered = Vec::new();
    for (index, destination) in orders {
        if let Some((unit, _)) = units.get(index) {
            world::apply(
                &mut context,
                Command::MoveUnit {
                    unit: *unit,
                    destination,
                },
                &mut events,
            );
        }
        for _ in 0..120 {
            for (unit, _) in &units {
                let report = movement.update(&mut context, *unit);
                if let Some(tile) = report.entered {
                    entered.push((*unit, tile));
                }
            }
            world::apply(&mut context, Command::Tick, &mut events);
        }
    }

    let units = units
        .iter()
        .filter_map(|(id, start)| {
            query::object(&context, *id).map(|object| UnitState {
                id: *id,
                start: *start,
                location: object.location,
                real_pos: object.real_pos,
            })
        })
        .collect();

    ReplayOutcome { units, entered }
}

fn scripted_orders() -> Vec<(usize, Coord)> {
    vec![
        (0, Coord::new(12, 1)),
        (1, Coord::new(11, 5)),
        (2, Coord::new(9, 4)),
        (3, Coord::new(9, 4)),
        (4, Coord::new(10, 8)),
        (0, Coord::new(0, 9)),
        (1, Coord::new(2, 2)),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    units: Vec<UnitState>,
    entered: Vec<(ObjectId, Coord)>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct UnitState {
    id: ObjectId,
    start: Coord,
    location: Coord,
    real_pos: WorldPoint,
}
