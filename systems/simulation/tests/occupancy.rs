use arrakis_core::{fix, Command, Coord, HouseId, ItemId, ObjectId, TeamId, TerrainType};
use arrakis_system_simulation::Simulation;
use arrakis_world::{GameContext, GameObject, Map, Rules};
use proptest::prelude::*;

const WIDTH: i32 = 12;
const HEIGHT: i32 = 12;

fn crowded_field() -> (GameContext, Vec<ObjectId>) {
    let map = Map::from_fn(WIDTH, HEIGHT, |location| {
        if location.x == 6 && (2..10).contains(&location.y) {
            TerrainType::Mountain
        } else {
            TerrainType::Rock
        }
    });
    let mut context = GameContext::new(map, Rules::default(), 77);
    context.add_house(HouseId::Ordos, TeamId::new(0), fix(0));
    let mut events = Vec::new();
    let roster = [
        (ItemId::Trike, Coord::new(1, 1)),
        (ItemId::Quad, Coord::new(2, 1)),
        (ItemId::Tank, Coord::new(1, 2)),
        (ItemId::Soldier, Coord::new(9, 9)),
        (ItemId::Soldier, Coord::new(9, 9)),
        (ItemId::Trooper, Coord::new(10, 9)),
        (ItemId::Soldier, Coord::new(10, 10)),
    ];
    let units = roster
        .iter()
        .filter_map(|(item, at)| context.create_unit(HouseId::Ordos, *item, *at, &mut events))
        .collect();
    (context, units)
}

fn assert_occupancy(context: &GameContext) {
    for object in context.objects.iter() {
        let holders = context
            .map
            .tiles()
            .iter()
            .filter(|tile| tile.contains(object.id))
            .count();
        assert_eq!(
            holders,
            usize::from(object.is_active()),
            "{:?} is indexed by {holders} tiles",
            object.id
        );
        if object.is_active() {
            let tile = context.map.get_tile(object.location.x, object.location.y);
            assert!(tile.contains(object.id), "{:?} is not on its own tile", object.id);
        }
    }
    for tile in context.map.tiles() {
        let vehicles = tile.non_infantry_ground_objects().len();
        assert!(vehicles <= 1, "{vehicles} vehicles share a tile");
        assert!(vehicles == 0 || tile.infantry().is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_unit_holds_exactly_one_tile(
        orders in prop::collection::vec((0usize..7, 0..WIDTH, 0..HEIGHT, 0u32..120), 1..12)
    ) {
        let (mut context, units) = crowded_field();
        let mut simulation = Simulation::new();
        let mut events = Vec::new();
        assert_occupancy(&context);

        for cycle in 0..240 {
            for (index, x, y, _) in orders.iter().filter(|order| order.3 == cycle) {
                if let Some(unit) = units.get(*index) {
                    simulation.apply(
                        &mut context,
                        Command::MoveUnit {
                            unit: *unit,
                            destination: Coord::new(*x, *y),
                        },
                        &mut events,
                    );
                }
            }
            simulation.apply(&mut context, Command::Tick, &mut events);
            assert_occupancy(&context);
        }

        let infantry = context
            .objects
            .iter()
            .filter(|object| object.is_infantry())
            .filter_map(GameObject::as_infantry)
            .count();
        prop_assert_eq!(infantry, 4);
    }
}
