use arrakis_core::{fix, Coord, Event, FixedPoint, HouseId, ItemId, TeamId, TerrainType};
use arrakis_system_harvesting::Harvesting;
use arrakis_system_movement::Movement;
use arrakis_world::{query, GameContext, GameObject, Map, Rules};

fn spice_basin() -> GameContext {
    let map = Map::from_fn(18, 8, |location| {
        if location.x < 6 {
            TerrainType::Rock
        } else {
            TerrainType::Sand
        }
    });
    let rules = Rules {
        harvest_speed: fix(1),
        harvester_capacity: fix(24),
        unload_speed: fix(3),
        ..Rules::default()
    };
    let mut context = GameContext::new(map, rules, 0xa11);
    context.add_house(HouseId::Atreides, TeamId::new(0), fix(0));
    context
        .map
        .create_spice_field(Coord::new(13, 4), 2, false, &mut context.random);
    context
}

fn run_cycle(
    context: &mut GameContext,
    movement: &mut Movement,
    harvesting: &mut Harvesting,
    events: &mut Vec<Event>,
) {
    for id in context.objects.ids() {
        let _ = movement.update(context, id);
        harvesting.update(context, id, events);
    }
    context.cycle += 1;
}

#[test]
fn free_harvester_brings_spice_home() {
    let mut context = spice_basin();
    let spice_before = query::spice_on_map(&context);
    let mut events = Vec::new();
    let refinery = context
        .place_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(1, 2), &mut events)
        .expect("refinery");
    let harvester = events
        .iter()
        .find_map(|event| match event {
            Event::HarvesterDeployed { harvester, .. } => Some(*harvester),
            _ => None,
        })
        .expect("free harvester");

    let mut movement = Movement::default();
    let mut harvesting = Harvesting::default();
    let mut cycles = 0;
    while query::credits(&context, HouseId::Atreides) < fix(24) {
        run_cycle(&mut context, &mut movement, &mut harvesting, &mut events);
        for id in context.objects.ids() {
            let holders = context
                .map
                .tiles()
                .iter()
                .filter(|tile| tile.contains(id))
                .count();
            let expected = context.objects.get(id).map_or(0, |object| {
                if object.is_structure() {
                    6
                } else {
                    usize::from(object.is_active())
                }
            });
            assert_eq!(holders, expected, "{id:?} is indexed by {holders} tiles");
        }
        cycles += 1;
        assert!(cycles < 5_000, "harvester never delivered its load");
    }

    assert!(events.iter().any(|event| *event
        == Event::HarvesterDocked {
            harvester,
            refinery
        }));
    assert_eq!(
        spice_before - query::spice_on_map(&context),
        query::credits(&context, HouseId::Atreides)
            + context
                .objects
                .get(harvester)
                .and_then(GameObject::as_harvester)
                .map_or(FixedPoint::ZERO, |state| state.spice)
    );
    let bookings = context
        .objects
        .get(refinery)
        .and_then(GameObject::as_refinery)
        .map(|state| state.bookings);
    assert!(bookings <= Some(1));
}
