use arrakis_core::{
    fix, Blast, BulletId, Command, Coord, Event, FixedPoint, FootprintSize, HouseId, ItemId,
    Random, TeamId, TerrainType,
};
use arrakis_world::{self as world, query, GameContext, GameObject, Map, Mobility, Rules};

fn desert_with_plateau() -> GameContext {
    let map = Map::from_fn(20, 20, |location| {
        if location.x < 8 && location.y < 8 {
            TerrainType::Rock
        } else if location.x == 12 && location.y > 2 {
            TerrainType::Mountain
        } else {
            TerrainType::Sand
        }
    });
    let mut context = GameContext::new(map, Rules::default(), 0x5eed);
    context.add_house(HouseId::Atreides, TeamId::new(0), fix(2000));
    context.add_house(HouseId::Harkonnen, TeamId::new(1), fix(2000));
    context
}

#[test]
fn saved_game_resumes_identically() {
    let mut context = desert_with_plateau();
    let mut events = Vec::new();
    let _ = context.place_structure(
        HouseId::Atreides,
        ItemId::ConstructionYard,
        Coord::new(1, 1),
        &mut events,
    );
    let _ =
        context.place_structure(HouseId::Atreides, ItemId::Refinery, Coord::new(4, 1), &mut events);
    let _ =
        context.create_unit(HouseId::Harkonnen, ItemId::Trooper, Coord::new(15, 15), &mut events);
    context
        .map
        .create_spice_field(Coord::new(16, 5), 3, true, &mut context.random);
    context.cycle = 300;

    let path = std::env::temp_dir().join(format!("arrakis-world-{}.sav", std::process::id()));
    let file = std::fs::File::create(&path).expect("create save");
    context.save(std::io::BufWriter::new(file)).expect("save");
    let file = std::fs::File::open(&path).expect("open save");
    let mut restored =
        GameContext::load(std::io::BufReader::new(file), Rules::default()).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(restored, context);

    let blast = Blast {
        damager: None,
        damager_owner: Some(HouseId::Harkonnen),
        real_pos: Coord::new(5 * 64 + 10, 64 + 10),
        bullet: BulletId::Rocket,
        damage: 120,
        radius: 16,
        air: false,
    };
    let mut original_events = Vec::new();
    let mut restored_events = Vec::new();
    world::apply(&mut context, Command::Damage { blast }, &mut original_events);
    world::apply(&mut restored, Command::Damage { blast }, &mut restored_events);
    assert_eq!(original_events, restored_events);
    assert_eq!(restored, context);
}

#[test]
fn depleting_a_tile_thins_the_thick_spice_around_it() {
    let mut map = Map::new(5, 5, TerrainType::Sand);
    map.for_each_mut(1, 1, 4, 4, |tile| {
        tile.set_terrain(TerrainType::ThickSpice);
        tile.set_spice(fix(300));
    });
    map.get_tile_mut(2, 2).set_terrain(TerrainType::Spice);
    map.get_tile_mut(2, 2).set_spice(fix(3));

    let mut harvested = FixedPoint::ZERO;
    while map.get_tile(2, 2).is_spice() {
        harvested += map.harvest_spice(Coord::new(2, 2), fix(1));
    }

    assert_eq!(harvested, fix(3));
    assert_eq!(map.get_tile(2, 2).terrain(), TerrainType::Sand);
    map.for_each(1, 1, 4, 4, |tile| {
        assert!(!tile.is_thick_spice(), "{:?} stayed thick", tile.location());
    });
}

#[test]
fn deploy_spot_prefers_the_gather_point_side() {
    let map = Map::new(10, 10, TerrainType::Rock);
    let mut random = Random::from_seed(4);
    let origin = Coord::new(4, 4);
    let size = FootprintSize::new(2, 2);

    let east =
        map.find_deploy_spot(origin, size, Some(Coord::new(9, 5)), Mobility::Ground, &mut random);
    let north =
        map.find_deploy_spot(origin, size, Some(Coord::new(4, 0)), Mobility::Ground, &mut random);

    assert_eq!(east, Some(Coord::new(6, 5)));
    assert_eq!(north.map(|spot| spot.y), Some(3));
}

#[test]
fn infantry_crosses_mountains_but_vehicles_do_not() {
    let context = desert_with_plateau();
    let mountain = query::tile(&context, Coord::new(12, 10)).expect("tile");

    assert!(Mobility::Foot.can_enter(mountain));
    assert!(!Mobility::Ground.can_enter(mountain));
    assert!(Mobility::Air.can_enter(mountain));
}

#[test]
fn rocket_volley_destroys_a_harvester_and_spills_its_load() {
    let mut context = desert_with_plateau();
    let mut events = Vec::new();
    let harvester = context
        .create_unit(HouseId::Atreides, ItemId::Harvester, Coord::new(15, 12), &mut events)
        .expect("harvester");
    if let Some(state) = context
        .objects
        .get_mut(harvester)
        .and_then(GameObject::as_harvester_mut)
    {
        state.spice = fix(180);
    }
    let spice_before = query::spice_on_map(&context);

    let centre = Coord::new(15, 12).tile_center();
    for _ in 0..40 {
        let blast = Blast {
            damager: None,
            damager_owner: Some(HouseId::Harkonnen),
            real_pos: centre,
            bullet: BulletId::LargeRocket,
            damage: 200,
            radius: 16,
            air: false,
        };
        world::apply(&mut context, Command::Damage { blast }, &mut events);
    }

    assert!(query::object(&context, harvester).is_none());
    assert_eq!(query::spice_on_map(&context) - spice_before, fix(180));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::ObjectDestroyed { id, item: ItemId::Harvester, .. } if *id == harvester
    )));
    assert_eq!(
        context.house(HouseId::Atreides).map(|house| house.num_units()),
        Some(0)
    );
    let decals = query::tile(&context, Coord::new(15, 12))
        .map(|tile| tile.damage().len())
        .unwrap_or_default();
    assert!(decals > 0);
}
