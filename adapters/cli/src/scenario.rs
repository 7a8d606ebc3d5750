//! Two-house skirmish used by the command-line runner.

use std::{fmt, str::FromStr};

use anyhow::{ensure, Context, Result};
use arrakis_core::{fix, Command, Coord, Event, HouseId, ItemId, TeamId, TerrainType};
use arrakis_world::{GameContext, Map, Rules};

/// Smallest map that fits both bases and the spice basin between them.
pub(crate) const MIN_MAP_SIZE: MapSize = MapSize {
    width: 24,
    height: 16,
};

/// Width and height of the generated map in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MapSize {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl FromStr for MapSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
        let width = width
            .trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid width `{width}`: {error}"))?;
        let height = height
            .trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid height `{height}`: {error}"))?;
        Ok(Self { width, height })
    }
}

impl fmt::Display for MapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// World built for a run together with the orders issued on the first cycle.
#[derive(Debug)]
pub(crate) struct Scenario {
    pub(crate) context: GameContext,
    pub(crate) orders: Vec<Command>,
}

/// Builds the skirmish: Atreides on the western plateau, Harkonnen on the
/// eastern one, open sand with spice fields and a ridge in between.
pub(crate) fn build(size: MapSize, rules: Rules, seed: u64) -> Result<Scenario> {
    ensure!(
        size.width >= MIN_MAP_SIZE.width && size.height >= MIN_MAP_SIZE.height,
        "map {size} is smaller than the minimum of {MIN_MAP_SIZE}"
    );
    let plateau = size.width / 3;
    let ridge = size.width / 2;
    let map = Map::from_fn(size.width, size.height, |location| {
        if location.x < plateau || location.x >= size.width - plateau {
            TerrainType::Rock
        } else if location.x == ridge && (size.height / 4..size.height / 2).contains(&location.y) {
            TerrainType::Mountain
        } else {
            TerrainType::Sand
        }
    });
    let mut context = GameContext::new(map, rules, seed);
    context.add_house(HouseId::Atreides, TeamId::new(0), fix(1000));
    context.add_house(HouseId::Harkonnen, TeamId::new(1), fix(1000));

    for _ in 0..2 {
        let x = context.random.rand(plateau + 2, size.width - plateau - 3);
        let y = context.random.rand(2, size.height - 3);
        context
            .map
            .create_spice_field(Coord::new(x, y), 3, true, &mut context.random);
    }

    let mut events = Vec::new();
    let east = size.width - 4;
    let bottom = size.height - 3;
    for (house, item, origin) in [
        (HouseId::Atreides, ItemId::ConstructionYard, Coord::new(1, 1)),
        (HouseId::Atreides, ItemId::Refinery, Coord::new(1, 4)),
        (HouseId::Atreides, ItemId::RepairYard, Coord::new(1, bottom - 1)),
        (HouseId::Harkonnen, ItemId::ConstructionYard, Coord::new(east, 1)),
        (HouseId::Harkonnen, ItemId::Refinery, Coord::new(east - 1, 4)),
        (HouseId::Harkonnen, ItemId::Silo, Coord::new(east, bottom)),
    ] {
        let _ = context
            .place_structure(house, item, origin, &mut events)
            .with_context(|| format!("placing {house:?} {item:?} at {origin:?}"))?;
    }

    let mut unit = |house, item, location| {
        context
            .create_unit(house, item, location, &mut events)
            .with_context(|| format!("creating {house:?} {item:?} at {location:?}"))
    };
    let trike = unit(HouseId::Atreides, ItemId::Trike, Coord::new(5, 1))?;
    let soldiers = [
        unit(HouseId::Atreides, ItemId::Soldier, Coord::new(5, 8))?,
        unit(HouseId::Atreides, ItemId::Trooper, Coord::new(5, 9))?,
    ];
    let tank = unit(HouseId::Harkonnen, ItemId::Tank, Coord::new(east - 2, 8))?;
    let quad = unit(HouseId::Harkonnen, ItemId::Quad, Coord::new(east - 2, 9))?;

    let silo = events
        .iter()
        .find_map(|event| match event {
            Event::StructurePlaced {
                id,
                item: ItemId::Silo,
                ..
            } => Some(*id),
            _ => None,
        })
        .context("the Harkonnen silo was not placed")?;
    let mut orders = vec![
        Command::MoveUnit {
            unit: trike,
            destination: Coord::new(ridge, size.height - 2),
        },
        Command::MoveUnit {
            unit: tank,
            destination: Coord::new(ridge + 1, 2),
        },
        Command::MoveUnit {
            unit: quad,
            destination: Coord::new(plateau, size.height / 2),
        },
    ];
    orders.extend(soldiers.iter().map(|soldier| Command::CaptureStructure {
        unit: *soldier,
        structure: silo,
    }));

    log::info!(
        "built {size} skirmish with {} objects, seed {seed}",
        context.objects.len()
    );
    Ok(Scenario { context, orders })
}
