use arrakis_core::{
    fix, Coord, FixedPoint, FootprintSize, ObjectId, Random, TerrainType, RANDOM_SPICE_MAX,
    RANDOM_SPICE_MIN, RANDOM_THICK_SPICE_MAX, RANDOM_THICK_SPICE_MIN,
};

use super::{Map, SearchResult};
use crate::tile::Tile;

fn is_harvestable(tile: &Tile, harvester: Option<ObjectId>) -> bool {
    tile.spice() > FixedPoint::ZERO
        && tile
            .ground_object_ids()
            .all(|occupant| Some(occupant) == harvester)
}

impl Map {
    /// Closest tile with spice that no other ground object stands on.
    ///
    /// `origin` itself is checked first. `harvester` names the unit doing
    /// the search so that its own tile does not count as occupied.
    pub fn find_spice(
        &self,
        origin: Coord,
        harvester: Option<ObjectId>,
        random: &mut Random,
    ) -> Option<Coord> {
        if self
            .try_get_tile(origin.x, origin.y)
            .is_some_and(|tile| is_harvestable(tile, harvester))
        {
            return Some(origin);
        }

        let mut found = None;
        let _ = self.search_all_by_box_edge(origin, FootprintSize::SINGLE, random, |tile| {
            if is_harvestable(tile, harvester) {
                found = Some(tile.location());
                SearchResult::Done
            } else {
                SearchResult::NotDone
            }
        });
        found
    }

    /// Smooths thick spice around a tile that has just run dry.
    ///
    /// Thick spice may not border sand, so when the tile at `location` has
    /// turned into sand every thick spice tile around it thins out to plain
    /// spice.
    pub fn spice_removed(&mut self, location: Coord) {
        let center_is_sand = self
            .try_get_tile(location.x, location.y)
            .is_some_and(|tile| tile.terrain() == TerrainType::Sand);
        if !center_is_sand {
            return;
        }

        self.for_each_mut(
            location.x - 1,
            location.y - 1,
            location.x + 2,
            location.y + 2,
            |tile| {
                if tile.is_thick_spice() {
                    tile.set_terrain(TerrainType::Spice);
                }
            },
        );
    }

    /// Extracts spice from a tile and smooths the surroundings once it is
    /// exhausted. Returns the extracted amount.
    pub fn harvest_spice(&mut self, location: Coord, rate: FixedPoint) -> FixedPoint {
        let Some(tile) = self.try_get_tile_mut(location.x, location.y) else {
            return FixedPoint::ZERO;
        };
        let extracted = tile.harvest_spice(rate);
        if tile.spice() == FixedPoint::ZERO {
            self.spice_removed(location);
        }
        extracted
    }

    /// Seeds a circular spice field on the sand around `location`.
    ///
    /// Sand within `radius` becomes spice; tiles that already carried spice
    /// become thick spice. With `center_is_thick` the centre tile is always
    /// thick.
    pub fn create_spice_field(
        &mut self,
        location: Coord,
        radius: i32,
        center_is_thick: bool,
        random: &mut Random,
    ) {
        let radius_squared = radius * radius;
        self.for_each_filter(
            location.x - radius,
            location.y - radius,
            location.x + radius + 1,
            location.y + radius + 1,
            |x, y| {
                let (dx, dy) = (x - location.x, y - location.y);
                dx * dx + dy * dy <= radius_squared
            },
            |tile| {
                let thicken = (center_is_thick && tile.location() == location) || tile.is_spice();
                if thicken {
                    tile.set_terrain(TerrainType::ThickSpice);
                    tile.set_spice(fix(
                        random.rand(RANDOM_THICK_SPICE_MIN, RANDOM_THICK_SPICE_MAX),
                    ));
                } else if tile.is_sand() {
                    tile.set_terrain(TerrainType::Spice);
                    tile.set_spice(fix(random.rand(RANDOM_SPICE_MIN, RANDOM_SPICE_MAX)));
                }
            },
        );
    }

    /// Scatters `amount` spice evenly over the sand and spice tiles of the
    /// three by three area around `location`.
    pub fn diffuse_spice(&mut self, location: Coord, amount: FixedPoint) {
        if amount <= FixedPoint::ZERO {
            return;
        }

        let mut receivers = 0;
        self.for_each(
            location.x - 1,
            location.y - 1,
            location.x + 2,
            location.y + 2,
            |tile| {
                if tile.is_sand() || tile.is_spice() {
                    receivers += 1;
                }
            },
        );
        if receivers == 0 {
            return;
        }

        let share = amount / fix(receivers);
        self.for_each_mut(
            location.x - 1,
            location.y - 1,
            location.x + 2,
            location.y + 2,
            |tile| {
                if tile.is_sand() || tile.is_spice() {
                    tile.add_spice(share);
                }
            },
        );
    }
}
