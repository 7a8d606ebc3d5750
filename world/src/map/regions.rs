use std::collections::VecDeque;

use arrakis_core::Coord;

use super::Map;
use crate::tile::NO_SAND_REGION;

impl Map {
    /// Labels every connected group of non-rock tiles with a region id.
    ///
    /// Regions are numbered from zero in column-major discovery order; rock
    /// tiles receive [`NO_SAND_REGION`].
    pub fn create_sand_regions(&mut self) {
        for tile in &mut self.tiles {
            tile.set_sand_region(NO_SAND_REGION);
        }

        let mut region = 0;
        let mut queue = VecDeque::new();
        for x in 0..self.width {
            for y in 0..self.height {
                let tile = self.get_tile(x, y);
                if tile.is_rock() || tile.sand_region() != NO_SAND_REGION {
                    continue;
                }

                self.get_tile_mut(x, y).set_sand_region(region);
                queue.push_back(Coord::new(x, y));
                while let Some(current) = queue.pop_front() {
                    let mut unvisited = Vec::with_capacity(4);
                    self.for_each_neighbor(current.x, current.y, |neighbor| {
                        if !neighbor.is_rock() && neighbor.sand_region() == NO_SAND_REGION {
                            unvisited.push(neighbor.location());
                        }
                    });
                    for location in unvisited {
                        self.get_tile_mut(location.x, location.y)
                            .set_sand_region(region);
                        queue.push_back(location);
                    }
                }
                region += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arrakis_core::TerrainType;

    use super::*;

    #[test]
    fn rock_ridge_splits_the_desert() {
        let mut map = Map::from_fn(5, 3, |location| {
            if location.x == 2 {
                TerrainType::Rock
            } else {
                TerrainType::Sand
            }
        });
        map.create_sand_regions();

        let west = map.get_tile(0, 0).sand_region();
        let east = map.get_tile(4, 2).sand_region();
        assert_eq!(west, 0);
        assert_eq!(east, 1);
        assert_eq!(map.get_tile(1, 2).sand_region(), west);
        assert_eq!(map.get_tile(2, 1).sand_region(), NO_SAND_REGION);
    }

    #[test]
    fn diagonal_contact_does_not_connect_regions() {
        let mut map = Map::from_fn(2, 2, |location| {
            if location.x == location.y {
                TerrainType::Sand
            } else {
                TerrainType::Mountain
            }
        });
        map.create_sand_regions();
        assert_ne!(map.get_tile(0, 0).sand_region(), map.get_tile(1, 1).sand_region());
    }
}
