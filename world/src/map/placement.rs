use arrakis_core::{Coord, FootprintSize, HouseId, PlacementError};

use super::Map;
use crate::objects::ObjectManager;

/// Parameters of a structure placement query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementQuery {
    /// Upper-left footprint tile.
    pub origin: Coord,
    /// Footprint of the structure.
    pub size: FootprintSize,
    /// Whether every footprint tile must be concrete.
    pub concrete_required: bool,
    /// House placing the structure; `None` skips the build range rule.
    pub house: Option<HouseId>,
    /// Tiles a footprint tile may lie from a tile owned by the house.
    pub build_range: i32,
    /// Whether units on the footprint are tolerated.
    pub ignore_units: bool,
}

impl Map {
    /// Whether a tile owned by `house` lies within `build_range` of `(x, y)`.
    #[must_use]
    pub fn is_within_build_range(&self, x: i32, y: i32, house: HouseId, build_range: i32) -> bool {
        let mut found = false;
        self.for_each(
            x - build_range,
            y - build_range,
            x + build_range + 1,
            y + build_range + 1,
            |tile| found |= tile.owner() == Some(house),
        );
        found
    }

    /// Validates a structure placement, reporting the first violated rule.
    ///
    /// Every footprint tile must exist and be buildable rock, concrete when
    /// required, and free of ground objects (only of structures when units
    /// are ignored). At least one footprint tile must be in build range of
    /// the house unless no house is given.
    pub fn check_structure_placement(
        &self,
        objects: &ObjectManager,
        query: &PlacementQuery,
    ) -> Result<(), PlacementError> {
        let mut within_build_range = query.house.is_none();
        for y in query.origin.y..query.origin.y + query.size.height {
            for x in query.origin.x..query.origin.x + query.size.width {
                let tile = self.try_get_tile(x, y).ok_or(PlacementError::OutOfBounds)?;
                if !tile.is_rock() || tile.is_mountain() {
                    return Err(PlacementError::UnsuitableTerrain);
                }
                if query.concrete_required && !tile.is_concrete() {
                    return Err(PlacementError::ConcreteRequired);
                }

                let occupied = if query.ignore_units {
                    tile.non_infantry_ground_objects()
                        .iter()
                        .filter_map(|id| objects.get(*id))
                        .any(|object| object.is_structure())
                } else {
                    tile.has_a_ground_object()
                };
                if occupied {
                    return Err(PlacementError::Occupied);
                }

                if let Some(house) = query.house {
                    within_build_range |=
                        self.is_within_build_range(x, y, house, query.build_range);
                }
            }
        }

        if within_build_range {
            Ok(())
        } else {
            Err(PlacementError::OutOfBuildRange)
        }
    }

    /// Boolean form of [`Map::check_structure_placement`].
    #[must_use]
    pub fn okay_to_place_structure(&self, objects: &ObjectManager, query: &PlacementQuery) -> bool {
        self.check_structure_placement(objects, query).is_ok()
    }

    /// Whether a `width` by `height` structure at `(x, y)` keeps a free lane
    /// to neighboring structures.
    ///
    /// Structures narrower than two tiles are exempt. Otherwise the ring of
    /// tiles bordering the footprint, corners excluded, must hold no
    /// structure. Concrete is terrain and never closes the lane.
    #[must_use]
    pub fn is_a_structure_gap(
        &self,
        objects: &ObjectManager,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> bool {
        if width < 2 {
            return true;
        }

        let (x_min, x_max) = (x - 1, x + width);
        let (y_min, y_max) = (y - 1, y + height);
        for j in y_min..=y_max {
            for i in x_min..=x_max {
                let on_border = i == x_min || i == x_max || j == y_min || j == y_max;
                let on_corner = (i == x_min || i == x_max) && (j == y_min || j == y_max);
                if !on_border || on_corner {
                    continue;
                }
                let Some(tile) = self.try_get_tile(i, j) else {
                    continue;
                };
                let blocks = tile
                    .non_infantry_ground_objects()
                    .iter()
                    .filter_map(|id| objects.get(*id))
                    .any(|object| object.is_structure() && !object.item.is_slab());
                if blocks {
                    return false;
                }
            }
        }
        true
    }
}
