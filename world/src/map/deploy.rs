use arrakis_core::{Coord, FixedPoint, FootprintSize, ItemId, Random};

use super::{Map, SearchResult};
use crate::tile::Tile;

/// How a unit type moves across terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mobility {
    /// Infantry; crosses mountains and shares tiles through slots.
    Foot,
    /// Wheeled and tracked vehicles.
    Ground,
    /// Aircraft; ignore the ground entirely.
    Air,
    /// Sandworms; stay off rock.
    Underground,
}

impl Mobility {
    /// Mobility class of an item.
    #[must_use]
    pub const fn of(item: ItemId) -> Self {
        if item.is_infantry() {
            Self::Foot
        } else if item.is_aircraft() {
            Self::Air
        } else if matches!(item, ItemId::Sandworm) {
            Self::Underground
        } else {
            Self::Ground
        }
    }

    /// Whether a unit of this class may step onto `tile` right now.
    #[must_use]
    pub fn can_enter(self, tile: &Tile) -> bool {
        match self {
            Self::Foot => !tile.has_a_non_infantry_ground_object() && tile.infantry_not_full(),
            Self::Ground => !tile.is_blocked(),
            Self::Air => true,
            Self::Underground => !tile.is_rock() && !tile.has_an_underground_unit(),
        }
    }

    /// Whether terrain alone keeps a unit of this class off `tile`.
    #[must_use]
    pub fn is_impassable(self, tile: &Tile) -> bool {
        match self {
            Self::Foot | Self::Air => false,
            Self::Ground => tile.is_mountain(),
            Self::Underground => tile.is_rock(),
        }
    }
}

impl Map {
    /// Free tile next to a footprint where a unit can be put down.
    ///
    /// Without a gather point the first acceptable tile of the closest ring
    /// wins. With one, the whole ring is inspected and the acceptable tile
    /// closest to the gather point wins.
    pub fn find_deploy_spot(
        &self,
        origin: Coord,
        size: FootprintSize,
        gather_point: Option<Coord>,
        mobility: Mobility,
        random: &mut Random,
    ) -> Option<Coord> {
        let mut best: Option<(FixedPoint, Coord)> = None;
        let _ = self.search_all_by_box_edge(origin, size, random, |tile| {
            if !mobility.can_enter(tile) {
                return SearchResult::NotDone;
            }
            let location = tile.location();
            match gather_point {
                Some(gather_point) => {
                    let distance = location.block_distance(gather_point);
                    if best.map_or(true, |(closest, _)| distance < closest) {
                        best = Some((distance, location));
                    }
                    SearchResult::DoneAtDepth
                }
                None => {
                    best = Some((FixedPoint::ZERO, location));
                    SearchResult::Done
                }
            }
        });
        best.map(|(_, location)| location)
    }

    /// Map border tile closest to a footprint anchored at `origin`.
    #[must_use]
    pub fn find_closest_edge_point(&self, origin: Coord, size: FootprintSize) -> Coord {
        let to_left = origin.x;
        let to_right = self.width - (origin.x + size.width);
        let to_top = origin.y;
        let to_bottom = self.height - (origin.y + size.height);

        let (mut closest, mut distance) = if to_left < to_right {
            (Coord::new(0, origin.y), to_left)
        } else {
            (Coord::new(self.width - 1, origin.y), to_right)
        };
        if to_top < distance {
            closest = Coord::new(origin.x, 0);
            distance = to_top;
        }
        if to_bottom < distance {
            closest = Coord::new(origin.x, self.height - 1);
        }
        closest
    }
}
