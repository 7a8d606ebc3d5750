use arrakis_core::{fix, Coord, TeamId};

use super::Map;

impl Map {
    /// Marks the tiles around `location` as explored by `team` in `cycle`.
    ///
    /// Ranges of one tile or less use the Chebyshev distance; larger ranges
    /// use the approximate block distance, which rounds the view off at the
    /// diagonals.
    pub fn view_map(&mut self, team: TeamId, location: Coord, max_view_range: i32, cycle: u32) {
        if max_view_range < 0 {
            return;
        }
        let range = fix(max_view_range);
        self.for_each_mut(
            location.x - max_view_range,
            location.y - max_view_range,
            location.x + max_view_range + 1,
            location.y + max_view_range + 1,
            |tile| {
                let visible = if max_view_range <= 1 {
                    location.maximum_distance(tile.location()) <= max_view_range
                } else {
                    location.block_distance_approx(tile.location()) <= range
                };
                if visible {
                    tile.set_explored(team, cycle);
                }
            },
        );
    }
}
