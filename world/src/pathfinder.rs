//! Breadth-first route planner bound to a single map.

use std::collections::VecDeque;

use arrakis_core::{Coord, Facing, FixedPoint};

const UNVISITED: usize = usize::MAX;

/// Reusable search buffers sized for one map.
///
/// Neighbors are expanded in [`Facing::ALL`] order so identical inputs always
/// produce identical routes.
#[derive(Clone, Debug, Default)]
pub(crate) struct Pathfinder {
    width: i32,
    height: i32,
    parents: Vec<usize>,
}

impl Pathfinder {
    /// Creates buffers for a `width` by `height` map.
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            parents: Vec::new(),
        }
    }

    /// Plans a route from `start` toward `goal`.
    ///
    /// Falls back to the reachable tile closest to `goal` when the goal
    /// itself cannot be reached. The returned route excludes `start`.
    pub(crate) fn search<F>(&mut self, start: Coord, goal: Coord, mut is_blocked: F) -> Vec<Coord>
    where
        F: FnMut(Coord) -> bool,
    {
        let Some(start_index) = self.index(start) else {
            return Vec::new();
        };
        if start == goal {
            return Vec::new();
        }

        let cell_count = usize::try_from(self.width * self.height).unwrap_or(0);
        if self.parents.len() != cell_count {
            self.parents = vec![UNVISITED; cell_count];
        } else {
            self.parents.fill(UNVISITED);
        }

        self.parents[start_index] = start_index;
        let mut queue = VecDeque::from([start]);
        let mut best = start;
        let mut best_distance: FixedPoint = start.block_distance(goal);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                best = goal;
                break;
            }
            let Some(current_index) = self.index(current) else {
                continue;
            };

            for facing in Facing::ALL {
                let (dx, dy) = facing.delta();
                let next = current.offset(dx, dy);
                let Some(next_index) = self.index(next) else {
                    continue;
                };
                if self.parents[next_index] != UNVISITED || is_blocked(next) {
                    continue;
                }

                self.parents[next_index] = current_index;
                let distance = next.block_distance(goal);
                if distance < best_distance {
                    best = next;
                    best_distance = distance;
                }
                queue.push_back(next);
            }
        }

        self.route_to(best, start_index)
    }

    fn route_to(&self, end: Coord, start_index: usize) -> Vec<Coord> {
        let mut route = Vec::new();
        let Some(mut index) = self.index(end) else {
            return route;
        };
        while index != start_index {
            route.push(self.location(index));
            index = self.parents[index];
        }
        route.reverse();
        route
    }

    fn index(&self, location: Coord) -> Option<usize> {
        if location.x < 0 || location.y < 0 || location.x >= self.width || location.y >= self.height
        {
            return None;
        }
        usize::try_from(location.y * self.width + location.x).ok()
    }

    fn location(&self, index: usize) -> Coord {
        let index = i32::try_from(index).unwrap_or(0);
        Coord::new(index % self.width, index / self.width)
    }
}
