//! The world grid and the spatial algorithms shared by units and houses.

mod deploy;
mod placement;
mod regions;
mod spice;
mod view;

use std::borrow::Cow;

use arrakis_core::{Coord, FootprintSize, ObjectId, Random, TerrainType};
use serde::{Deserialize, Serialize};

use crate::{
    box_offsets::{ring_offsets, BoxOffsetTable},
    objects::{GameObject, ObjectKind, UnitRole},
    pathfinder::Pathfinder,
    tile::Tile,
};

pub use deploy::Mobility;
pub use placement::PlacementQuery;

/// Verdict of a ring search visitor for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchResult {
    /// Keep searching.
    NotDone,
    /// Stop immediately; the search succeeded.
    Done,
    /// Finish the current ring, then stop with success.
    DoneAtDepth,
}

/// Rectangular grid of tiles indexed by `y * width + x`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    #[serde(skip)]
    box_offsets: BoxOffsetTable,
    #[serde(skip)]
    pathfinder: Pathfinder,
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.tiles == other.tiles
    }
}

impl Eq for Map {}

impl Map {
    /// Creates a map filled with `terrain`.
    #[must_use]
    pub fn new(width: i32, height: i32, terrain: TerrainType) -> Self {
        Self::from_fn(width, height, |_| terrain)
    }

    /// Creates a map whose terrain is chosen per tile.
    #[must_use]
    pub fn from_fn<F>(width: i32, height: i32, mut terrain: F) -> Self
    where
        F: FnMut(Coord) -> TerrainType,
    {
        let width = width.max(0);
        let height = height.max(0);
        let mut tiles = Vec::with_capacity(usize::try_from(width * height).unwrap_or(0));
        for y in 0..height {
            for x in 0..width {
                let location = Coord::new(x, y);
                tiles.push(Tile::new(location, terrain(location)));
            }
        }

        let mut map = Self {
            width,
            height,
            tiles,
            box_offsets: BoxOffsetTable::default(),
            pathfinder: Pathfinder::default(),
        };
        map.rebuild_derived();
        map.create_sand_regions();
        map
    }

    /// Recomputes state that is derived from the dimensions and never saved.
    pub(crate) fn rebuild_derived(&mut self) {
        self.box_offsets = BoxOffsetTable::for_map(self.width, self.height);
        self.pathfinder = Pathfinder::new(self.width, self.height);
    }

    /// Whether the stored tiles agree with the dimensions.
    pub(crate) fn is_consistent(&self) -> bool {
        let expected = usize::try_from(self.width * self.height).unwrap_or(usize::MAX);
        self.tiles.len() == expected
            && self
                .tiles
                .iter()
                .enumerate()
                .all(|(index, tile)| self.index_of(tile.location()) == Some(index))
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Whether `(x, y)` lies on the map.
    #[must_use]
    pub const fn tile_exists(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index_of(&self, location: Coord) -> Option<usize> {
        if !self.tile_exists(location.x, location.y) {
            return None;
        }
        usize::try_from(location.y * self.width + location.x).ok()
    }

    /// Tile at `(x, y)`, or `None` off the map.
    #[must_use]
    pub fn try_get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index_of(Coord::new(x, y))
            .and_then(|index| self.tiles.get(index))
    }

    /// Mutable tile at `(x, y)`, or `None` off the map.
    pub fn try_get_tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        self.index_of(Coord::new(x, y))
            .and_then(|index| self.tiles.get_mut(index))
    }

    /// Tile at `(x, y)`; the coordinate must lie on the map.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate is off the map.
    #[must_use]
    pub fn get_tile(&self, x: i32, y: i32) -> &Tile {
        debug_assert!(self.tile_exists(x, y), "tile ({x}, {y}) is off the map");
        &self.tiles[self.unchecked_index(x, y)]
    }

    /// Mutable tile at `(x, y)`; the coordinate must lie on the map.
    ///
    /// # Panics
    ///
    /// Panics when the coordinate is off the map.
    pub fn get_tile_mut(&mut self, x: i32, y: i32) -> &mut Tile {
        debug_assert!(self.tile_exists(x, y), "tile ({x}, {y}) is off the map");
        let index = self.unchecked_index(x, y);
        &mut self.tiles[index]
    }

    fn unchecked_index(&self, x: i32, y: i32) -> usize {
        usize::try_from(y * self.width + x).unwrap_or(usize::MAX)
    }

    /// Visits the tiles of `[x1, x2) x [y1, y2)` clipped to the map.
    pub fn for_each<F>(&self, x1: i32, y1: i32, x2: i32, y2: i32, mut visit: F)
    where
        F: FnMut(&Tile),
    {
        let (x1, y1, x2, y2) = self.clip(x1, y1, x2, y2);
        for y in y1..y2 {
            for x in x1..x2 {
                visit(self.get_tile(x, y));
            }
        }
    }

    /// Mutable variant of [`Map::for_each`].
    pub fn for_each_mut<F>(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, mut visit: F)
    where
        F: FnMut(&mut Tile),
    {
        let (x1, y1, x2, y2) = self.clip(x1, y1, x2, y2);
        for y in y1..y2 {
            for x in x1..x2 {
                visit(self.get_tile_mut(x, y));
            }
        }
    }

    /// Like [`Map::for_each_mut`], but only for coordinates accepted by `filter`.
    pub fn for_each_filter<P, F>(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        mut filter: P,
        mut visit: F,
    ) where
        P: FnMut(i32, i32) -> bool,
        F: FnMut(&mut Tile),
    {
        let (x1, y1, x2, y2) = self.clip(x1, y1, x2, y2);
        for y in y1..y2 {
            for x in x1..x2 {
                if filter(x, y) {
                    visit(self.get_tile_mut(x, y));
                }
            }
        }
    }

    /// Visits the up to four orthogonal neighbors of `(x, y)`.
    pub fn for_each_neighbor<F>(&self, x: i32, y: i32, mut visit: F)
    where
        F: FnMut(&Tile),
    {
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            if let Some(tile) = self.try_get_tile(x + dx, y + dy) {
                visit(tile);
            }
        }
    }

    fn clip(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
        (
            x1.max(0),
            y1.max(0),
            x2.min(self.width),
            y2.min(self.height),
        )
    }

    /// Expanding ring search around a footprint anchored at `origin`.
    ///
    /// Every ring is walked from a random starting index drawn from
    /// `random`. Returns `true` as soon as `visit` answers
    /// [`SearchResult::Done`], or after finishing the ring in which it first
    /// answered [`SearchResult::DoneAtDepth`]. Returns `false` once the rings
    /// have grown past the map. The origin footprint itself is never visited.
    pub fn search_all_by_box_edge<F>(
        &self,
        origin: Coord,
        size: FootprintSize,
        random: &mut Random,
        mut visit: F,
    ) -> bool
    where
        F: FnMut(&Tile) -> SearchResult,
    {
        let table = self.box_offsets.get(size);
        for depth in 1..=self.width.max(self.height) {
            let ring: Cow<'_, [(i32, i32)]> = match table {
                Some(table) if depth <= table.max_depth() => Cow::Borrowed(table.ring(depth)),
                _ => Cow::Owned(ring_offsets(size, depth)),
            };
            if ring.is_empty() {
                continue;
            }

            let last = i32::try_from(ring.len() - 1).unwrap_or(i32::MAX);
            let start = usize::try_from(random.rand(0, last)).unwrap_or(0);
            let mut done_at_depth = false;
            for step in 0..ring.len() {
                let (dx, dy) = ring[(start + step) % ring.len()];
                let Some(tile) = self.try_get_tile(origin.x + dx, origin.y + dy) else {
                    continue;
                };
                match visit(tile) {
                    SearchResult::NotDone => {}
                    SearchResult::Done => return true,
                    SearchResult::DoneAtDepth => done_at_depth = true,
                }
            }
            if done_at_depth {
                return true;
            }
        }
        false
    }

    /// Indexes `object` on the tiles it covers.
    ///
    /// Infantry receive a slot, preferring the one they already hold.
    /// Returns `false` without changing anything when an infantry unit finds
    /// every slot taken.
    pub fn assign_object(&mut self, object: &mut GameObject) -> bool {
        let id = object.id;
        let owner = object.owner;
        let location = object.location;
        match &mut object.kind {
            ObjectKind::Structure(structure) => {
                let size = structure.size;
                self.for_each_mut(
                    location.x,
                    location.y,
                    location.x + size.width,
                    location.y + size.height,
                    |tile| {
                        tile.assign_non_infantry_ground_object(id);
                        tile.set_owner(Some(owner));
                    },
                );
                true
            }
            ObjectKind::Unit(unit) => {
                let Some(tile) = self.try_get_tile_mut(location.x, location.y) else {
                    return false;
                };
                match &mut unit.role {
                    UnitRole::Infantry(infantry) => {
                        match tile.assign_infantry(id, infantry.tile_position) {
                            Some(slot) => {
                                infantry.tile_position = Some(slot);
                                true
                            }
                            None => false,
                        }
                    }
                    UnitRole::Air => {
                        tile.assign_air_unit(id);
                        true
                    }
                    UnitRole::Sandworm => {
                        tile.assign_underground_unit(id);
                        true
                    }
                    UnitRole::Vehicle | UnitRole::Harvester(_) => {
                        tile.assign_non_infantry_ground_object(id);
                        true
                    }
                }
            }
        }
    }

    /// Removes `object` from the tiles it covers.
    pub fn unassign_object(&mut self, object: &GameObject) {
        let size = object.footprint();
        let location = object.location;
        self.for_each_mut(
            location.x,
            location.y,
            location.x + size.width,
            location.y + size.height,
            |tile| tile.unassign_object(object.id),
        );
    }

    /// Removes `id` from every tile of the map.
    pub fn remove_object_from_map(&mut self, id: ObjectId) {
        for tile in &mut self.tiles {
            tile.unassign_object(id);
        }
    }

    /// Breadth-first route from `start` to `goal` avoiding blocked tiles.
    ///
    /// When the goal cannot be reached the route leads to the reachable tile
    /// closest to it. The route excludes `start`; an empty route means there
    /// is nowhere better to go.
    pub fn find_path<F>(&mut self, start: Coord, goal: Coord, mut is_blocked: F) -> Vec<Coord>
    where
        F: FnMut(&Tile) -> bool,
    {
        let Self {
            tiles,
            pathfinder,
            width,
            ..
        } = self;
        let width = *width;
        pathfinder.search(start, goal, |location| {
            usize::try_from(location.y * width + location.x)
                .ok()
                .and_then(|index| tiles.get(index))
                .map_or(true, |tile| is_blocked(tile))
        })
    }
}
