//! Click and rectangle selection of objects.

use std::collections::BTreeSet;

use arrakis_core::{Coord, HouseId, ItemId, ObjectId};

use crate::{context::GameContext, objects::ObjectManager, tile::Tile};

/// Objects currently selected by the local player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<ObjectId>,
    last_singly_selected: Option<ObjectId>,
}

impl Selection {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected object identifiers in ascending order.
    #[must_use]
    pub fn selected(&self) -> &BTreeSet<ObjectId> {
        &self.selected
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    /// Object picked by the most recent single click, if any.
    #[must_use]
    pub fn last_singly_selected(&self) -> Option<ObjectId> {
        self.last_singly_selected
    }

    /// Drops identifiers of objects that no longer exist.
    pub fn prune(&mut self, objects: &ObjectManager) {
        self.selected.retain(|id| objects.contains(*id));
        if self
            .last_singly_selected
            .is_some_and(|id| !objects.contains(id))
        {
            self.last_singly_selected = None;
        }
    }
}

/// A selection gesture of the local player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    /// House making the selection.
    pub house: HouseId,
    /// First corner of the selection rectangle in tiles.
    pub from: Coord,
    /// Opposite corner of the selection rectangle in tiles.
    pub to: Coord,
    /// Clicked point in world units, used to pick among objects on one tile.
    pub click: Coord,
    /// Upper-left visible tile.
    pub view_top_left: Coord,
    /// Lower-right visible tile, inclusive.
    pub view_bottom_right: Coord,
    /// Whether the gesture adds to (or toggles within) the selection.
    pub add_to_selection: bool,
}

#[derive(Default)]
struct Pick {
    last_checked: Option<ObjectId>,
}

impl GameContext {
    /// Object on `tile` under the world point `click`.
    ///
    /// Air units win over ground vehicles and structures, which win over
    /// the infantry closest to the click, which win over burrowed units.
    #[must_use]
    pub fn object_at(&self, tile: &Tile, click: Coord) -> Option<ObjectId> {
        if let Some(id) = tile.air_units().first() {
            return Some(*id);
        }
        if let Some(id) = tile.non_infantry_ground_objects().first() {
            return Some(*id);
        }
        let closest_infantry = tile
            .infantry()
            .iter()
            .filter_map(|(id, _)| self.objects.get(*id))
            .min_by_key(|infantry| infantry.real_pos.rounded().distance_to(click))
            .map(|infantry| infantry.id);
        if closest_infantry.is_some() {
            return closest_infantry;
        }
        tile.underground_units().first().copied()
    }

    /// Updates `selection` for a click or rectangle drag.
    ///
    /// A click on a unit that is already the single selection selects every
    /// unit of that type the house has in view. A rectangle selects the
    /// house's units on the explored tiles it covers. When nothing of the
    /// house's own was found, the last object under the gesture is selected
    /// for inspection.
    pub fn select_objects(&mut self, selection: &mut Selection, request: &SelectionRequest) {
        if !request.add_to_selection {
            self.unselect_all(selection);
        }
        let team = self.team_of(request.house);
        let mut pick = Pick::default();

        if request.from == request.to {
            let Coord { x, y } = request.from;
            pick.last_checked = self
                .map
                .try_get_tile(x, y)
                .filter(|tile| tile.is_explored_by_team(team))
                .and_then(|tile| self.object_at(tile, request.click));

            let own = pick.last_checked.and_then(|id| {
                self.objects
                    .get(id)
                    .filter(|object| object.owner == request.house)
                    .map(|object| (id, object.item, object.is_structure(), object.selected))
            });
            match own {
                Some((id, item, false, _)) if selection.last_singly_selected == Some(id) => {
                    self.select_type_in_view(selection, request, item, &mut pick);
                    selection.last_singly_selected = None;
                }
                Some((id, _, _, false)) => {
                    self.set_selected(selection, id, true);
                    selection.last_singly_selected = Some(id);
                }
                Some((id, _, _, true)) if request.add_to_selection => {
                    self.set_selected(selection, id, false);
                }
                _ => {}
            }
        } else {
            selection.last_singly_selected = None;
            let (x1, x2) = (request.from.x.min(request.to.x), request.from.x.max(request.to.x));
            let (y1, y2) = (request.from.y.min(request.to.y), request.from.y.max(request.to.y));
            let fog_of_war = self.rules.fog_of_war;
            let (cycle, timeout) = (self.cycle, self.rules.fog_timeout);
            let mut candidates = Vec::new();
            self.map.for_each(x1, y1, x2 + 1, y2 + 1, |tile| {
                let visible = tile.is_explored_by_team(team)
                    && !(fog_of_war && tile.is_fogged_by_team(team, cycle, timeout));
                if visible {
                    candidates.extend(tile.object_ids());
                }
            });
            self.select_units(selection, request.house, None, candidates, &mut pick);
        }

        if selection.selected.is_empty() {
            if let Some(id) = pick.last_checked {
                if self.objects.get(id).is_some_and(|object| !object.selected) {
                    self.set_selected(selection, id, true);
                }
            }
        }
    }

    fn select_type_in_view(
        &mut self,
        selection: &mut Selection,
        request: &SelectionRequest,
        item: ItemId,
        pick: &mut Pick,
    ) {
        let mut candidates = Vec::new();
        self.map.for_each(
            request.view_top_left.x,
            request.view_top_left.y,
            request.view_bottom_right.x + 1,
            request.view_bottom_right.y + 1,
            |tile| candidates.extend(tile.object_ids()),
        );
        self.select_units(selection, request.house, Some(item), candidates, pick);
    }

    fn select_units(
        &mut self,
        selection: &mut Selection,
        house: HouseId,
        item: Option<ItemId>,
        candidates: Vec<ObjectId>,
        pick: &mut Pick,
    ) {
        for id in candidates {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            if item.is_some_and(|item| item != object.item) {
                continue;
            }
            pick.last_checked = Some(id);
            if object.owner == house && !object.selected && !object.is_structure() {
                self.set_selected(selection, id, true);
            }
        }
    }

    fn set_selected(&mut self, selection: &mut Selection, id: ObjectId, selected: bool) {
        if let Some(object) = self.objects.get_mut(id) {
            object.selected = selected;
        }
        if selected {
            let _ = selection.selected.insert(id);
        } else {
            let _ = selection.selected.remove(&id);
        }
    }

    /// Clears the selection.
    pub fn unselect_all(&mut self, selection: &mut Selection) {
        for id in std::mem::take(&mut selection.selected) {
            if let Some(object) = self.objects.get_mut(id) {
                object.selected = false;
            }
        }
    }
}
