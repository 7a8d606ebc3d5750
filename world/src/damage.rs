//! Area damage dealt by exploding projectiles.

use std::collections::BTreeSet;

use arrakis_core::{
    fix, Blast, BulletId, Coord, DecalKind, Event, HouseId, ItemId, ObjectId, TerrainType,
};

use crate::{
    context::GameContext,
    objects::GameObject,
    tile::{TerrainDecal, Tile},
};

/// Tiles around the blast centre searched for candidates.
const SEARCH_RADIUS: i32 = 2;

/// Damage left after falloff over `distance` world units.
///
/// The damage halves for every `step` world units of distance, plus once
/// more for leaving the centre.
#[must_use]
pub fn falloff(damage: i32, distance: i32, step: i32) -> i32 {
    let shift = u32::try_from(distance.max(1) / step + 1).unwrap_or(u32::MAX);
    damage.checked_shr(shift).unwrap_or(0)
}

impl GameContext {
    /// Applies an explosion to every object and tile it reaches.
    pub fn damage(&mut self, blast: &Blast, out_events: &mut Vec<Event>) {
        let location = blast.real_pos.world_to_tile();

        if blast.air {
            if blast.bullet.is_rocket_family() {
                self.damage_air_units(blast, location, out_events);
            }
            return;
        }

        if blast.bullet == BulletId::Sandworm {
            self.damage_co_located(blast, location, out_events);
            return;
        }

        self.damage_ground_objects(blast, location, out_events);

        if blast.bullet.is_rocket_family() {
            self.scar_terrain(blast, location);
        }
        if blast.bullet != BulletId::Sonic {
            self.trigger_bloom(location, blast.damager_owner, out_events);
        }
    }

    fn candidates<F>(&self, location: Coord, mut collect: F) -> BTreeSet<ObjectId>
    where
        F: FnMut(&Tile, &mut BTreeSet<ObjectId>),
    {
        let mut found = BTreeSet::new();
        self.map.for_each(
            location.x - SEARCH_RADIUS,
            location.y - SEARCH_RADIUS,
            location.x + SEARCH_RADIUS + 1,
            location.y + SEARCH_RADIUS + 1,
            |tile| collect(tile, &mut found),
        );
        found
    }

    fn damage_air_units(&mut self, blast: &Blast, location: Coord, out_events: &mut Vec<Event>) {
        let air_units = self.candidates(location, |tile, found| {
            found.extend(tile.air_units().iter().copied());
        });
        for id in air_units {
            let Some(distance) = self.distance_in_reach(id, blast) else {
                continue;
            };
            if blast.bullet == BulletId::DRocket {
                self.roll_deviation(id, blast.damager_owner, out_events);
            } else {
                let amount = falloff(blast.damage, distance, 4);
                self.handle_damage(id, fix(amount), out_events);
            }
        }
    }

    fn damage_co_located(&mut self, blast: &Blast, location: Coord, out_events: &mut Vec<Event>) {
        let Some(tile) = self.map.try_get_tile(location.x, location.y) else {
            return;
        };
        let victims: Vec<ObjectId> = tile
            .infantry()
            .iter()
            .map(|(id, _)| *id)
            .chain(tile.non_infantry_ground_objects().iter().copied())
            .collect();
        for id in victims {
            if self.objects.get(id).is_some_and(GameObject::is_structure) {
                continue;
            }
            self.handle_damage(id, fix(blast.damage), out_events);
        }
    }

    fn damage_ground_objects(
        &mut self,
        blast: &Blast,
        location: Coord,
        out_events: &mut Vec<Event>,
    ) {
        let ground_objects = self.candidates(location, |tile, found| {
            found.extend(tile.ground_object_ids());
        });
        for id in ground_objects {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            if object.is_structure() {
                if !object.covers(blast.real_pos.world_to_tile()) {
                    continue;
                }
                self.handle_damage(id, fix(blast.damage), out_events);
                let cycle = self.cycle;
                if let Some(structure) = self.objects.get_mut(id) {
                    if structure.health < fix(structure.max_health) / 2 {
                        if let Some(state) = structure.as_structure_mut() {
                            state.add_smoke(blast.real_pos, cycle);
                        }
                    }
                }
                continue;
            }

            let Some(distance) = self.distance_in_reach(id, blast) else {
                continue;
            };
            match blast.bullet {
                BulletId::DRocket => self.roll_deviation(id, blast.damager_owner, out_events),
                BulletId::Sonic => self.handle_damage(id, fix(blast.damage), out_events),
                _ => {
                    let amount = falloff(blast.damage, distance, 16);
                    self.handle_damage(id, fix(amount), out_events);
                }
            }
        }
    }

    fn distance_in_reach(&self, id: ObjectId, blast: &Blast) -> Option<i32> {
        let object = self.objects.get(id)?;
        let distance = object.center_point().distance_to(blast.real_pos).max(1);
        (distance - object.radius <= blast.radius).then_some(distance)
    }

    fn roll_deviation(
        &mut self,
        id: ObjectId,
        deviator: Option<HouseId>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(deviator) = deviator else {
            return;
        };
        let Some(object) = self.objects.get(id) else {
            return;
        };
        if object.owner == deviator || object.item == ItemId::Sandworm {
            return;
        }
        let weakness = object.owner.deviate_weakness();
        if self.random.rand_fix_point() < weakness {
            self.deviate(id, deviator, out_events);
        }
    }

    fn scar_terrain(&mut self, blast: &Blast, location: Coord) {
        let (low, high) = blast.bullet.scar_variants();
        let Some(tile) = self.map.try_get_tile_mut(location.x, location.y) else {
            return;
        };
        if tile.has_a_non_infantry_ground_object() {
            return;
        }
        if tile.is_concrete() {
            tile.set_terrain(TerrainType::Rock);
            tile.set_owner(None);
        }
        let kind = if tile.is_rock() && !tile.is_mountain() {
            DecalKind::Rock
        } else if tile.is_sand() || tile.is_spice() {
            DecalKind::Sand
        } else {
            return;
        };
        let variant = u8::try_from(self.random.rand(low, high)).unwrap_or(0);
        if let Some(tile) = self.map.try_get_tile_mut(location.x, location.y) {
            tile.add_damage(TerrainDecal {
                kind,
                variant,
                real_pos: blast.real_pos,
            });
        }
    }
}
