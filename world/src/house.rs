//! Economic bookkeeping of a single house.

use std::collections::BTreeMap;

use arrakis_core::{fixed_serde, FixedPoint, HouseId, ItemId, TeamId};
use serde::{Deserialize, Serialize};

/// Credits, storage capacity and object counters of one house.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct House {
    id: HouseId,
    team: TeamId,
    #[serde(with = "fixed_serde")]
    starting_credits: FixedPoint,
    #[serde(with = "fixed_serde")]
    stored_credits: FixedPoint,
    #[serde(with = "fixed_serde")]
    capacity: FixedPoint,
    #[serde(with = "fixed_serde")]
    harvested_spice: FixedPoint,
    units: BTreeMap<ItemId, u32>,
    structures: BTreeMap<ItemId, u32>,
}

impl House {
    /// Creates a house with an initial credit balance and no storage.
    #[must_use]
    pub fn new(id: HouseId, team: TeamId, starting_credits: FixedPoint) -> Self {
        Self {
            id,
            team,
            starting_credits: starting_credits.max(FixedPoint::ZERO),
            stored_credits: FixedPoint::ZERO,
            capacity: FixedPoint::ZERO,
            harvested_spice: FixedPoint::ZERO,
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
        }
    }

    /// Identifier of the house.
    #[must_use]
    pub const fn id(&self) -> HouseId {
        self.id
    }

    /// Team the house belongs to.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Spendable credits.
    #[must_use]
    pub fn credits(&self) -> FixedPoint {
        self.starting_credits + self.stored_credits
    }

    /// Credits granted at game start or refunded.
    #[must_use]
    pub const fn starting_credits(&self) -> FixedPoint {
        self.starting_credits
    }

    /// Credits held in refineries and silos.
    #[must_use]
    pub const fn stored_credits(&self) -> FixedPoint {
        self.stored_credits
    }

    /// Storage capacity of all refineries and silos.
    #[must_use]
    pub const fn capacity(&self) -> FixedPoint {
        self.capacity
    }

    /// Total spice ever refined.
    #[must_use]
    pub const fn harvested_spice(&self) -> FixedPoint {
        self.harvested_spice
    }

    /// Stores credits, dropping whatever exceeds the capacity.
    pub fn add_credits(&mut self, amount: FixedPoint, was_refined: bool) {
        if amount <= FixedPoint::ZERO {
            return;
        }
        if was_refined {
            self.harvested_spice += amount;
        }
        self.stored_credits = (self.stored_credits + amount).min(self.capacity);
    }

    /// Withdraws up to `amount`, stored credits first. Returns what was taken.
    pub fn take_credits(&mut self, amount: FixedPoint) -> FixedPoint {
        if amount <= FixedPoint::ZERO || self.credits() < FixedPoint::ONE {
            return FixedPoint::ZERO;
        }

        if self.stored_credits > amount {
            self.stored_credits -= amount;
            amount
        } else if self.credits() > amount {
            self.starting_credits -= amount - self.stored_credits;
            self.stored_credits = FixedPoint::ZERO;
            amount
        } else {
            let taken = self.credits();
            self.starting_credits = FixedPoint::ZERO;
            self.stored_credits = FixedPoint::ZERO;
            taken
        }
    }

    /// Refunds credits; refunds never count against storage.
    pub fn return_credits(&mut self, amount: FixedPoint) {
        if amount > FixedPoint::ZERO {
            self.starting_credits += amount;
        }
    }

    /// Number of live units of `item`.
    #[must_use]
    pub fn unit_count(&self, item: ItemId) -> u32 {
        self.units.get(&item).copied().unwrap_or(0)
    }

    /// Number of live structures of `item`.
    #[must_use]
    pub fn structure_count(&self, item: ItemId) -> u32 {
        self.structures.get(&item).copied().unwrap_or(0)
    }

    /// Number of live units of any type.
    #[must_use]
    pub fn num_units(&self) -> u32 {
        self.units.values().sum()
    }

    /// Number of live structures of any type.
    #[must_use]
    pub fn num_structures(&self) -> u32 {
        self.structures.values().sum()
    }

    /// Records a new unit.
    pub fn increment_units(&mut self, item: ItemId) {
        *self.units.entry(item).or_insert(0) += 1;
    }

    /// Records a lost unit.
    pub fn decrement_units(&mut self, item: ItemId) {
        if let Some(count) = self.units.get_mut(&item) {
            *count = count.saturating_sub(1);
        }
    }

    /// Records a new structure and the storage it brings.
    pub fn increment_structures(&mut self, item: ItemId, storage: FixedPoint) {
        *self.structures.entry(item).or_insert(0) += 1;
        self.capacity += storage;
    }

    /// Records a lost structure; stored credits shrink with the storage.
    pub fn decrement_structures(&mut self, item: ItemId, storage: FixedPoint) {
        if let Some(count) = self.structures.get_mut(&item) {
            *count = count.saturating_sub(1);
        }
        self.capacity = (self.capacity - storage).max(FixedPoint::ZERO);
        self.stored_credits = self.stored_credits.min(self.capacity);
    }
}
