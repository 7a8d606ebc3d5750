//! Tunable game rules loaded from TOML.

use std::{fs, path::Path};

use arrakis_core::{fix, BaseStats, FixedPoint, ItemId};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading rules.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The rules file could not be read.
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),
    /// The rules text is not valid TOML for the rules schema.
    #[error("failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Per-item statistic overrides.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatOverride {
    /// Item the overrides apply to.
    pub item: ItemId,
    /// Replacement hit points.
    #[serde(default)]
    pub max_health: Option<i32>,
    /// Replacement top speed in world units per cycle.
    #[serde(default, deserialize_with = "fixed_from_float::optional")]
    pub max_speed: Option<FixedPoint>,
    /// Replacement exploration radius in tiles.
    #[serde(default)]
    pub view_range: Option<i32>,
}

/// Game rules shared by every system.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Spice a harvester extracts from a tile per cycle.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub harvest_speed: FixedPoint,
    /// Spice a harvester can carry.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub harvester_capacity: FixedPoint,
    /// Spice a refinery unloads from a docked harvester per cycle.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub unload_speed: FixedPoint,
    /// Credits of storage each refinery adds.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub refinery_capacity: FixedPoint,
    /// Credits of storage each silo adds.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub silo_capacity: FixedPoint,
    /// Health a repair yard restores per cycle.
    #[serde(deserialize_with = "fixed_from_float::required")]
    pub repair_speed: FixedPoint,
    /// Tiles a new structure may lie from the house's territory.
    pub build_range: i32,
    /// Whether structures need concrete underneath.
    pub concrete_required: bool,
    /// Whether explored tiles fall back into fog when unobserved.
    pub fog_of_war: bool,
    /// Cycles after which an unobserved tile is fogged again.
    pub fog_timeout: u32,
    /// Cycles a deviated unit fights for the deviator.
    pub deviation_cycles: u32,
    /// Statistic overrides by item.
    pub stats: Vec<StatOverride>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            harvest_speed: FixedPoint::from_bits(429_496_730),
            harvester_capacity: fix(700),
            unload_speed: fix(4),
            refinery_capacity: fix(1000),
            silo_capacity: fix(1000),
            repair_speed: FixedPoint::from_bits(1 << 31),
            build_range: 2,
            concrete_required: false,
            fog_of_war: false,
            fog_timeout: 625,
            deviation_cycles: 1250,
            stats: Vec::new(),
        }
    }
}

impl Rules {
    /// Parses and validates rules from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, RulesError> {
        let rules: Rules = toml::from_str(text)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reads, parses and validates a rules file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), RulesError> {
        let positive = [
            ("harvest_speed", self.harvest_speed),
            ("harvester_capacity", self.harvester_capacity),
            ("unload_speed", self.unload_speed),
        ];
        for (field, value) in positive {
            if value <= FixedPoint::ZERO {
                return Err(RulesError::InvalidValue {
                    field,
                    reason: "must be positive",
                });
            }
        }

        let non_negative = [
            ("refinery_capacity", self.refinery_capacity),
            ("silo_capacity", self.silo_capacity),
            ("repair_speed", self.repair_speed),
        ];
        for (field, value) in non_negative {
            if value < FixedPoint::ZERO {
                return Err(RulesError::InvalidValue {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        if self.build_range < 0 {
            return Err(RulesError::InvalidValue {
                field: "build_range",
                reason: "must not be negative",
            });
        }

        for stat in &self.stats {
            if stat.max_health.is_some_and(|health| health <= 0) {
                return Err(RulesError::InvalidValue {
                    field: "stats.max_health",
                    reason: "must be positive",
                });
            }
            if stat.max_speed.is_some_and(|speed| speed < FixedPoint::ZERO) {
                return Err(RulesError::InvalidValue {
                    field: "stats.max_speed",
                    reason: "must not be negative",
                });
            }
        }
        Ok(())
    }

    /// Statistics of `item` with every matching override applied in order.
    #[must_use]
    pub fn stats(&self, item: ItemId) -> BaseStats {
        let mut stats = item.base_stats();
        for stat in self.stats.iter().filter(|stat| stat.item == item) {
            if let Some(max_health) = stat.max_health {
                stats.max_health = max_health;
            }
            if let Some(max_speed) = stat.max_speed {
                stats.max_speed = max_speed;
            }
            if let Some(view_range) = stat.view_range {
                stats.view_range = view_range;
            }
        }
        stats
    }

    /// Storage capacity a structure adds to its house.
    #[must_use]
    pub fn storage_of(&self, item: ItemId) -> FixedPoint {
        match item {
            ItemId::Refinery => self.refinery_capacity,
            ItemId::Silo => self.silo_capacity,
            _ => FixedPoint::ZERO,
        }
    }
}

mod fixed_from_float {
    use arrakis_core::FixedPoint;
    use serde::{de::Error, Deserialize, Deserializer};

    fn convert<E: Error>(value: f64) -> Result<FixedPoint, E> {
        FixedPoint::checked_from_num(value)
            .ok_or_else(|| E::custom(format!("{value} does not fit a fixed-point number")))
    }

    pub(super) fn required<'de, D>(deserializer: D) -> Result<FixedPoint, D::Error>
    where
        D: Deserializer<'de>,
    {
        convert(f64::deserialize(deserializer)?)
    }

    pub(super) fn optional<'de, D>(deserializer: D) -> Result<Option<FixedPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(convert)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_defaults() {
        let rules = Rules::from_toml_str("").expect("rules");
        assert_eq!(rules, Rules::default());
        assert_eq!(rules.build_range, 2);
        assert!(rules.harvest_speed > FixedPoint::from_num(0.099));
        assert!(rules.harvest_speed < FixedPoint::from_num(0.101));
    }

    #[test]
    fn overrides_replace_base_stats() {
        let rules = Rules::from_toml_str(
            r#"
            harvest_speed = 0.5
            fog_of_war = true

            [[stats]]
            item = "Trike"
            max_speed = 6.0
            view_range = 4
            "#,
        )
        .expect("rules");
        assert_eq!(rules.harvest_speed, FixedPoint::from_num(0.5));
        assert!(rules.fog_of_war);

        let trike = rules.stats(ItemId::Trike);
        assert_eq!(trike.max_speed, fix(6));
        assert_eq!(trike.view_range, 4);
        assert_eq!(trike.max_health, ItemId::Trike.base_stats().max_health);
        assert_eq!(rules.stats(ItemId::Quad), ItemId::Quad.base_stats());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let error = Rules::from_toml_str("harvest_speed = 0.0").expect_err("invalid");
        assert!(matches!(
            error,
            RulesError::InvalidValue {
                field: "harvest_speed",
                ..
            }
        ));
        assert!(matches!(
            Rules::from_toml_str("unknown_field = 1"),
            Err(RulesError::Parse(_))
        ));
        assert!(matches!(
            Rules::from_toml_str("[[stats]]\nitem = \"Tank\"\nmax_health = -5"),
            Err(RulesError::InvalidValue { .. })
        ));
    }

    #[test]
    fn storage_comes_from_refineries_and_silos() {
        let rules = Rules::default();
        assert_eq!(rules.storage_of(ItemId::Refinery), fix(1000));
        assert_eq!(rules.storage_of(ItemId::Silo), fix(1000));
        assert_eq!(rules.storage_of(ItemId::Radar), FixedPoint::ZERO);
    }
}
