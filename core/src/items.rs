//! Buildable and spawnable item types with their default statistics.

use serde::{Deserialize, Serialize};

use crate::{FixedPoint, FootprintSize};

/// Every structure and unit type the simulation knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemId {
    /// Infantry training structure.
    Barracks,
    /// Base construction structure.
    ConstructionYard,
    /// Defensive cannon turret.
    GunTurret,
    /// Tracked vehicle factory.
    HeavyFactory,
    /// Aircraft factory.
    HighTechFactory,
    /// Light vehicle factory.
    LightFactory,
    /// House palace.
    Palace,
    /// Outpost radar.
    Radar,
    /// Spice refinery; docks harvesters and stores spice.
    Refinery,
    /// Vehicle repair facility.
    RepairYard,
    /// Defensive rocket turret.
    RocketTurret,
    /// Spice storage.
    Silo,
    /// Single concrete slab.
    Slab1,
    /// Two by two concrete slab.
    Slab4,
    /// Starport for ordered reinforcements.
    StarPort,
    /// Wall segment.
    Wall,
    /// Power generator.
    WindTrap,
    /// Air transport.
    Carryall,
    /// Deviator missile launcher.
    Deviator,
    /// Spice harvester.
    Harvester,
    /// Rocket launcher.
    Launcher,
    /// Mobile construction vehicle.
    Mcv,
    /// Attack aircraft.
    Ornithopter,
    /// Four wheeled scout.
    Quad,
    /// Demolition infantry.
    Saboteur,
    /// Desert sandworm.
    Sandworm,
    /// Heavy tank.
    SiegeTank,
    /// Sonic tank.
    SonicTank,
    /// Light infantry.
    Soldier,
    /// Combat tank.
    Tank,
    /// Three wheeled scout.
    Trike,
    /// Heavy infantry.
    Trooper,
}

/// Default statistics for an item before any rule overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseStats {
    /// Hit points of an undamaged instance.
    pub max_health: i32,
    /// Top speed in world units per cycle. Structures have zero.
    pub max_speed: FixedPoint,
    /// Exploration radius in tiles.
    pub view_range: i32,
    /// Collision radius in world units.
    pub radius: i32,
}

const fn eighths(value: i64) -> FixedPoint {
    FixedPoint::from_bits(value << 29)
}

const fn structure(max_health: i32, view_range: i32) -> BaseStats {
    BaseStats {
        max_health,
        max_speed: FixedPoint::ZERO,
        view_range,
        radius: 16,
    }
}

const fn infantry(max_health: i32, speed_in_eighths: i64) -> BaseStats {
    BaseStats {
        max_health,
        max_speed: eighths(speed_in_eighths),
        view_range: 2,
        radius: 4,
    }
}

const fn vehicle(max_health: i32, speed_in_eighths: i64, view_range: i32) -> BaseStats {
    BaseStats {
        max_health,
        max_speed: eighths(speed_in_eighths),
        view_range,
        radius: 16,
    }
}

impl ItemId {
    /// Whether the item is a structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::Barracks
                | Self::ConstructionYard
                | Self::GunTurret
                | Self::HeavyFactory
                | Self::HighTechFactory
                | Self::LightFactory
                | Self::Palace
                | Self::Radar
                | Self::Refinery
                | Self::RepairYard
                | Self::RocketTurret
                | Self::Silo
                | Self::Slab1
                | Self::Slab4
                | Self::StarPort
                | Self::Wall
                | Self::WindTrap
        )
    }

    /// Whether the item is a unit.
    #[must_use]
    pub const fn is_unit(self) -> bool {
        !self.is_structure()
    }

    /// Foot soldiers that share tiles through sub-tile slots.
    #[must_use]
    pub const fn is_infantry(self) -> bool {
        matches!(self, Self::Soldier | Self::Trooper | Self::Saboteur)
    }

    /// Flying units tracked in the air lists of tiles.
    #[must_use]
    pub const fn is_aircraft(self) -> bool {
        matches!(self, Self::Carryall | Self::Ornithopter)
    }

    /// Concrete slabs change terrain instead of standing on it.
    #[must_use]
    pub const fn is_slab(self) -> bool {
        matches!(self, Self::Slab1 | Self::Slab4)
    }

    /// Infantry types able to take over enemy structures.
    #[must_use]
    pub const fn can_capture(self) -> bool {
        matches!(self, Self::Soldier | Self::Trooper)
    }

    /// Structures with a spice storage capacity.
    #[must_use]
    pub const fn stores_spice(self) -> bool {
        matches!(self, Self::Refinery | Self::Silo)
    }

    /// Tiles covered by the item.
    #[must_use]
    pub const fn footprint(self) -> FootprintSize {
        match self {
            Self::Barracks
            | Self::ConstructionYard
            | Self::LightFactory
            | Self::Radar
            | Self::Silo
            | Self::Slab4
            | Self::WindTrap => FootprintSize::new(2, 2),
            Self::HeavyFactory
            | Self::HighTechFactory
            | Self::Refinery
            | Self::RepairYard => FootprintSize::new(3, 2),
            Self::Palace | Self::StarPort => FootprintSize::new(3, 3),
            _ => FootprintSize::new(1, 1),
        }
    }

    /// Built-in statistics of the item.
    #[must_use]
    pub const fn base_stats(self) -> BaseStats {
        match self {
            Self::Barracks => structure(300, 3),
            Self::ConstructionYard => structure(400, 3),
            Self::GunTurret => structure(200, 5),
            Self::HeavyFactory => structure(400, 3),
            Self::HighTechFactory => structure(400, 3),
            Self::LightFactory => structure(350, 3),
            Self::Palace => structure(1000, 5),
            Self::Radar => structure(300, 7),
            Self::Refinery => structure(450, 4),
            Self::RepairYard => structure(200, 3),
            Self::RocketTurret => structure(200, 7),
            Self::Silo => structure(150, 2),
            Self::Slab1 | Self::Slab4 => structure(20, 1),
            Self::StarPort => structure(500, 4),
            Self::Wall => structure(50, 1),
            Self::WindTrap => structure(200, 2),
            Self::Carryall => vehicle(100, 48, 2),
            Self::Deviator => vehicle(120, 20, 5),
            Self::Harvester => vehicle(150, 16, 2),
            Self::Launcher => vehicle(100, 20, 5),
            Self::Mcv => vehicle(150, 16, 2),
            Self::Ornithopter => vehicle(50, 64, 5),
            Self::Quad => vehicle(130, 28, 3),
            Self::Saboteur => infantry(60, 10),
            Self::Sandworm => BaseStats {
                max_health: 1000,
                max_speed: eighths(24),
                view_range: 0,
                radius: 16,
            },
            Self::SiegeTank => vehicle(300, 16, 4),
            Self::SonicTank => vehicle(110, 20, 4),
            Self::Soldier => infantry(20, 8),
            Self::Tank => vehicle(200, 20, 3),
            Self::Trike => vehicle(100, 32, 3),
            Self::Trooper => infantry(45, 6),
        }
    }
}

/// Projectile types that can cause area damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletId {
    /// Light cannon round.
    ShellSmall,
    /// Tank cannon round.
    ShellMedium,
    /// Siege cannon round.
    ShellLarge,
    /// Gun turret round.
    ShellTurret,
    /// Infantry rocket.
    SmallRocket,
    /// Launcher rocket.
    Rocket,
    /// Palace missile.
    LargeRocket,
    /// Rocket turret missile.
    TurretRocket,
    /// Deviator gas missile.
    DRocket,
    /// Sonic tank wave.
    Sonic,
    /// Sandworm bite.
    Sandworm,
}

impl BulletId {
    /// Rockets are the only projectiles that hit aircraft and scar terrain.
    #[must_use]
    pub const fn is_rocket_family(self) -> bool {
        matches!(
            self,
            Self::SmallRocket
                | Self::Rocket
                | Self::LargeRocket
                | Self::TurretRocket
                | Self::DRocket
        )
    }

    /// Inclusive range of decal variants a terrain scar is drawn from.
    #[must_use]
    pub const fn scar_variants(self) -> (i32, i32) {
        match self {
            Self::SmallRocket => (0, 1),
            Self::LargeRocket => (4, 5),
            _ => (2, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refinery_covers_three_by_two_tiles() {
        assert_eq!(ItemId::Refinery.footprint(), FootprintSize::new(3, 2));
        assert_eq!(ItemId::Soldier.footprint(), FootprintSize::new(1, 1));
    }

    #[test]
    fn only_soldiers_and_troopers_capture() {
        assert!(ItemId::Soldier.can_capture());
        assert!(ItemId::Trooper.can_capture());
        assert!(!ItemId::Saboteur.can_capture());
        assert!(!ItemId::Tank.can_capture());
    }

    #[test]
    fn infantry_use_the_small_radius() {
        assert_eq!(ItemId::Soldier.base_stats().radius, 4);
        assert_eq!(ItemId::Tank.base_stats().radius, 16);
        assert_eq!(ItemId::Soldier.base_stats().max_speed, FixedPoint::from_num(1));
    }

    #[test]
    fn structures_do_not_move() {
        assert!(ItemId::Silo.is_structure());
        assert_eq!(ItemId::Silo.base_stats().max_speed, FixedPoint::ZERO);
        assert!(ItemId::Harvester.is_unit());
    }

    #[test]
    fn deviator_rocket_hits_aircraft() {
        assert!(BulletId::DRocket.is_rocket_family());
        assert!(!BulletId::Sonic.is_rocket_family());
        assert!(!BulletId::ShellLarge.is_rocket_family());
    }
}
