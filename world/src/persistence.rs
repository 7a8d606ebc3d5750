//! Binary save format for maps and whole games.
//!
//! A save starts with a four byte magic tag and a little-endian format
//! version, followed by the bincode encoding of the state. Lookup tables
//! derived from the map dimensions are rebuilt after loading.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use arrakis_core::{HouseId, Random};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{context::GameContext, house::House, map::Map, objects::ObjectManager, rules::Rules};

/// Magic tag of a saved map.
pub const MAP_MAGIC: [u8; 4] = *b"AKMP";

/// Magic tag of a saved game.
pub const GAME_MAGIC: [u8; 4] = *b"AKSV";

/// Current save format version.
pub const FORMAT_VERSION: u16 = 1;

/// Errors raised while saving or loading.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The state could not be encoded or decoded.
    #[error("failed to encode or decode the saved state: {0}")]
    Codec(#[from] bincode::Error),
    /// Reading or writing the underlying stream failed.
    #[error("failed to access the save stream: {0}")]
    Io(#[from] std::io::Error),
    /// The stream does not start with the expected magic tag.
    #[error("unexpected magic tag {found:?}")]
    BadMagic {
        /// Bytes found where the tag was expected.
        found: [u8; 4],
    },
    /// The stream was written by an unknown format version.
    #[error("unsupported save format version {0}")]
    UnsupportedVersion(u16),
    /// The stored tiles do not match the stored dimensions.
    #[error("map of {width}x{height} tiles does not match its tile data")]
    DimensionMismatch {
        /// Stored number of columns.
        width: i32,
        /// Stored number of rows.
        height: i32,
    },
}

fn write_header<W: Write>(writer: &mut W, magic: [u8; 4]) -> Result<(), PersistenceError> {
    writer.write_all(&magic)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    Ok(())
}

fn read_header<R: Read>(reader: &mut R, magic: [u8; 4]) -> Result<(), PersistenceError> {
    let mut found = [0; 4];
    reader.read_exact(&mut found)?;
    if found != magic {
        return Err(PersistenceError::BadMagic { found });
    }
    let mut version = [0; 2];
    reader.read_exact(&mut version)?;
    let version = u16::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    Ok(())
}

fn restore_map(mut map: Map) -> Result<Map, PersistenceError> {
    if !map.is_consistent() {
        return Err(PersistenceError::DimensionMismatch {
            width: map.width(),
            height: map.height(),
        });
    }
    map.rebuild_derived();
    Ok(map)
}

impl Map {
    /// Writes the map to `writer`.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), PersistenceError> {
        write_header(&mut writer, MAP_MAGIC)?;
        bincode::serialize_into(&mut writer, self)?;
        Ok(())
    }

    /// Reads a map written by [`Map::save`].
    pub fn load<R: Read>(mut reader: R) -> Result<Self, PersistenceError> {
        read_header(&mut reader, MAP_MAGIC)?;
        let map: Map = bincode::deserialize_from(&mut reader)?;
        let map = restore_map(map)?;
        log::debug!("loaded {}x{} map", map.width(), map.height());
        Ok(map)
    }
}

#[derive(Serialize)]
struct SavedGameRef<'a> {
    map: &'a Map,
    objects: &'a ObjectManager,
    houses: &'a BTreeMap<HouseId, House>,
    random: &'a Random,
    cycle: u32,
}

#[derive(Deserialize)]
struct SavedGame {
    map: Map,
    objects: ObjectManager,
    houses: BTreeMap<HouseId, House>,
    random: Random,
    cycle: u32,
}

impl GameContext {
    /// Writes the game state to `writer`. Rules are not part of a save.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), PersistenceError> {
        write_header(&mut writer, GAME_MAGIC)?;
        bincode::serialize_into(
            &mut writer,
            &SavedGameRef {
                map: &self.map,
                objects: &self.objects,
                houses: &self.houses,
                random: &self.random,
                cycle: self.cycle,
            },
        )?;
        log::info!(
            "saved game at cycle {} with {} objects",
            self.cycle,
            self.objects.len()
        );
        Ok(())
    }

    /// Reads a game written by [`GameContext::save`], playing by `rules`.
    pub fn load<R: Read>(mut reader: R, rules: Rules) -> Result<Self, PersistenceError> {
        read_header(&mut reader, GAME_MAGIC)?;
        let saved: SavedGame = bincode::deserialize_from(&mut reader)?;
        let context = Self {
            map: restore_map(saved.map)?,
            objects: saved.objects,
            houses: saved.houses,
            random: saved.random,
            rules,
            cycle: saved.cycle,
        };
        log::info!(
            "loaded game at cycle {} with {} objects",
            context.cycle,
            context.objects.len()
        );
        Ok(context)
    }
}
