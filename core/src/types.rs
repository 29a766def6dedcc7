//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategic game time in minutes since campaign start.
pub type GameMinute = u32;

/// Profile ID of a merc or NPC.
pub type ProfileId = u8;

/// Slot number of a soldier in the tactical world.
pub type SoldierId = u16;

/// Grid number on the tactical map.
pub type GridNo = i16;

/// Identifier of a map structure (wall, door, roof section).
pub type StructureId = u32;

/// Item type identifier from the item catalog.
pub type ItemId = u16;

/// Strategic map sector. Ground sectors have z == 0; basements go down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorId {
    pub x: i16,
    pub y: i16,
    pub z: i8,
}

impl SectorId {
    pub fn ground(x: i16, y: i16) -> Self {
        Self { x, y, z: 0 }
    }
}

impl fmt::Display for SectorId {
    /// Short form used in briefings and logs: "A9", "B12-1" if underground.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = (b'A' + (self.y - 1).clamp(0, 15) as u8) as char;
        if self.z == 0 {
            write!(f, "{row}{}", self.x)
        } else {
            write!(f, "{row}{}-{}", self.x, self.z)
        }
    }
}

/// Reference to a soldier in the tactical world. Crosses the script
/// boundary as an integer handle; scripts resolve it through their own
/// soldier API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoldierRef {
    pub id: SoldierId,
    pub profile: ProfileId,
}
