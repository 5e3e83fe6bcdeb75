use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DocId, Resources};
use crate::map::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroopKind {
    Militia,
    Archer,
    LightCavalry,
    Pikeman,
}

impl TroopKind {
    pub const ALL: [TroopKind; 4] = [
        TroopKind::Militia,
        TroopKind::Archer,
        TroopKind::LightCavalry,
        TroopKind::Pikeman,
    ];
}

impl fmt::Display for TroopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TroopKind::Militia => "militia",
            TroopKind::Archer => "archer",
            TroopKind::LightCavalry => "light_cavalry",
            TroopKind::Pikeman => "pikeman",
        };
        f.write_str(name)
    }
}

impl FromStr for TroopKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "militia" => Ok(TroopKind::Militia),
            "archer" => Ok(TroopKind::Archer),
            "light_cavalry" => Ok(TroopKind::LightCavalry),
            "pikeman" => Ok(TroopKind::Pikeman),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TroopMode {
    Idle,
    Move,
    Attack,
    Defend,
}

/// Troop document. A troop with `quantity == 0` is deleted, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Troop {
    #[serde(rename = "_id")]
    pub id: DocId,
    #[serde(rename = "type")]
    pub kind: TroopKind,
    pub home_id: DocId,
    pub quantity: u32,
    pub location: Location,
    pub mode: TroopMode,
    pub backpack: Resources,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
