use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// City construction kinds. Persisted as the snake_case `type` tag of a
/// construction document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    CityCenter,
    Warehouse,
    Granary,
    Wall,
    RallyPoint,
    Barracks,
    Archery,
    Stable,
    HideSpot,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 9] = [
        BuildingKind::CityCenter,
        BuildingKind::Warehouse,
        BuildingKind::Granary,
        BuildingKind::Wall,
        BuildingKind::RallyPoint,
        BuildingKind::Barracks,
        BuildingKind::Archery,
        BuildingKind::Stable,
        BuildingKind::HideSpot,
    ];
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildingKind::CityCenter => "city_center",
            BuildingKind::Warehouse => "warehouse",
            BuildingKind::Granary => "granary",
            BuildingKind::Wall => "wall",
            BuildingKind::RallyPoint => "rally_point",
            BuildingKind::Barracks => "barracks",
            BuildingKind::Archery => "archery",
            BuildingKind::Stable => "stable",
            BuildingKind::HideSpot => "hide_spot",
        };
        f.write_str(name)
    }
}

impl FromStr for BuildingKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city_center" => Ok(BuildingKind::CityCenter),
            "warehouse" => Ok(BuildingKind::Warehouse),
            "granary" => Ok(BuildingKind::Granary),
            "wall" => Ok(BuildingKind::Wall),
            "rally_point" => Ok(BuildingKind::RallyPoint),
            "barracks" => Ok(BuildingKind::Barracks),
            "archery" => Ok(BuildingKind::Archery),
            "stable" => Ok(BuildingKind::Stable),
            "hide_spot" => Ok(BuildingKind::HideSpot),
            _ => Err(()),
        }
    }
}

/// Resource field kinds, one per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Wood,
    Stone,
    Iron,
    Food,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Wood,
        FieldKind::Stone,
        FieldKind::Iron,
        FieldKind::Food,
    ];
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Wood => "wood",
            FieldKind::Stone => "stone",
            FieldKind::Iron => "iron",
            FieldKind::Food => "food",
        };
        f.write_str(name)
    }
}

impl FromStr for FieldKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wood" => Ok(FieldKind::Wood),
            "stone" => Ok(FieldKind::Stone),
            "iron" => Ok(FieldKind::Iron),
            "food" => Ok(FieldKind::Food),
            _ => Err(()),
        }
    }
}
