use chrono::{DateTime, Utc};

use minute_empire_types::buildings::{BuildingKind, FieldKind};
use minute_empire_types::common::{DocId, Resources};
use minute_empire_types::map::Location;
use minute_empire_types::troops::{Troop, TroopKind, TroopMode};

use crate::models::village::{City, Construction, ResourceField, Village, Wall};

/// Options for [`village_factory`]. Unset fields fall back to a small plain
/// village: level-1 wall, no fields, no constructions, 500 of everything.
pub struct VillageFactoryOptions {
    pub owner_id: Option<DocId>,
    pub location: Option<Location>,
    pub resources: Option<Resources>,
    /// (kind, level, slot)
    pub fields: Vec<(FieldKind, u8, u8)>,
    /// (kind, level, slot)
    pub constructions: Vec<(BuildingKind, u8, u8)>,
    pub wall_level: u8,
    pub res_update_at: Option<DateTime<Utc>>,
}

impl Default for VillageFactoryOptions {
    fn default() -> Self {
        Self {
            owner_id: None,
            location: None,
            resources: None,
            fields: vec![],
            constructions: vec![],
            wall_level: 1,
            res_update_at: None,
        }
    }
}

pub fn village_factory(options: VillageFactoryOptions) -> Village {
    let now = options.res_update_at.unwrap_or_else(Utc::now);

    Village {
        id: DocId::new(),
        name: "Testville".to_string(),
        owner_id: options.owner_id.unwrap_or_default(),
        location: options.location.unwrap_or(Location::new(0, 0)),
        resources: options
            .resources
            .unwrap_or(Resources::new(500.0, 500.0, 500.0, 500.0)),
        resource_fields: options
            .fields
            .into_iter()
            .map(|(kind, level, slot)| ResourceField { kind, level, slot })
            .collect(),
        city: City {
            wall: Wall {
                level: options.wall_level,
            },
            constructions: options
                .constructions
                .into_iter()
                .map(|(kind, level, slot)| Construction { kind, level, slot })
                .collect(),
        },
        construction_tasks: vec![],
        troop_training_tasks: vec![],
        res_update_at: now,
        created_at: now,
        updated_at: now,
    }
}

pub struct TroopFactoryOptions {
    pub kind: TroopKind,
    pub home_id: Option<DocId>,
    pub quantity: u32,
    pub location: Location,
    pub mode: TroopMode,
    pub backpack: Resources,
}

impl Default for TroopFactoryOptions {
    fn default() -> Self {
        Self {
            kind: TroopKind::Militia,
            home_id: None,
            quantity: 10,
            location: Location::new(0, 0),
            mode: TroopMode::Idle,
            backpack: Resources::ZERO,
        }
    }
}

pub fn troop_factory(options: TroopFactoryOptions) -> Troop {
    let now = Utc::now();
    Troop {
        id: DocId::new(),
        kind: options.kind,
        home_id: options.home_id.unwrap_or_default(),
        quantity: options.quantity,
        location: options.location,
        mode: options.mode,
        backpack: options.backpack,
        created_at: now,
        updated_at: now,
    }
}
