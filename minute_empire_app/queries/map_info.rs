use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use minute_empire_game::models::village::Village;
use minute_empire_game::world;
use minute_empire_types::common::{DocId, ResourceKind, Resources};
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::map::Location;
use minute_empire_types::tasks::{ConstructionTask, TroopAction, TroopTrainingTask};
use minute_empire_types::troops::{TroopKind, TroopMode};

use crate::context::HandlerContext;

#[derive(Debug, Clone, Serialize)]
pub struct MapBounds {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerInfo {
    pub id: DocId,
    pub family_name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub current: f64,
    pub rate: f64,
    pub capacity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VillageResources {
    pub wood: ResourceInfo,
    pub stone: ResourceInfo,
    pub iron: ResourceInfo,
    pub food: ResourceInfo,
}

/// One village on the map. Foreign villages carry only the public header;
/// the owner additionally sees stocks, rates, tasks and population.
#[derive(Debug, Clone, Serialize)]
pub struct MapVillage {
    pub id: DocId,
    pub name: String,
    pub location: Location,
    pub owner: OwnerInfo,
    pub is_owned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<VillageResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_fields: Option<Vec<minute_empire_game::models::village::ResourceField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<minute_empire_game::models::village::City>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction_tasks: Option<Vec<ConstructionTask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troop_training_tasks: Option<Vec<TroopTrainingTask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_population: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_population: Option<u32>,
}

/// A troop on the map; mode and cargo are visible to its owner only.
#[derive(Debug, Clone, Serialize)]
pub struct MapTroop {
    pub id: DocId,
    #[serde(rename = "type")]
    pub kind: TroopKind,
    pub home_id: DocId,
    pub quantity: u32,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TroopMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backpack: Option<Resources>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapInfo {
    pub map_bounds: MapBounds,
    pub map_size: i32,
    pub server_time: DateTime<Utc>,
    pub villages: Vec<MapVillage>,
    pub troops: Vec<MapTroop>,
    pub troop_actions: Vec<TroopAction>,
}

fn resource_info(village: &Village, kind: ResourceKind) -> ResourceInfo {
    ResourceInfo {
        current: village.resources.get(kind),
        rate: village.resource_rate(kind),
        capacity: village.storage_capacity(kind),
    }
}

fn detailed_resources(village: &Village) -> VillageResources {
    VillageResources {
        wood: resource_info(village, ResourceKind::Wood),
        stone: resource_info(village, ResourceKind::Stone),
        iron: resource_info(village, ResourceKind::Iron),
        food: resource_info(village, ResourceKind::Food),
    }
}

/// Assembles the full map view for one user: own villages are advanced to
/// `now` first so the stocks on screen are current.
pub async fn map_info(
    ctx: &HandlerContext,
    user_id: &DocId,
    now: DateTime<Utc>,
) -> Result<MapInfo, ApplicationError> {
    ctx.resource_service().advance_all_for_user(user_id, now).await?;

    let (x_min, x_max, y_min, y_max) = world::map_bounds();
    let all_villages = ctx.villages.list_all().await?;

    let mut owners: HashMap<DocId, OwnerInfo> = HashMap::new();
    let mut owned_village_ids: Vec<DocId> = Vec::new();
    let mut villages = Vec::with_capacity(all_villages.len());

    for village in &all_villages {
        let owner = match owners.get(&village.owner_id) {
            Some(owner) => owner.clone(),
            None => match ctx.users.get_by_id(&village.owner_id).await {
                Ok(user) => {
                    let info = OwnerInfo {
                        id: user.id.clone(),
                        family_name: user.family_name,
                        color: user.color,
                    };
                    owners.insert(village.owner_id.clone(), info.clone());
                    info
                }
                Err(error) => {
                    warn!(village_id = %village.id, %error, "Village owner missing, skipping");
                    continue;
                }
            },
        };

        let is_owned = village.owner_id == *user_id;
        if is_owned {
            owned_village_ids.push(village.id.clone());
        }

        villages.push(MapVillage {
            id: village.id.clone(),
            name: village.name.clone(),
            location: village.location,
            owner,
            is_owned,
            resources: is_owned.then(|| detailed_resources(village)),
            resource_fields: is_owned.then(|| village.resource_fields.clone()),
            city: is_owned.then(|| village.city.clone()),
            construction_tasks: is_owned
                .then(|| village.pending_construction_tasks().cloned().collect()),
            troop_training_tasks: is_owned
                .then(|| village.pending_training_tasks().cloned().collect()),
            total_population: is_owned.then(|| village.total_population()),
            working_population: is_owned.then(|| village.working_population()),
        });
    }

    let troops = ctx
        .troops
        .list_all()
        .await?
        .into_iter()
        .map(|troop| {
            let own = owned_village_ids.contains(&troop.home_id);
            MapTroop {
                id: troop.id,
                kind: troop.kind,
                home_id: troop.home_id,
                quantity: troop.quantity,
                location: troop.location,
                mode: own.then_some(troop.mode),
                backpack: own.then_some(troop.backpack),
            }
        })
        .collect();

    let troop_actions = ctx.troop_actions.list_unprocessed().await?;

    Ok(MapInfo {
        map_bounds: MapBounds {
            x_min,
            x_max,
            y_min,
            y_max,
        },
        map_size: world::MAP_SIZE,
        server_time: now,
        villages,
        troops,
        troop_actions,
    })
}
