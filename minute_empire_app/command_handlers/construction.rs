use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use minute_empire_game::models::village::Village;
use minute_empire_types::errors::{AppError, ApplicationError};

use crate::command::Command;
use crate::context::HandlerContext;
use crate::scheduler::ScheduledTask;

/// Submission side of every construction-queue command: create, upgrade and
/// destroy for both fields and city buildings. The village has already been
/// ownership-checked and advanced to `now` by the bus.
pub struct ConstructionCommandHandler {}

impl ConstructionCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn handle(
        &self,
        ctx: &HandlerContext,
        mut village: Village,
        command: &Command,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, ApplicationError> {
        let task = match command {
            Command::CreateField { kind, slot } => {
                village.init_field_construction(*kind, *slot, now)?
            }
            Command::CreateBuilding { kind, slot } => {
                village.init_building_construction(*kind, *slot, now)?
            }
            Command::UpgradeField { slot } => village.init_field_upgrade(*slot, now)?,
            Command::UpgradeBuilding { slot } => village.init_building_upgrade(*slot, now)?,
            Command::DestroyField { slot } => village.init_field_destruction(*slot, now)?,
            Command::DestroyBuilding { slot } => village.init_building_destruction(*slot, now)?,
            other => {
                return Err(
                    AppError::InvalidCommand(format!("Not a construction command: {other:?}"))
                        .into(),
                );
            }
        };

        ctx.villages.save(&village).await?;
        ctx.scheduler.schedule(
            ScheduledTask::Construction {
                village_id: village.id.clone(),
                task_id: task.id.clone(),
            },
            task.completion_time,
        );

        info!(
            village_id = %village.id,
            task_id = %task.id,
            task_type = ?task.task_type,
            slot = task.slot,
            completion_time = %task.completion_time,
            "Construction task queued"
        );

        Ok(json!({
            "task_id": task.id,
            "task_type": task.task_type,
            "target_type": task.target_type,
            "slot": task.slot,
            "level": task.level,
            "estimated_completion": task.completion_time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::mock_context;
    use minute_empire_game::test_utils::{VillageFactoryOptions, village_factory};
    use minute_empire_types::buildings::{BuildingKind, FieldKind};
    use minute_empire_types::common::Resources;
    use minute_empire_types::errors::GameError;
    use minute_empire_types::tasks::TaskKind;

    #[tokio::test]
    async fn test_create_building_queues_task_and_deducts() {
        let ctx = mock_context();
        let village = village_factory(VillageFactoryOptions {
            resources: Some(Resources::new(500.0, 500.0, 500.0, 500.0)),
            ..Default::default()
        });
        let village_id = village.id.clone();
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionCommandHandler::new();
        let command = Command::CreateBuilding {
            kind: BuildingKind::Warehouse,
            slot: 5,
        };
        let data = handler
            .handle(&ctx, village, &command, Utc::now())
            .await
            .unwrap();

        let saved = ctx.villages.get_by_id(&village_id).await.unwrap();
        assert_eq!(saved.resources.wood, 430.0, "creation cost deducted");
        assert_eq!(saved.construction_tasks.len(), 1);
        let task = &saved.construction_tasks[0];
        assert_eq!(task.task_type, TaskKind::CreateBuilding);
        assert!(!task.processed);
        assert!(
            saved.get_building(5).is_none(),
            "building must not exist before completion"
        );
        assert_eq!(ctx.scheduler.pending_count(), 1);
        assert_eq!(data["slot"], 5);
    }

    #[tokio::test]
    async fn test_rejection_makes_zero_mutations() {
        let ctx = mock_context();
        let village = village_factory(VillageFactoryOptions {
            resources: Some(Resources::new(10.0, 10.0, 10.0, 10.0)),
            ..Default::default()
        });
        let village_id = village.id.clone();
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionCommandHandler::new();
        let command = Command::CreateField {
            kind: FieldKind::Wood,
            slot: 2,
        };
        let result = handler.handle(&ctx, village, &command, Utc::now()).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::NotEnoughResources))
        ));

        let saved = ctx.villages.get_by_id(&village_id).await.unwrap();
        assert_eq!(saved.resources.wood, 10.0);
        assert!(saved.construction_tasks.is_empty());
        assert_eq!(ctx.scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_slot_is_rejected() {
        let ctx = mock_context();
        let mut village = village_factory(VillageFactoryOptions {
            fields: vec![(FieldKind::Wood, 2, 0)],
            constructions: vec![(BuildingKind::CityCenter, 8, 1)],
            resources: Some(Resources::new(5000.0, 5000.0, 5000.0, 5000.0)),
            ..Default::default()
        });
        village.init_field_upgrade(0, Utc::now()).unwrap();
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionCommandHandler::new();
        let result = handler
            .handle(&ctx, village, &Command::UpgradeField { slot: 0 }, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::SlotHasPendingTask { slot: 0 }))
        ));
    }
}
