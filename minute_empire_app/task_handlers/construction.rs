use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;

use super::{NotifyScope, TaskHandler};
use crate::context::HandlerContext;

/// Completes a construction/destruction work item: brings the village's
/// resources up to the completion instant (which applies rate-affecting
/// tasks on the way) and applies the mutation if the accrual pass did not.
pub struct ConstructionTaskHandler {
    village_id: DocId,
    task_id: DocId,
}

impl ConstructionTaskHandler {
    pub fn new(village_id: DocId, task_id: DocId) -> Self {
        Self {
            village_id,
            task_id,
        }
    }
}

#[async_trait::async_trait]
impl TaskHandler for ConstructionTaskHandler {
    #[instrument(skip_all, fields(
        task_type = "Construction",
        village_id = %self.village_id,
        task_id = %self.task_id,
    ))]
    async fn handle(
        &self,
        ctx: &HandlerContext,
        completion_time: DateTime<Utc>,
    ) -> Result<NotifyScope, ApplicationError> {
        let mut village = ctx.villages.get_by_id(&self.village_id).await?;

        let Some(task) = village
            .construction_tasks
            .iter()
            .find(|t| t.id == self.task_id)
        else {
            warn!("Construction task not found on village");
            return Ok(NotifyScope::None);
        };
        if task.processed {
            return Ok(NotifyScope::None);
        }

        let effective = completion_time.max(village.res_update_at);
        let outcome = village.advance_to(effective)?;
        for task_id in &outcome.skipped {
            warn!(skipped_task_id = %task_id, "Corrupt task skipped during accrual");
        }

        // rate-neutral tasks were not applied by the accrual pass
        if let Err(error) = village.apply_construction_task(&self.task_id) {
            warn!(%error, "Task contradicts village state, marked processed anyway");
        }

        ctx.villages.save(&village).await?;
        info!(completion_time = %completion_time, "Construction task completed");
        Ok(NotifyScope::User(village.owner_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::mock_context;
    use minute_empire_game::test_utils::{VillageFactoryOptions, village_factory};
    use minute_empire_types::buildings::FieldKind;
    use minute_empire_types::common::Resources;
    use minute_empire_types::tasks::{ConstructionTask, TaskKind};
    use chrono::{Duration, TimeZone};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn test_completion_applies_at_scheduled_instant() {
        let ctx = mock_context();
        let mut village = village_factory(VillageFactoryOptions {
            fields: vec![(FieldKind::Wood, 1, 0)],
            resources: Some(Resources::ZERO),
            res_update_at: Some(ts(12, 0)),
            ..Default::default()
        });
        let task = ConstructionTask {
            id: DocId::new(),
            task_type: TaskKind::UpgradeField,
            target_type: "wood".to_string(),
            slot: 0,
            level: 2,
            started_at: ts(11, 50),
            completion_time: ts(12, 30),
            processed: false,
        };
        village.construction_tasks.push(task.clone());
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionTaskHandler::new(village.id.clone(), task.id.clone());
        let scope = handler.handle(&ctx, ts(12, 30)).await.unwrap();
        assert_eq!(scope, NotifyScope::User(village.owner_id.clone()));

        let saved = ctx.villages.get_by_id(&village.id).await.unwrap();
        assert_eq!(saved.get_field(0).unwrap().level, 2);
        // resources accrued exactly to the completion instant at the old rate
        assert!((saved.resources.wood - 18.0).abs() < 1e-9);
        assert_eq!(saved.res_update_at, ts(12, 30));
        assert!(saved.construction_tasks[0].processed);
    }

    #[tokio::test]
    async fn test_double_fire_is_a_noop() {
        let ctx = mock_context();
        let mut village = village_factory(VillageFactoryOptions {
            fields: vec![(FieldKind::Wood, 1, 0)],
            resources: Some(Resources::ZERO),
            res_update_at: Some(ts(12, 0)),
            ..Default::default()
        });
        let task = ConstructionTask {
            id: DocId::new(),
            task_type: TaskKind::UpgradeField,
            target_type: "wood".to_string(),
            slot: 0,
            level: 2,
            started_at: ts(11, 50),
            completion_time: ts(12, 30),
            processed: false,
        };
        village.construction_tasks.push(task.clone());
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionTaskHandler::new(village.id.clone(), task.id.clone());
        handler.handle(&ctx, ts(12, 30)).await.unwrap();
        let scope = handler.handle(&ctx, ts(12, 30)).await.unwrap();
        assert_eq!(scope, NotifyScope::None);

        let saved = ctx.villages.get_by_id(&village.id).await.unwrap();
        assert_eq!(saved.get_field(0).unwrap().level, 2);
    }

    #[tokio::test]
    async fn test_village_already_ahead_of_completion_time() {
        // A map query advanced the village past the task's instant; the
        // mutation still applies, without rewinding the resource clock.
        let ctx = mock_context();
        let mut village = village_factory(VillageFactoryOptions {
            fields: vec![(FieldKind::Wood, 1, 0)],
            resources: Some(Resources::ZERO),
            res_update_at: Some(ts(13, 0)),
            ..Default::default()
        });
        let task = ConstructionTask {
            id: DocId::new(),
            task_type: TaskKind::CreateBuilding,
            target_type: "barracks".to_string(),
            slot: 7,
            level: 1,
            started_at: ts(12, 0),
            completion_time: ts(12, 30),
            processed: false,
        };
        village.construction_tasks.push(task.clone());
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionTaskHandler::new(village.id.clone(), task.id.clone());
        handler.handle(&ctx, ts(12, 30)).await.unwrap();

        let saved = ctx.villages.get_by_id(&village.id).await.unwrap();
        assert!(saved.get_building(7).is_some());
        assert_eq!(saved.res_update_at, ts(13, 0));
    }

    #[tokio::test]
    async fn test_corrupt_task_marked_processed_without_mutation() {
        let ctx = mock_context();
        let mut village = village_factory(VillageFactoryOptions {
            constructions: vec![(minute_empire_types::buildings::BuildingKind::Barracks, 1, 7)],
            res_update_at: Some(ts(12, 0)),
            ..Default::default()
        });
        // creation task colliding with an existing building
        let task = ConstructionTask {
            id: DocId::new(),
            task_type: TaskKind::CreateBuilding,
            target_type: "stable".to_string(),
            slot: 7,
            level: 1,
            started_at: ts(12, 0),
            completion_time: ts(12, 0) + Duration::minutes(30),
            processed: false,
        };
        village.construction_tasks.push(task.clone());
        ctx.villages.insert(&village).await.unwrap();

        let handler = ConstructionTaskHandler::new(village.id.clone(), task.id.clone());
        handler
            .handle(&ctx, task.completion_time)
            .await
            .unwrap();

        let saved = ctx.villages.get_by_id(&village.id).await.unwrap();
        assert!(saved.construction_tasks[0].processed);
        assert_eq!(saved.get_building(7).unwrap().kind, minute_empire_types::buildings::BuildingKind::Barracks);
    }
}
