use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use minute_empire_types::common::{DocId, Resources};
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::troops::{Troop, TroopKind, TroopMode};

use super::{NotifyScope, TaskHandler};
use crate::context::HandlerContext;

/// Completes a troop training task: spawns a fresh idle troop stack at the
/// village tile. Stacks are never merged with existing ones.
pub struct TrainTroopsTaskHandler {
    village_id: DocId,
    task_id: DocId,
}

impl TrainTroopsTaskHandler {
    pub fn new(village_id: DocId, task_id: DocId) -> Self {
        Self {
            village_id,
            task_id,
        }
    }
}

#[async_trait::async_trait]
impl TaskHandler for TrainTroopsTaskHandler {
    #[instrument(skip_all, fields(
        task_type = "TrainTroops",
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
            .troop_training_tasks
            .iter()
            .find(|t| t.id == self.task_id)
        else {
            warn!("Training task not found on village");
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

        let Some(task) = village.take_training_task(&self.task_id) else {
            return Ok(NotifyScope::None);
        };

        let Ok(kind) = task.troop_type.parse::<TroopKind>() else {
            warn!(troop_type = %task.troop_type, "Unknown troop type on task, marked processed");
            ctx.villages.save(&village).await?;
            return Ok(NotifyScope::None);
        };

        // The processed flag must hit the store before the troop exists: a
        // crash in between loses the stack, it never duplicates it.
        ctx.villages.save(&village).await?;

        let troop = Troop {
            id: DocId::new(),
            kind,
            home_id: village.id.clone(),
            quantity: task.quantity,
            location: village.location,
            mode: TroopMode::Idle,
            backpack: Resources::ZERO,
            created_at: completion_time,
            updated_at: completion_time,
        };
        ctx.troops.insert(&troop).await?;

        info!(troop_id = %troop.id, quantity = troop.quantity, "Troop training completed");
        Ok(NotifyScope::All)
    }
}
