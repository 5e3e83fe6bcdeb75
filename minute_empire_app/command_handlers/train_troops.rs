use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use minute_empire_game::models::village::Village;
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::troops::TroopKind;

use crate::context::HandlerContext;
use crate::scheduler::ScheduledTask;

/// Submission side of `train <qty> <troop_type>`.
pub struct TrainTroopsCommandHandler {}

impl TrainTroopsCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn handle(
        &self,
        ctx: &HandlerContext,
        mut village: Village,
        kind: TroopKind,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, ApplicationError> {
        let task = village.init_troop_training(kind, quantity, now)?;

        ctx.villages.save(&village).await?;
        ctx.scheduler.schedule(
            ScheduledTask::TroopTraining {
                village_id: village.id.clone(),
                task_id: task.id.clone(),
            },
            task.completion_time,
        );

        info!(
            village_id = %village.id,
            task_id = %task.id,
            troop_type = %kind,
            quantity,
            completion_time = %task.completion_time,
            "Troop training queued"
        );

        Ok(json!({
            "task_id": task.id,
            "troop_type": task.troop_type,
            "quantity": task.quantity,
            "estimated_completion": task.completion_time,
        }))
    }
}
