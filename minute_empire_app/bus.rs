use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use minute_empire_game::models::village::Village;
use minute_empire_types::common::{DocId, User};
use minute_empire_types::errors::{GameError, Result};
use minute_empire_types::tasks::ActionKind;

use crate::command::Command;
use crate::command_handlers::{
    ConstructionCommandHandler, RegisterPlayer, RegisterPlayerCommandHandler,
    TrainTroopsCommandHandler, TroopActionCommandHandler,
};
use crate::context::HandlerContext;
use crate::queries::{self, MapInfo};
use crate::scheduler::{ScheduledTask, TaskExecutor};
use crate::sockets::SocketRegistry;
use crate::task_handlers::{
    ConstructionTaskHandler, NotifyScope, TaskHandler, TrainTroopsTaskHandler,
    TroopActionTaskHandler,
};

/// What a submitted command came to. Validation failures land here as
/// `success: false` with the reason; they never escape as errors.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl CommandOutcome {
    fn rejected(message: String) -> Self {
        Self {
            success: false,
            message,
            data: Value::Null,
        }
    }
}

#[derive(Debug, Default)]
pub struct BootstrapStats {
    pub caught_up: usize,
    pub scheduled: usize,
}

/// Constructed-once hub wiring repositories, scheduler and socket registry
/// together: the single entry point for player commands, the executor behind
/// the scheduler, and the startup recovery driver.
pub struct AppBus {
    ctx: HandlerContext,
    sockets: Arc<SocketRegistry>,
}

impl AppBus {
    pub fn new(ctx: HandlerContext, sockets: Arc<SocketRegistry>) -> Self {
        Self { ctx, sockets }
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }

    pub fn sockets(&self) -> &Arc<SocketRegistry> {
        &self.sockets
    }

    pub async fn register_player(&self, cmd: RegisterPlayer) -> Result<(User, Village)> {
        RegisterPlayerCommandHandler::new()
            .handle(&self.ctx, cmd, Utc::now())
            .await
    }

    /// Parses and executes one player command against one of their villages.
    pub async fn execute_command(
        &self,
        user_id: &DocId,
        village_id: &DocId,
        input: &str,
    ) -> CommandOutcome {
        match self.try_execute(user_id, village_id, input).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if !err.is_rejection() {
                    error!(%err, village_id = %village_id, "Command execution failed");
                }
                CommandOutcome::rejected(err.to_string())
            }
        }
    }

    async fn try_execute(
        &self,
        user_id: &DocId,
        village_id: &DocId,
        input: &str,
    ) -> Result<CommandOutcome> {
        let command = Command::parse(input)?;
        let now = Utc::now();

        let village = self.ctx.villages.get_by_id(village_id).await?;
        if village.owner_id != *user_id {
            return Err(GameError::VillageNotOwned {
                village_id: village_id.clone(),
                user_id: user_id.clone(),
            }
            .into());
        }

        // snapshot the stocks at the submission instant; validators must see
        // current numbers
        let village = self
            .ctx
            .resource_service()
            .advance_village(village_id, now)
            .await?;

        let (message, data) = match &command {
            Command::CreateField { kind, slot } => {
                let data = ConstructionCommandHandler::new()
                    .handle(&self.ctx, village, &command, now)
                    .await?;
                (format!("Started construction of {kind} field in slot {slot}"), data)
            }
            Command::CreateBuilding { kind, slot } => {
                let data = ConstructionCommandHandler::new()
                    .handle(&self.ctx, village, &command, now)
                    .await?;
                (format!("Started construction of {kind} building in slot {slot}"), data)
            }
            Command::UpgradeField { slot } | Command::UpgradeBuilding { slot } => {
                let data = ConstructionCommandHandler::new()
                    .handle(&self.ctx, village, &command, now)
                    .await?;
                (format!("Started upgrade in slot {slot}"), data)
            }
            Command::DestroyField { slot } | Command::DestroyBuilding { slot } => {
                let data = ConstructionCommandHandler::new()
                    .handle(&self.ctx, village, &command, now)
                    .await?;
                (format!("Started destruction in slot {slot}"), data)
            }
            Command::Train { kind, quantity } => {
                let data = TrainTroopsCommandHandler::new()
                    .handle(&self.ctx, village, *kind, *quantity, now)
                    .await?;
                (format!("Started training {quantity} {kind}"), data)
            }
            Command::Move { troop_id, target } => {
                let data = TroopActionCommandHandler::new()
                    .handle(&self.ctx, &village, ActionKind::Move, troop_id, *target, now)
                    .await?;
                self.notify_all().await;
                (format!("Troop {troop_id} is moving to {target}"), data)
            }
            Command::Attack { troop_id, target } => {
                let data = TroopActionCommandHandler::new()
                    .handle(&self.ctx, &village, ActionKind::Attack, troop_id, *target, now)
                    .await?;
                self.notify_all().await;
                (format!("Troop {troop_id} is attacking {target}"), data)
            }
        };

        Ok(CommandOutcome {
            success: true,
            message,
            data,
        })
    }

    pub async fn map_info(&self, user_id: &DocId) -> Result<MapInfo> {
        queries::map_info(&self.ctx, user_id, Utc::now()).await
    }

    fn handler_for(task: &ScheduledTask) -> Box<dyn TaskHandler> {
        match task {
            ScheduledTask::Construction {
                village_id,
                task_id,
            } => Box::new(ConstructionTaskHandler::new(
                village_id.clone(),
                task_id.clone(),
            )),
            ScheduledTask::TroopTraining {
                village_id,
                task_id,
            } => Box::new(TrainTroopsTaskHandler::new(
                village_id.clone(),
                task_id.clone(),
            )),
            ScheduledTask::TroopAction { action_id } => {
                Box::new(TroopActionTaskHandler::new(action_id.clone()))
            }
        }
    }

    /// Runs one due task and pushes the resulting map updates. Errors are
    /// logged, not propagated: the task document stays unprocessed and is
    /// retried by the next startup catch-up.
    pub async fn run_task(&self, task: ScheduledTask, completion_time: DateTime<Utc>) {
        let handler = Self::handler_for(&task);
        match handler.handle(&self.ctx, completion_time).await {
            Ok(scope) => self.dispatch_notification(scope).await,
            Err(err) => {
                error!(task_id = %task.id(), %err, "Task execution failed; left unprocessed for retry");
            }
        }
    }

    async fn dispatch_notification(&self, scope: NotifyScope) {
        match scope {
            NotifyScope::None => {}
            NotifyScope::User(user_id) => self.notify_user(&user_id).await,
            NotifyScope::All => self.notify_all().await,
        }
    }

    async fn notify_user(&self, user_id: &DocId) {
        if !self.sockets.is_connected(user_id) {
            return;
        }
        match self.map_info(user_id).await {
            Ok(info) => {
                let frame = json!({ "type": "map_update", "data": info }).to_string();
                self.sockets.send_to_user(user_id, frame);
            }
            Err(err) => warn!(user_id = %user_id, %err, "Failed to build map update"),
        }
    }

    pub async fn notify_all(&self) {
        for user_id in self.sockets.connected_users() {
            self.notify_user(&user_id).await;
        }
    }

    /// Startup recovery. First replays every task already due, synchronously
    /// and in chronological order, feeding each its original completion time
    /// so the world ends up exactly where it would have been. Then enqueues
    /// all future tasks into the heap.
    pub async fn bootstrap(&self, now: DateTime<Utc>) -> Result<BootstrapStats> {
        // category sequences village-owned work before troop actions when
        // completion instants collide
        const CONSTRUCTION: u8 = 0;
        const TRAINING: u8 = 1;
        const TROOP_ACTION: u8 = 2;

        let mut due: Vec<(DateTime<Utc>, u8, DocId, ScheduledTask)> = Vec::new();
        let mut future: Vec<(DateTime<Utc>, ScheduledTask)> = Vec::new();

        for village in self.ctx.villages.list_all().await? {
            for task in village.pending_construction_tasks() {
                let scheduled = ScheduledTask::Construction {
                    village_id: village.id.clone(),
                    task_id: task.id.clone(),
                };
                if task.completion_time <= now {
                    due.push((task.completion_time, CONSTRUCTION, task.id.clone(), scheduled));
                } else {
                    future.push((task.completion_time, scheduled));
                }
            }
            for task in village.pending_training_tasks() {
                let scheduled = ScheduledTask::TroopTraining {
                    village_id: village.id.clone(),
                    task_id: task.id.clone(),
                };
                if task.completion_time <= now {
                    due.push((task.completion_time, TRAINING, task.id.clone(), scheduled));
                } else {
                    future.push((task.completion_time, scheduled));
                }
            }
        }

        for action in self.ctx.troop_actions.list_unprocessed().await? {
            let scheduled = ScheduledTask::TroopAction {
                action_id: action.id.clone(),
            };
            if action.completion_time <= now {
                due.push((action.completion_time, TROOP_ACTION, action.id.clone(), scheduled));
            } else {
                future.push((action.completion_time, scheduled));
            }
        }

        due.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));

        let mut stats = BootstrapStats::default();
        for (completion_time, _, _, task) in due {
            self.run_task(task, completion_time).await;
            stats.caught_up += 1;
        }

        for (completion_time, task) in future {
            self.ctx.scheduler.schedule(task, completion_time);
            stats.scheduled += 1;
        }

        info!(
            caught_up = stats.caught_up,
            scheduled = stats.scheduled,
            "Startup recovery finished"
        );
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl TaskExecutor for AppBus {
    async fn execute(&self, task: ScheduledTask, completion_time: DateTime<Utc>) {
        self.run_task(task, completion_time).await;
    }
}
