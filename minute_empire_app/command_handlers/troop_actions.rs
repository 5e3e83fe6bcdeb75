use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::info;

use minute_empire_game::models::troops::{can_attack, can_move_to, travel_minutes};
use minute_empire_game::models::village::Village;
use minute_empire_game::world;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::{ApplicationError, GameError};
use minute_empire_types::map::Location;
use minute_empire_types::tasks::{ActionKind, TroopAction};
use minute_empire_types::troops::TroopMode;

use crate::context::HandlerContext;
use crate::scheduler::ScheduledTask;

/// Submission side of `move`/`attack`: validates ownership, availability and
/// reachability, persists the action document and flips the troop mode.
pub struct TroopActionCommandHandler {}

impl TroopActionCommandHandler {
    pub fn new() -> Self {
        Self {}
    }

    pub async fn handle(
        &self,
        ctx: &HandlerContext,
        village: &Village,
        action_type: ActionKind,
        troop_id: &DocId,
        target: Location,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, ApplicationError> {
        let mut troop = ctx.troops.get_by_id(troop_id).await?;

        if troop.home_id != village.id {
            return Err(GameError::TroopNotOwned {
                troop_id: troop_id.clone(),
                village_id: village.id.clone(),
            }
            .into());
        }
        if troop.mode != TroopMode::Idle {
            return Err(GameError::TroopBusy(troop_id.clone()).into());
        }
        let active = ctx.troop_actions.list_unprocessed_for_troop(troop_id).await?;
        if !active.is_empty() {
            return Err(GameError::TroopBusy(troop_id.clone()).into());
        }

        if !world::in_bounds(&target) {
            return Err(GameError::OutOfBounds(target).into());
        }
        let reachable = match action_type {
            ActionKind::Move => can_move_to(troop.kind, troop.location, target),
            ActionKind::Attack => can_attack(troop.kind, troop.location, target),
        };
        if !reachable {
            return Err(GameError::UnreachableTarget {
                kind: troop.kind,
                location: target,
            }
            .into());
        }

        let minutes = travel_minutes(action_type, troop.location, target);
        let action = TroopAction {
            id: DocId::new(),
            troop_id: troop_id.clone(),
            action_type,
            start_location: troop.location,
            target_location: target,
            started_at: now,
            completion_time: now + Duration::minutes(minutes as i64),
            processed: false,
        };

        ctx.troop_actions.insert(&action).await?;

        troop.mode = match action_type {
            ActionKind::Move => TroopMode::Move,
            ActionKind::Attack => TroopMode::Attack,
        };
        troop.updated_at = now;
        ctx.troops.save(&troop).await?;

        ctx.scheduler.schedule(
            ScheduledTask::TroopAction {
                action_id: action.id.clone(),
            },
            action.completion_time,
        );

        info!(
            action_id = %action.id,
            troop_id = %troop_id,
            action_type = ?action_type,
            target = %target,
            completion_time = %action.completion_time,
            "Troop action queued"
        );

        Ok(json!({
            "action_id": action.id,
            "troop_id": troop_id,
            "action_type": action.action_type,
            "target_location": action.target_location,
            "estimated_completion": action.completion_time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::mock_context;
    use minute_empire_game::test_utils::{
        TroopFactoryOptions, VillageFactoryOptions, troop_factory, village_factory,
    };
    use minute_empire_types::troops::TroopKind;

    async fn setup(
        ctx: &HandlerContext,
        kind: TroopKind,
        location: Location,
    ) -> (Village, minute_empire_types::troops::Troop) {
        let village = village_factory(VillageFactoryOptions {
            location: Some(location),
            ..Default::default()
        });
        ctx.villages.insert(&village).await.unwrap();
        let troop = troop_factory(TroopFactoryOptions {
            kind,
            home_id: Some(village.id.clone()),
            location,
            ..Default::default()
        });
        ctx.troops.insert(&troop).await.unwrap();
        (village, troop)
    }

    #[tokio::test]
    async fn test_move_submission_creates_action_and_flips_mode() {
        let ctx = mock_context();
        let (village, troop) = setup(&ctx, TroopKind::Militia, Location::new(0, 0)).await;

        let handler = TroopActionCommandHandler::new();
        let now = Utc::now();
        handler
            .handle(
                &ctx,
                &village,
                ActionKind::Move,
                &troop.id,
                Location::new(1, 1),
                now,
            )
            .await
            .unwrap();

        let saved = ctx.troops.get_by_id(&troop.id).await.unwrap();
        assert_eq!(saved.mode, TroopMode::Move);
        let actions = ctx
            .troop_actions
            .list_unprocessed_for_troop(&troop.id)
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        // diagonal step: Manhattan distance 2, one minute per tile
        assert_eq!(
            actions[0].completion_time.timestamp(),
            (now + Duration::minutes(2)).timestamp()
        );
        assert_eq!(ctx.scheduler.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_target_is_rejected() {
        let ctx = mock_context();
        let (village, troop) = setup(&ctx, TroopKind::Archer, Location::new(0, 0)).await;

        let handler = TroopActionCommandHandler::new();
        // archers cannot move diagonally
        let result = handler
            .handle(
                &ctx,
                &village,
                ActionKind::Move,
                &troop.id,
                Location::new(1, 1),
                Utc::now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::UnreachableTarget { .. }))
        ));

        let saved = ctx.troops.get_by_id(&troop.id).await.unwrap();
        assert_eq!(saved.mode, TroopMode::Idle);
    }

    #[tokio::test]
    async fn test_out_of_bounds_target_is_rejected() {
        let ctx = mock_context();
        let (village, troop) = setup(&ctx, TroopKind::Militia, Location::new(15, 15)).await;

        let handler = TroopActionCommandHandler::new();
        let result = handler
            .handle(
                &ctx,
                &village,
                ActionKind::Move,
                &troop.id,
                Location::new(16, 15),
                Utc::now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::OutOfBounds(_)))
        ));
    }

    #[tokio::test]
    async fn test_busy_troop_is_rejected() {
        let ctx = mock_context();
        let (village, troop) = setup(&ctx, TroopKind::Militia, Location::new(0, 0)).await;

        let handler = TroopActionCommandHandler::new();
        handler
            .handle(
                &ctx,
                &village,
                ActionKind::Move,
                &troop.id,
                Location::new(0, 1),
                Utc::now(),
            )
            .await
            .unwrap();

        let result = handler
            .handle(
                &ctx,
                &village,
                ActionKind::Move,
                &troop.id,
                Location::new(1, 0),
                Utc::now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::TroopBusy(_)))
        ));
    }

    #[tokio::test]
    async fn test_foreign_troop_is_rejected() {
        let ctx = mock_context();
        let (village, _) = setup(&ctx, TroopKind::Militia, Location::new(0, 0)).await;
        let stranger = troop_factory(TroopFactoryOptions {
            location: Location::new(0, 0),
            ..Default::default()
        });
        ctx.troops.insert(&stranger).await.unwrap();

        let handler = TroopActionCommandHandler::new();
        let result = handler
            .handle(
                &ctx,
                &village,
                ActionKind::Attack,
                &stranger.id,
                Location::new(0, 0),
                Utc::now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::Game(GameError::TroopNotOwned { .. }))
        ));
    }
}
