use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use minute_empire_game::combat::{plan_steal, resolve_combat};
use minute_empire_types::common::{DocId, ResourceKind, Resources};
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::tasks::ActionKind;
use minute_empire_types::troops::{Troop, TroopMode};

use super::{NotifyScope, TaskHandler};
use crate::context::HandlerContext;

/// Completes a troop movement or attack: advances every involved village to
/// the action's instant, resolves combat if the target tile is held, then
/// moves/steals/deposits according to the outcome.
pub struct TroopActionTaskHandler {
    action_id: DocId,
}

impl TroopActionTaskHandler {
    pub fn new(action_id: DocId) -> Self {
        Self { action_id }
    }

    /// Transfers loot from an undefended enemy village into the troop's
    /// backpack. The village is debited first so a crash in between can only
    /// destroy resources, never duplicate them.
    async fn steal_from_village(
        &self,
        ctx: &HandlerContext,
        troop: &mut Troop,
        village_id: &DocId,
        completion_time: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        let mut village = ctx.villages.get_by_id(village_id).await?;
        let plan = plan_steal(troop, &village.resources);
        if plan.is_empty() {
            return Ok(());
        }

        for kind in ResourceKind::ALL {
            village.resources.add(kind, -plan.get(kind));
        }
        village.updated_at = completion_time;
        ctx.villages.save(&village).await?;

        for kind in ResourceKind::ALL {
            troop.backpack.add(kind, plan.get(kind));
        }
        troop.updated_at = completion_time;
        ctx.troops.save(troop).await?;

        info!(
            troop_id = %troop.id,
            village_id = %village_id,
            wood = plan.wood, stone = plan.stone, iron = plan.iron, food = plan.food,
            "Resources stolen from undefended village"
        );
        Ok(())
    }

    /// Empties the troop's backpack into a friendly village, clamped at
    /// storage capacity. Whatever does not fit is lost.
    async fn deposit_into_village(
        &self,
        ctx: &HandlerContext,
        troop: &mut Troop,
        village_id: &DocId,
        completion_time: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        let carried = troop.backpack;
        if carried.is_empty() {
            return Ok(());
        }

        troop.backpack = Resources::ZERO;
        troop.updated_at = completion_time;
        ctx.troops.save(troop).await?;

        let mut village = ctx.villages.get_by_id(village_id).await?;
        let deposited = village.store_resources(&carried);
        village.updated_at = completion_time;
        ctx.villages.save(&village).await?;

        info!(
            troop_id = %troop.id,
            village_id = %village_id,
            deposited = deposited.total(),
            lost = carried.total() - deposited.total(),
            "Backpack deposited into friendly village"
        );
        Ok(())
    }

    async fn defender_home_bonus(
        &self,
        ctx: &HandlerContext,
        enemies: &[Troop],
        target_village_owner: Option<&DocId>,
    ) -> bool {
        let Some(owner_id) = target_village_owner else {
            return false;
        };
        for enemy in enemies {
            if let Ok(home) = ctx.villages.get_by_id(&enemy.home_id).await
                && home.owner_id == *owner_id
            {
                return true;
            }
        }
        false
    }
}

#[async_trait::async_trait]
impl TaskHandler for TroopActionTaskHandler {
    #[instrument(skip_all, fields(
        task_type = "TroopAction",
        action_id = %self.action_id,
    ))]
    async fn handle(
        &self,
        ctx: &HandlerContext,
        completion_time: DateTime<Utc>,
    ) -> Result<NotifyScope, ApplicationError> {
        let action = ctx.troop_actions.get_by_id(&self.action_id).await?;
        if action.processed {
            return Ok(NotifyScope::None);
        }

        let troop = match ctx.troops.get_by_id(&action.troop_id).await {
            Ok(troop) => troop,
            Err(_) => {
                warn!(troop_id = %action.troop_id, "Troop gone, retiring its action");
                ctx.troop_actions.mark_processed(&self.action_id).await?;
                return Ok(NotifyScope::None);
            }
        };

        let target = action.target_location;
        let enemies: Vec<Troop> = ctx
            .troops
            .list_at_location(target)
            .await?
            .into_iter()
            .filter(|t| t.home_id != troop.home_id)
            .collect();
        let target_village = ctx.villages.find_by_location(target).await?;

        // Bring every touched village up to the action's instant before any
        // state changes hands.
        let mut involved: HashSet<DocId> = HashSet::new();
        involved.insert(troop.home_id.clone());
        for enemy in &enemies {
            involved.insert(enemy.home_id.clone());
        }
        if let Some(village) = &target_village {
            involved.insert(village.id.clone());
        }
        ctx.resource_service()
            .advance_villages(&involved, completion_time)
            .await;

        let home_owner = ctx
            .villages
            .get_by_id(&troop.home_id)
            .await
            .map(|v| v.owner_id)
            .ok();

        if enemies.is_empty() {
            let mut troop = troop;
            if action.action_type == ActionKind::Move {
                troop.location = target;
            }
            troop.mode = TroopMode::Idle;
            troop.updated_at = completion_time;
            ctx.troops.save(&troop).await?;

            if let (Some(village), Some(owner_id)) = (&target_village, &home_owner) {
                if village.owner_id != *owner_id {
                    self.steal_from_village(ctx, &mut troop, &village.id, completion_time)
                        .await?;
                } else if action.action_type == ActionKind::Move {
                    self.deposit_into_village(ctx, &mut troop, &village.id, completion_time)
                        .await?;
                }
            }
        } else {
            let home_bonus = self
                .defender_home_bonus(
                    ctx,
                    &enemies,
                    target_village.as_ref().map(|v| &v.owner_id),
                )
                .await;

            let report = resolve_combat(
                &troop,
                &enemies,
                action.action_type,
                action.start_location,
                target,
                home_bonus,
            );
            info!(
                attacker_loss = report.attacker_loss,
                defender_loss = report.defender_loss,
                attacker_all_dead = report.attacker_all_dead,
                all_defenders_defeated = report.all_defenders_defeated,
                "Combat resolved"
            );

            for fallen_id in &report.fallen_defender_ids {
                ctx.troops.delete(fallen_id).await?;
            }
            for survivor in &report.defenders_after {
                let mut survivor = survivor.clone();
                survivor.updated_at = completion_time;
                ctx.troops.save(&survivor).await?;
            }

            if report.attacker_all_dead {
                ctx.troops.delete(&troop.id).await?;
            } else if let Some(mut survivor) = report.attacker_after.clone() {
                let victorious_move = action.action_type == ActionKind::Move
                    && report.all_defenders_defeated;
                if victorious_move {
                    survivor.location = target;
                }
                survivor.mode = TroopMode::Idle;
                survivor.updated_at = completion_time;
                ctx.troops.save(&survivor).await?;

                if victorious_move
                    && let (Some(village), Some(owner_id)) = (&target_village, &home_owner)
                    && village.owner_id != *owner_id
                {
                    self.steal_from_village(ctx, &mut survivor, &village.id, completion_time)
                        .await?;
                }
            }
        }

        ctx.troop_actions.mark_processed(&self.action_id).await?;
        Ok(NotifyScope::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_handlers::TroopActionCommandHandler;
    use crate::test_utils::tests::mock_context;
    use minute_empire_game::test_utils::{
        TroopFactoryOptions, VillageFactoryOptions, troop_factory, village_factory,
    };
    use minute_empire_types::map::Location;
    use minute_empire_types::troops::TroopKind;

    async fn submit(
        ctx: &HandlerContext,
        village: &minute_empire_game::models::village::Village,
        action_type: ActionKind,
        troop_id: &DocId,
        target: Location,
    ) -> DocId {
        let data = TroopActionCommandHandler::new()
            .handle(ctx, village, action_type, troop_id, target, Utc::now())
            .await
            .unwrap();
        data["action_id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_plain_move_relocates_troop() {
        let ctx = mock_context();
        let village = village_factory(VillageFactoryOptions {
            location: Some(Location::new(0, 0)),
            ..Default::default()
        });
        ctx.villages.insert(&village).await.unwrap();
        let troop = troop_factory(TroopFactoryOptions {
            home_id: Some(village.id.clone()),
            location: Location::new(0, 0),
            ..Default::default()
        });
        ctx.troops.insert(&troop).await.unwrap();

        let action_id = submit(&ctx, &village, ActionKind::Move, &troop.id, Location::new(1, 0)).await;

        let handler = TroopActionTaskHandler::new(action_id.clone());
        let scope = handler.handle(&ctx, Utc::now()).await.unwrap();
        assert_eq!(scope, NotifyScope::All);

        let moved = ctx.troops.get_by_id(&troop.id).await.unwrap();
        assert_eq!(moved.location, Location::new(1, 0));
        assert_eq!(moved.mode, TroopMode::Idle);
        let action = ctx.troop_actions.get_by_id(&action_id).await.unwrap();
        assert!(action.processed);
    }

    #[tokio::test]
    async fn test_move_into_undefended_enemy_village_steals() {
        let ctx = mock_context();
        let home = village_factory(VillageFactoryOptions {
            location: Some(Location::new(0, 0)),
            ..Default::default()
        });
        let enemy_village = village_factory(VillageFactoryOptions {
            location: Some(Location::new(1, 1)),
            resources: Some(Resources::new(500.0, 200.0, 0.0, 800.0)),
            ..Default::default()
        });
        ctx.villages.insert(&home).await.unwrap();
        ctx.villages.insert(&enemy_village).await.unwrap();

        let troop = troop_factory(TroopFactoryOptions {
            kind: TroopKind::Militia,
            quantity: 10,
            home_id: Some(home.id.clone()),
            location: Location::new(0, 0),
            ..Default::default()
        });
        ctx.troops.insert(&troop).await.unwrap();

        let action_id = submit(&ctx, &home, ActionKind::Move, &troop.id, Location::new(1, 1)).await;
        TroopActionTaskHandler::new(action_id)
            .handle(&ctx, Utc::now())
            .await
            .unwrap();

        let raider = ctx.troops.get_by_id(&troop.id).await.unwrap();
        assert_eq!(raider.location, Location::new(1, 1));
        // backpack filled to its total capacity of 1000
        assert!(raider.backpack.total() > 995.0);
        assert!(raider.backpack.total() <= 1000.0);
        assert_eq!(raider.backpack.iron, 0.0);

        let looted = ctx.villages.get_by_id(&enemy_village.id).await.unwrap();
        let remaining = looted.resources.total();
        assert!(remaining < 1500.0 - 995.0 + 1.0);
        assert!(looted.resources.wood >= 0.0);
    }

    #[tokio::test]
    async fn test_move_into_own_village_deposits() {
        let ctx = mock_context();
        let owner = DocId::new();
        let home = village_factory(VillageFactoryOptions {
            owner_id: Some(owner.clone()),
            location: Some(Location::new(0, 0)),
            ..Default::default()
        });
        let storehouse = village_factory(VillageFactoryOptions {
            owner_id: Some(owner.clone()),
            location: Some(Location::new(0, 1)),
            resources: Some(Resources::new(900.0, 0.0, 0.0, 0.0)),
            ..Default::default()
        });
        ctx.villages.insert(&home).await.unwrap();
        ctx.villages.insert(&storehouse).await.unwrap();

        let troop = troop_factory(TroopFactoryOptions {
            kind: TroopKind::LightCavalry,
            quantity: 10,
            home_id: Some(home.id.clone()),
            location: Location::new(2, 0),
            backpack: Resources::new(300.0, 100.0, 0.0, 50.0),
            ..Default::default()
        });
        ctx.troops.insert(&troop).await.unwrap();

        let action_id = submit(&ctx, &home, ActionKind::Move, &troop.id, Location::new(0, 1)).await;
        TroopActionTaskHandler::new(action_id)
            .handle(&ctx, Utc::now())
            .await
            .unwrap();

        let carrier = ctx.troops.get_by_id(&troop.id).await.unwrap();
        assert!(carrier.backpack.is_empty(), "backpack zeroed after deposit");

        let filled = ctx.villages.get_by_id(&storehouse.id).await.unwrap();
        // wood clamped at the 1000 base capacity: 200 of 300 lost
        assert_eq!(filled.resources.wood, 1000.0);
        assert_eq!(filled.resources.stone, 100.0);
        assert_eq!(filled.resources.food, 50.0);
    }

    #[tokio::test]
    async fn test_cavalry_move_onto_defended_home_tile() {
        let ctx = mock_context();
        let attacker_home = village_factory(VillageFactoryOptions {
            location: Some(Location::new(0, 0)),
            ..Default::default()
        });
        let defender_owner = DocId::new();
        let defender_home = village_factory(VillageFactoryOptions {
            owner_id: Some(defender_owner.clone()),
            location: Some(Location::new(1, 2)),
            ..Default::default()
        });
        ctx.villages.insert(&attacker_home).await.unwrap();
        ctx.villages.insert(&defender_home).await.unwrap();

        let cavalry = troop_factory(TroopFactoryOptions {
            kind: TroopKind::LightCavalry,
            quantity: 100,
            home_id: Some(attacker_home.id.clone()),
            location: Location::new(0, 0),
            ..Default::default()
        });
        let pikemen = troop_factory(TroopFactoryOptions {
            kind: TroopKind::Pikeman,
            quantity: 100,
            home_id: Some(defender_home.id.clone()),
            location: Location::new(1, 2),
            ..Default::default()
        });
        ctx.troops.insert(&cavalry).await.unwrap();
        ctx.troops.insert(&pikemen).await.unwrap();

        let action_id = submit(
            &ctx,
            &attacker_home,
            ActionKind::Move,
            &cavalry.id,
            Location::new(1, 2),
        )
        .await;
        TroopActionTaskHandler::new(action_id)
            .handle(&ctx, Utc::now())
            .await
            .unwrap();

        // the home bonus dooms the attacker; 20 pikemen fall
        assert!(ctx.troops.get_by_id(&cavalry.id).await.is_err());
        let defenders = ctx.troops.get_by_id(&pikemen.id).await.unwrap();
        assert_eq!(defenders.quantity, 80);
        assert_eq!(defenders.location, Location::new(1, 2));
    }

    #[tokio::test]
    async fn test_attack_never_moves_the_attacker() {
        let ctx = mock_context();
        let home = village_factory(VillageFactoryOptions {
            location: Some(Location::new(5, 5)),
            ..Default::default()
        });
        let other_home = village_factory(VillageFactoryOptions {
            location: Some(Location::new(9, 9)),
            ..Default::default()
        });
        ctx.villages.insert(&home).await.unwrap();
        ctx.villages.insert(&other_home).await.unwrap();

        let archers = troop_factory(TroopFactoryOptions {
            kind: TroopKind::Archer,
            quantity: 200,
            home_id: Some(home.id.clone()),
            location: Location::new(5, 5),
            ..Default::default()
        });
        let victims = troop_factory(TroopFactoryOptions {
            kind: TroopKind::Militia,
            quantity: 10,
            home_id: Some(other_home.id.clone()),
            location: Location::new(6, 6),
            ..Default::default()
        });
        ctx.troops.insert(&archers).await.unwrap();
        ctx.troops.insert(&victims).await.unwrap();

        let action_id = submit(&ctx, &home, ActionKind::Attack, &archers.id, Location::new(6, 6)).await;
        TroopActionTaskHandler::new(action_id)
            .handle(&ctx, Utc::now())
            .await
            .unwrap();

        let shooters = ctx.troops.get_by_id(&archers.id).await.unwrap();
        assert_eq!(shooters.location, Location::new(5, 5), "ranged attacker stays put");
        assert_eq!(shooters.quantity, 200, "no return fire at range");
        assert_eq!(shooters.mode, TroopMode::Idle);
        assert!(ctx.troops.get_by_id(&victims.id).await.is_err(), "victims wiped");
    }

    #[tokio::test]
    async fn test_action_for_vanished_troop_is_retired() {
        let ctx = mock_context();
        let village = village_factory(VillageFactoryOptions {
            location: Some(Location::new(0, 0)),
            ..Default::default()
        });
        ctx.villages.insert(&village).await.unwrap();
        let troop = troop_factory(TroopFactoryOptions {
            home_id: Some(village.id.clone()),
            location: Location::new(0, 0),
            ..Default::default()
        });
        ctx.troops.insert(&troop).await.unwrap();

        let action_id = submit(&ctx, &village, ActionKind::Move, &troop.id, Location::new(0, 1)).await;
        ctx.troops.delete(&troop.id).await.unwrap();

        let scope = TroopActionTaskHandler::new(action_id.clone())
            .handle(&ctx, Utc::now())
            .await
            .unwrap();
        assert_eq!(scope, NotifyScope::None);
        assert!(ctx.troop_actions.get_by_id(&action_id).await.unwrap().processed);
    }
}
