use chrono::{DateTime, TimeZone, Utc};

use minute_empire_app::test_utils::tests::{mock_bus, mock_context};
use minute_empire_game::test_utils::{
    TroopFactoryOptions, VillageFactoryOptions, troop_factory, village_factory,
};
use minute_empire_types::buildings::BuildingKind;
use minute_empire_types::common::{DocId, Resources};
use minute_empire_types::map::Location;
use minute_empire_types::tasks::{ActionKind, ConstructionTask, TaskKind, TroopAction};
use minute_empire_types::troops::{TroopKind, TroopMode};

fn ts(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, h, m, 0).unwrap()
}

#[tokio::test]
async fn test_restart_replays_overdue_work_before_serving() {
    // A warehouse upgrade and an arriving loot caravan complete at the very
    // same instant while the server is down. Village-owned work replays
    // first, so the raised capacity is in place when the deposit lands.
    let bus = mock_bus(mock_context());
    let completion = ts(13, 0);

    let owner = DocId::new();
    let mut village = village_factory(VillageFactoryOptions {
        owner_id: Some(owner.clone()),
        location: Some(Location::new(0, 1)),
        constructions: vec![
            (BuildingKind::CityCenter, 6, 1),
            (BuildingKind::Warehouse, 1, 2),
        ],
        resources: Some(Resources::ZERO),
        res_update_at: Some(ts(12, 0)),
        ..Default::default()
    });
    village.construction_tasks.push(ConstructionTask {
        id: DocId::new(),
        task_type: TaskKind::UpgradeBuilding,
        target_type: "warehouse".to_string(),
        slot: 2,
        level: 2,
        started_at: ts(12, 0),
        completion_time: completion,
        processed: false,
    });
    bus.context().villages.insert(&village).await.unwrap();

    let mut caravan = troop_factory(TroopFactoryOptions {
        kind: TroopKind::LightCavalry,
        quantity: 15,
        home_id: Some(village.id.clone()),
        location: Location::new(2, 0),
        backpack: Resources::new(1500.0, 0.0, 0.0, 0.0),
        ..Default::default()
    });
    caravan.mode = TroopMode::Move;
    bus.context().troops.insert(&caravan).await.unwrap();

    let action = TroopAction {
        id: DocId::new(),
        troop_id: caravan.id.clone(),
        action_type: ActionKind::Move,
        start_location: Location::new(2, 0),
        target_location: Location::new(0, 1),
        started_at: ts(12, 57),
        completion_time: completion,
        processed: false,
    };
    bus.context().troop_actions.insert(&action).await.unwrap();

    let stats = bus.bootstrap(ts(14, 0)).await.unwrap();
    assert_eq!(stats.caught_up, 2);
    assert_eq!(stats.scheduled, 0);

    let recovered = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert_eq!(
        recovered.get_building(2).unwrap().level,
        2,
        "warehouse upgrade replayed"
    );
    // level-2 warehouse holds 1600: the full 1500-wood deposit fits, which
    // proves the upgrade committed before the caravan arrived
    assert_eq!(recovered.resources.wood, 1500.0);

    let unloaded = bus.context().troops.get_by_id(&caravan.id).await.unwrap();
    assert!(unloaded.backpack.is_empty());
    assert_eq!(unloaded.location, Location::new(0, 1));
    assert_eq!(unloaded.mode, TroopMode::Idle);
    assert!(
        bus.context()
            .troop_actions
            .get_by_id(&action.id)
            .await
            .unwrap()
            .processed
    );
}

#[tokio::test]
async fn test_future_tasks_are_scheduled_not_replayed() {
    let bus = mock_bus(mock_context());

    let mut village = village_factory(VillageFactoryOptions {
        res_update_at: Some(ts(12, 0)),
        ..Default::default()
    });
    village.construction_tasks.push(ConstructionTask {
        id: DocId::new(),
        task_type: TaskKind::CreateBuilding,
        target_type: "granary".to_string(),
        slot: 3,
        level: 1,
        started_at: ts(12, 0),
        completion_time: ts(18, 0),
        processed: false,
    });
    bus.context().villages.insert(&village).await.unwrap();

    let stats = bus.bootstrap(ts(12, 5)).await.unwrap();
    assert_eq!(stats.caught_up, 0);
    assert_eq!(stats.scheduled, 1);
    assert_eq!(bus.context().scheduler.next_due(), Some(ts(18, 0)));

    let untouched = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert!(untouched.get_building(3).is_none());
    assert!(!untouched.construction_tasks[0].processed);
}

#[tokio::test]
async fn test_replay_is_idempotent_across_restarts() {
    // Two bootstraps in a row (e.g. crash right after recovery) must not
    // double-apply anything.
    let bus = mock_bus(mock_context());

    let mut village = village_factory(VillageFactoryOptions {
        fields: vec![(minute_empire_types::buildings::FieldKind::Wood, 1, 0)],
        resources: Some(Resources::ZERO),
        res_update_at: Some(ts(12, 0)),
        ..Default::default()
    });
    village.construction_tasks.push(ConstructionTask {
        id: DocId::new(),
        task_type: TaskKind::UpgradeField,
        target_type: "wood".to_string(),
        slot: 0,
        level: 2,
        started_at: ts(12, 0),
        completion_time: ts(12, 30),
        processed: false,
    });
    bus.context().villages.insert(&village).await.unwrap();

    bus.bootstrap(ts(13, 0)).await.unwrap();
    let first = bus.context().villages.get_by_id(&village.id).await.unwrap();

    let stats = bus.bootstrap(ts(13, 0)).await.unwrap();
    assert_eq!(stats.caught_up, 0, "processed tasks are not picked up again");

    let second = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert_eq!(first.get_field(0).unwrap().level, 2);
    assert_eq!(second.get_field(0).unwrap().level, 2);
    assert_eq!(first.resources.wood, second.resources.wood);
}
