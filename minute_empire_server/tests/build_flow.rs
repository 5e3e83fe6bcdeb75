use chrono::Utc;

use minute_empire_app::scheduler::ScheduledTask;
use minute_empire_app::test_utils::tests::{mock_bus, mock_context};
use minute_empire_game::models::buildings::creation_cost;
use minute_empire_game::test_utils::{VillageFactoryOptions, village_factory};
use minute_empire_types::buildings::BuildingKind;
use minute_empire_types::common::Resources;
use minute_empire_types::tasks::TaskKind;

#[tokio::test]
async fn test_build_flow() {
    let bus = mock_bus(mock_context());
    let village = village_factory(VillageFactoryOptions {
        resources: Some(Resources::new(1000.0, 1000.0, 1000.0, 1000.0)),
        ..Default::default()
    });
    let owner = village.owner_id.clone();
    bus.context().villages.insert(&village).await.unwrap();

    let cost = creation_cost(BuildingKind::Barracks);
    let outcome = bus
        .execute_command(&owner, &village.id, "create barracks building in 6")
        .await;
    assert!(outcome.success, "{}", outcome.message);

    let pending = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert_eq!(
        pending.resources.wood,
        1000.0 - cost.wood,
        "Resources should be deducted"
    );
    assert!(
        pending.get_building(6).is_none(),
        "Building should NOT exist yet"
    );
    let task = pending.construction_tasks[0].clone();
    assert_eq!(task.task_type, TaskKind::CreateBuilding);
    assert_eq!(bus.context().scheduler.pending_count(), 1);

    bus.run_task(
        ScheduledTask::Construction {
            village_id: village.id.clone(),
            task_id: task.id.clone(),
        },
        task.completion_time,
    )
    .await;

    let finished = bus.context().villages.get_by_id(&village.id).await.unwrap();
    let building = finished.get_building(6).expect("Building should now exist");
    assert_eq!(building.kind, BuildingKind::Barracks);
    assert_eq!(building.level, 1);
    assert!(finished.construction_tasks[0].processed);
}

#[tokio::test]
async fn test_upgrade_then_destroy_flow() {
    let bus = mock_bus(mock_context());
    let village = village_factory(VillageFactoryOptions {
        constructions: vec![(BuildingKind::CityCenter, 6, 1), (BuildingKind::Warehouse, 1, 2)],
        resources: Some(Resources::new(4000.0, 4000.0, 4000.0, 4000.0)),
        ..Default::default()
    });
    let owner = village.owner_id.clone();
    bus.context().villages.insert(&village).await.unwrap();

    let outcome = bus
        .execute_command(&owner, &village.id, "upgrade building in 2")
        .await;
    assert!(outcome.success, "{}", outcome.message);

    let task = bus
        .context()
        .villages
        .get_by_id(&village.id)
        .await
        .unwrap()
        .construction_tasks[0]
        .clone();
    assert_eq!(task.level, 2, "upgrade targets the next level");

    bus.run_task(
        ScheduledTask::Construction {
            village_id: village.id.clone(),
            task_id: task.id.clone(),
        },
        task.completion_time,
    )
    .await;

    let upgraded = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert_eq!(upgraded.get_building(2).unwrap().level, 2);

    // now tear it down again
    let outcome = bus
        .execute_command(&owner, &village.id, "destroy building in 2")
        .await;
    assert!(outcome.success, "{}", outcome.message);

    let task = bus
        .context()
        .villages
        .get_by_id(&village.id)
        .await
        .unwrap()
        .construction_tasks
        .iter()
        .find(|t| !t.processed)
        .unwrap()
        .clone();
    bus.run_task(
        ScheduledTask::Construction {
            village_id: village.id.clone(),
            task_id: task.id.clone(),
        },
        task.completion_time,
    )
    .await;

    let razed = bus.context().villages.get_by_id(&village.id).await.unwrap();
    assert!(razed.get_building(2).is_none(), "warehouse should be gone");
}

#[tokio::test]
async fn test_gated_field_slot_is_rejected_end_to_end() {
    let bus = mock_bus(mock_context());
    let village = village_factory(VillageFactoryOptions {
        constructions: vec![(BuildingKind::CityCenter, 1, 1)],
        resources: Some(Resources::new(4000.0, 4000.0, 4000.0, 4000.0)),
        ..Default::default()
    });
    let owner = village.owner_id.clone();
    bus.context().villages.insert(&village).await.unwrap();

    let outcome = bus
        .execute_command(&owner, &village.id, "create iron field in 14")
        .await;
    assert!(!outcome.success);
    assert!(outcome.message.contains("city center level 9"));
    assert_eq!(bus.context().scheduler.pending_count(), 0);
}

#[tokio::test]
async fn test_slot_boundary() {
    let bus = mock_bus(mock_context());
    let village = village_factory(VillageFactoryOptions {
        constructions: vec![(BuildingKind::CityCenter, 9, 1)],
        resources: Some(Resources::new(9000.0, 9000.0, 9000.0, 9000.0)),
        ..Default::default()
    });
    let owner = village.owner_id.clone();
    bus.context().villages.insert(&village).await.unwrap();

    let last = bus
        .execute_command(&owner, &village.id, "create wood field in 19")
        .await;
    assert!(last.success, "{}", last.message);

    let beyond = bus
        .execute_command(&owner, &village.id, "create wood field in 20")
        .await;
    assert!(!beyond.success);
    assert!(beyond.message.contains("out of range"));
}
