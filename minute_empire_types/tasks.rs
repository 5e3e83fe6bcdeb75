use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::DocId;
use crate::map::Location;

/// The six kinds of deferred construction work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CreateBuilding,
    UpgradeBuilding,
    DestroyBuilding,
    CreateField,
    UpgradeField,
    DestroyField,
}

impl TaskKind {
    pub fn targets_field(&self) -> bool {
        matches!(
            self,
            TaskKind::CreateField | TaskKind::UpgradeField | TaskKind::DestroyField
        )
    }

    pub fn targets_building(&self) -> bool {
        !self.targets_field()
    }
}

/// A construction/destruction work item, embedded in the owning village.
/// Invariant: at most one unprocessed task per (village, slot);
/// `processed == true` means the state mutation has already been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionTask {
    pub id: DocId,
    pub task_type: TaskKind,
    /// Subtype tag of the target: a `FieldKind` or `BuildingKind` name.
    pub target_type: String,
    pub slot: u8,
    /// Target level after completion.
    pub level: u8,
    pub started_at: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

/// A troop training work item, embedded in the owning village.
/// Invariant: at most one unprocessed task per (village, troop_type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopTrainingTask {
    pub id: DocId,
    pub troop_type: String,
    pub quantity: u32,
    pub started_at: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Attack,
}

/// A troop movement/attack work item. Stored in its own collection because
/// it spans villages and must be scanned globally on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopAction {
    #[serde(rename = "_id")]
    pub id: DocId,
    pub troop_id: DocId,
    pub action_type: ActionKind,
    pub start_location: Location,
    pub target_location: Location,
    pub started_at: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_tags() {
        let json = serde_json::to_string(&TaskKind::CreateBuilding).unwrap();
        assert_eq!(json, "\"create_building\"");
        assert!(TaskKind::DestroyField.targets_field());
        assert!(TaskKind::UpgradeBuilding.targets_building());
    }

    #[test]
    fn test_construction_task_roundtrip() {
        let task = ConstructionTask {
            id: DocId::new(),
            task_type: TaskKind::UpgradeField,
            target_type: "wood".to_string(),
            slot: 3,
            level: 2,
            started_at: Utc::now(),
            completion_time: Utc::now(),
            processed: false,
        };
        let json = serde_json::to_string(&task).unwrap();
        let back: ConstructionTask = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_type, TaskKind::UpgradeField);
        assert_eq!(back.slot, 3);
        assert!(!back.processed);
    }
}
