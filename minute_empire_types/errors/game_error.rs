use thiserror::Error;

use crate::common::DocId;
use crate::map::Location;
use crate::troops::TroopKind;

/// Errors for domain logic (game rules). Every variant is a submission
/// rejection: zero mutations have happened when one of these is returned.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Not enough resources")]
    NotEnoughResources,

    #[error("Insufficient spare population: need {required}, have {available}")]
    InsufficientPopulation { required: u32, available: u32 },

    #[error("Slot {slot} is out of range (max {max})")]
    SlotOutOfRange { slot: u8, max: u8 },

    #[error("Slot {slot} is already occupied")]
    SlotOccupied { slot: u8 },

    #[error("Nothing built on slot {slot}")]
    EmptySlot { slot: u8 },

    #[error("Slot {slot} already has a pending task")]
    SlotHasPendingTask { slot: u8 },

    #[error("Maximum number of resource fields ({0}) reached")]
    FieldLimitReached(usize),

    #[error("Maximum number of constructions ({0}) reached")]
    ConstructionLimitReached(usize),

    #[error("Field slot {slot} requires city center level {required}, have {current}")]
    CityCenterTooLow { slot: u8, required: u8, current: u8 },

    #[error("Training of {0} is already queued")]
    TrainingAlreadyQueued(TroopKind),

    #[error("Training quantity must be at least 1")]
    InvalidTrainingQuantity,

    #[error("Village {village_id} not owned by user {user_id}")]
    VillageNotOwned { village_id: DocId, user_id: DocId },

    #[error("Troop {troop_id} does not belong to village {village_id}")]
    TroopNotOwned { troop_id: DocId, village_id: DocId },

    #[error("Troop {0} is busy")]
    TroopBusy(DocId),

    #[error("Target {0} is outside the map")]
    OutOfBounds(Location),

    #[error("Target {location} is not reachable by {kind}")]
    UnreachableTarget { kind: TroopKind, location: Location },

    #[error("Resource clock may not run backwards (last update {last_update}, asked for {target})")]
    ResourceClockRegression {
        last_update: chrono::DateTime<chrono::Utc>,
        target: chrono::DateTime<chrono::Utc>,
    },

    #[error("The wall cannot be created or destroyed, only upgraded")]
    WallIsPermanent,

    #[error("Unknown target type '{0}' on task")]
    UnknownTargetType(String),
}
