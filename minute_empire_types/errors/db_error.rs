use thiserror::Error;

use crate::common::DocId;

/// Errors for db stuff.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Village with ID {0} not found")]
    VillageNotFound(DocId),

    #[error("User with ID {0} not found")]
    UserNotFound(DocId),

    #[error("User with username '{0}' not found")]
    UserByNameNotFound(String),

    #[error("Troop with ID {0} not found")]
    TroopNotFound(DocId),

    #[error("Troop action with ID {0} not found")]
    TroopActionNotFound(DocId),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
