mod construction;
mod train_troops;
mod troop_action;

pub use construction::ConstructionTaskHandler;
pub use train_troops::TrainTroopsTaskHandler;
pub use troop_action::TroopActionTaskHandler;

use chrono::{DateTime, Utc};

use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;

use crate::context::HandlerContext;

/// Who needs a `map_update` push after a completion callback ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyScope {
    /// Nothing observable changed (e.g. the task was already processed).
    None,
    /// Only the named user's view changed.
    User(DocId),
    /// The shared map changed for everybody.
    All,
}

/// A completion callback. Invoked by the scheduler at (or, during startup
/// catch-up, after) the task's completion instant; `completion_time` is
/// always the scheduled instant, never "now".
#[async_trait::async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &HandlerContext,
        completion_time: DateTime<Utc>,
    ) -> Result<NotifyScope, ApplicationError>;
}
