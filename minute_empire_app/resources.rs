use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use minute_empire_game::models::village::Village;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;

use crate::repository::VillageRepository;

/// Brings village stocks up to a target instant and persists the result.
/// Thin orchestration over [`Village::advance_to`]; the segment-wise math
/// lives in the domain model.
pub struct ResourceService {
    villages: Arc<dyn VillageRepository>,
}

impl ResourceService {
    pub fn new(villages: Arc<dyn VillageRepository>) -> Self {
        Self { villages }
    }

    /// Advances one village to `target_time` (or leaves it alone when it is
    /// already ahead, e.g. after a concurrent query at `now`) and saves it.
    pub async fn advance_village(
        &self,
        village_id: &DocId,
        target_time: DateTime<Utc>,
    ) -> Result<Village, ApplicationError> {
        let mut village = self.villages.get_by_id(village_id).await?;
        let effective = target_time.max(village.res_update_at);
        let outcome = village.advance_to(effective)?;

        for task_id in &outcome.applied {
            debug!(village_id = %village_id, task_id = %task_id, "Applied task during accrual");
        }
        for task_id in &outcome.skipped {
            warn!(village_id = %village_id, task_id = %task_id, "Corrupt task skipped during accrual");
        }

        self.villages.save(&village).await?;
        Ok(village)
    }

    /// Advances every village in the set; failures are logged and do not
    /// block the remaining villages.
    pub async fn advance_villages(
        &self,
        village_ids: &HashSet<DocId>,
        target_time: DateTime<Utc>,
    ) {
        for village_id in village_ids {
            if let Err(error) = self.advance_village(village_id, target_time).await {
                warn!(village_id = %village_id, %error, "Failed to advance village resources");
            }
        }
    }

    /// Advances all villages of one user to `now`; used by map queries so a
    /// player always sees fresh stocks.
    pub async fn advance_all_for_user(
        &self,
        owner_id: &DocId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Village>, ApplicationError> {
        let villages = self.villages.list_by_owner(owner_id).await?;
        let mut updated = Vec::with_capacity(villages.len());
        for village in villages {
            match self.advance_village(&village.id, now).await {
                Ok(fresh) => updated.push(fresh),
                Err(error) => {
                    warn!(village_id = %village.id, %error, "Failed to advance village resources");
                }
            }
        }
        Ok(updated)
    }
}
