use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::tasks::TroopAction;

#[async_trait::async_trait]
pub trait TroopActionRepository: Send + Sync {
    async fn get_by_id(&self, id: &DocId) -> Result<TroopAction, ApplicationError>;

    /// All actions not yet processed, across every troop. Scanned on restart.
    async fn list_unprocessed(&self) -> Result<Vec<TroopAction>, ApplicationError>;

    async fn list_unprocessed_for_troop(
        &self,
        troop_id: &DocId,
    ) -> Result<Vec<TroopAction>, ApplicationError>;

    async fn insert(&self, action: &TroopAction) -> Result<(), ApplicationError>;

    async fn mark_processed(&self, id: &DocId) -> Result<(), ApplicationError>;
}
