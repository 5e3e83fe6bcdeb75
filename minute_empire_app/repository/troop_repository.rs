use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::map::Location;
use minute_empire_types::troops::Troop;

#[async_trait::async_trait]
pub trait TroopRepository: Send + Sync {
    async fn get_by_id(&self, id: &DocId) -> Result<Troop, ApplicationError>;

    async fn list_by_home(&self, village_id: &DocId) -> Result<Vec<Troop>, ApplicationError>;

    async fn list_at_location(&self, location: Location) -> Result<Vec<Troop>, ApplicationError>;

    async fn list_all(&self) -> Result<Vec<Troop>, ApplicationError>;

    async fn insert(&self, troop: &Troop) -> Result<(), ApplicationError>;

    async fn save(&self, troop: &Troop) -> Result<(), ApplicationError>;

    /// Removes a wiped-out troop. A quantity of zero is never persisted.
    async fn delete(&self, id: &DocId) -> Result<(), ApplicationError>;
}
