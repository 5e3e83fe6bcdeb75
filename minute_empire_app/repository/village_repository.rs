use minute_empire_game::models::village::Village;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::ApplicationError;
use minute_empire_types::map::Location;

#[async_trait::async_trait]
pub trait VillageRepository: Send + Sync {
    async fn get_by_id(&self, id: &DocId) -> Result<Village, ApplicationError>;

    async fn list_by_owner(&self, owner_id: &DocId) -> Result<Vec<Village>, ApplicationError>;

    async fn find_by_location(
        &self,
        location: Location,
    ) -> Result<Option<Village>, ApplicationError>;

    /// All villages. The startup recovery scan and map assembly use this.
    async fn list_all(&self) -> Result<Vec<Village>, ApplicationError>;

    async fn insert(&self, village: &Village) -> Result<(), ApplicationError>;

    /// Replaces the whole village document. Single-document atomicity is all
    /// the store promises.
    async fn save(&self, village: &Village) -> Result<(), ApplicationError>;
}
