use minute_empire_types::common::{DocId, User};
use minute_empire_types::errors::ApplicationError;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: &DocId) -> Result<User, ApplicationError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApplicationError>;

    async fn insert(&self, user: &User) -> Result<(), ApplicationError>;

    async fn delete(&self, id: &DocId) -> Result<(), ApplicationError>;
}
