use serde_json::Value;

use minute_empire_app::repository::UserRepository;
use minute_empire_types::common::{DocId, User};
use minute_empire_types::errors::{ApplicationError, DbError};

use crate::connection::DbPool;

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: DbPool,
}

impl PostgresUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode(doc: Value) -> Result<User, ApplicationError> {
        Ok(serde_json::from_value(doc).map_err(DbError::Json)?)
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_by_id(&self, id: &DocId) -> Result<User, ApplicationError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM users WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Database)?;

        match doc {
            Some(doc) => Self::decode(doc),
            None => Err(DbError::UserNotFound(id.clone()).into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApplicationError> {
        let doc: Option<Value> =
            sqlx::query_scalar("SELECT doc FROM users WHERE doc->>'username' = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::Database)?;

        doc.map(Self::decode).transpose()
    }

    async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
        sqlx::query("INSERT INTO users (id, doc) VALUES ($1, $2)")
            .bind(user.id.as_str())
            .bind(serde_json::to_value(user).map_err(DbError::Json)?)
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: &DocId) -> Result<(), ApplicationError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }
}
