use serde_json::Value;

use minute_empire_app::repository::TroopRepository;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::{ApplicationError, DbError};
use minute_empire_types::map::Location;
use minute_empire_types::troops::Troop;

use crate::connection::DbPool;

#[derive(Clone)]
pub struct PostgresTroopRepository {
    pool: DbPool,
}

impl PostgresTroopRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode(doc: Value) -> Result<Troop, ApplicationError> {
        Ok(serde_json::from_value(doc).map_err(DbError::Json)?)
    }

    fn encode(troop: &Troop) -> Result<Value, ApplicationError> {
        Ok(serde_json::to_value(troop).map_err(DbError::Json)?)
    }
}

#[async_trait::async_trait]
impl TroopRepository for PostgresTroopRepository {
    async fn get_by_id(&self, id: &DocId) -> Result<Troop, ApplicationError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM troops WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Database)?;

        match doc {
            Some(doc) => Self::decode(doc),
            None => Err(DbError::TroopNotFound(id.clone()).into()),
        }
    }

    async fn list_by_home(&self, village_id: &DocId) -> Result<Vec<Troop>, ApplicationError> {
        let docs: Vec<Value> =
            sqlx::query_scalar("SELECT doc FROM troops WHERE doc->>'home_id' = $1 ORDER BY id")
                .bind(village_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn list_at_location(&self, location: Location) -> Result<Vec<Troop>, ApplicationError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM troops \
             WHERE (doc->'location'->>'x')::int = $1 AND (doc->'location'->>'y')::int = $2 \
             ORDER BY id",
        )
        .bind(location.x)
        .bind(location.y)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn list_all(&self) -> Result<Vec<Troop>, ApplicationError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM troops ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn insert(&self, troop: &Troop) -> Result<(), ApplicationError> {
        sqlx::query("INSERT INTO troops (id, doc) VALUES ($1, $2)")
            .bind(troop.id.as_str())
            .bind(Self::encode(troop)?)
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }

    async fn save(&self, troop: &Troop) -> Result<(), ApplicationError> {
        sqlx::query(
            "INSERT INTO troops (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(troop.id.as_str())
        .bind(Self::encode(troop)?)
        .execute(&self.pool)
        .await
        .map_err(DbError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: &DocId) -> Result<(), ApplicationError> {
        sqlx::query("DELETE FROM troops WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }
}
