use serde_json::Value;

use minute_empire_app::repository::VillageRepository;
use minute_empire_game::models::village::Village;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::{ApplicationError, DbError};
use minute_empire_types::map::Location;

use crate::connection::DbPool;

/// Village collection: one JSONB document per row, keyed by the document id.
#[derive(Clone)]
pub struct PostgresVillageRepository {
    pool: DbPool,
}

impl PostgresVillageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode(doc: Value) -> Result<Village, ApplicationError> {
        Ok(serde_json::from_value(doc).map_err(DbError::Json)?)
    }

    fn encode(village: &Village) -> Result<Value, ApplicationError> {
        Ok(serde_json::to_value(village).map_err(DbError::Json)?)
    }
}

#[async_trait::async_trait]
impl VillageRepository for PostgresVillageRepository {
    async fn get_by_id(&self, id: &DocId) -> Result<Village, ApplicationError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM villages WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Database)?;

        match doc {
            Some(doc) => Self::decode(doc),
            None => Err(DbError::VillageNotFound(id.clone()).into()),
        }
    }

    async fn list_by_owner(&self, owner_id: &DocId) -> Result<Vec<Village>, ApplicationError> {
        let docs: Vec<Value> =
            sqlx::query_scalar("SELECT doc FROM villages WHERE doc->>'owner_id' = $1 ORDER BY id")
                .bind(owner_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn find_by_location(
        &self,
        location: Location,
    ) -> Result<Option<Village>, ApplicationError> {
        let doc: Option<Value> = sqlx::query_scalar(
            "SELECT doc FROM villages \
             WHERE (doc->'location'->>'x')::int = $1 AND (doc->'location'->>'y')::int = $2",
        )
        .bind(location.x)
        .bind(location.y)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Database)?;

        doc.map(Self::decode).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Village>, ApplicationError> {
        let docs: Vec<Value> = sqlx::query_scalar("SELECT doc FROM villages ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn insert(&self, village: &Village) -> Result<(), ApplicationError> {
        sqlx::query("INSERT INTO villages (id, doc) VALUES ($1, $2)")
            .bind(village.id.as_str())
            .bind(Self::encode(village)?)
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }

    async fn save(&self, village: &Village) -> Result<(), ApplicationError> {
        sqlx::query(
            "INSERT INTO villages (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(village.id.as_str())
        .bind(Self::encode(village)?)
        .execute(&self.pool)
        .await
        .map_err(DbError::Database)?;
        Ok(())
    }
}
