use serde_json::Value;

use minute_empire_app::repository::TroopActionRepository;
use minute_empire_types::common::DocId;
use minute_empire_types::errors::{ApplicationError, DbError};
use minute_empire_types::tasks::TroopAction;

use crate::connection::DbPool;

#[derive(Clone)]
pub struct PostgresTroopActionRepository {
    pool: DbPool,
}

impl PostgresTroopActionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode(doc: Value) -> Result<TroopAction, ApplicationError> {
        Ok(serde_json::from_value(doc).map_err(DbError::Json)?)
    }
}

#[async_trait::async_trait]
impl TroopActionRepository for PostgresTroopActionRepository {
    async fn get_by_id(&self, id: &DocId) -> Result<TroopAction, ApplicationError> {
        let doc: Option<Value> = sqlx::query_scalar("SELECT doc FROM troop_actions WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Database)?;

        match doc {
            Some(doc) => Self::decode(doc),
            None => Err(DbError::TroopActionNotFound(id.clone()).into()),
        }
    }

    async fn list_unprocessed(&self) -> Result<Vec<TroopAction>, ApplicationError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM troop_actions \
             WHERE NOT COALESCE((doc->>'processed')::boolean, false) ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn list_unprocessed_for_troop(
        &self,
        troop_id: &DocId,
    ) -> Result<Vec<TroopAction>, ApplicationError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM troop_actions \
             WHERE doc->>'troop_id' = $1 \
             AND NOT COALESCE((doc->>'processed')::boolean, false) ORDER BY id",
        )
        .bind(troop_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Database)?;

        docs.into_iter().map(Self::decode).collect()
    }

    async fn insert(&self, action: &TroopAction) -> Result<(), ApplicationError> {
        sqlx::query("INSERT INTO troop_actions (id, doc) VALUES ($1, $2)")
            .bind(action.id.as_str())
            .bind(serde_json::to_value(action).map_err(DbError::Json)?)
            .execute(&self.pool)
            .await
            .map_err(DbError::Database)?;
        Ok(())
    }

    async fn mark_processed(&self, id: &DocId) -> Result<(), ApplicationError> {
        // single-document atomic flip, the at-most-once guard
        sqlx::query(
            "UPDATE troop_actions SET doc = jsonb_set(doc, '{processed}', 'true'::jsonb) \
             WHERE id = $1",
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(DbError::Database)?;
        Ok(())
    }
}
