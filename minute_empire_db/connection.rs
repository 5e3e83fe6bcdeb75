use sqlx::postgres::PgPoolOptions;

use minute_empire_types::errors::{ApplicationError, DbError};

pub type DbPool = sqlx::PgPool;

pub async fn establish_connection_pool(database_url: &str) -> Result<DbPool, ApplicationError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| ApplicationError::Db(DbError::Database(e)))
}
