use std::sync::Arc;

use chrono::Utc;

use minute_empire_app::{
    bus::AppBus, config::Config, context::HandlerContext, scheduler::TaskScheduler,
    sockets::SocketRegistry,
};
use minute_empire_db::{
    PostgresTroopActionRepository, PostgresTroopRepository, PostgresUserRepository,
    PostgresVillageRepository, establish_connection_pool,
};
use minute_empire_types::errors::{ApplicationError, Result};
use minute_empire_web::{AppState, WebRouter};

mod logs;
use logs::setup_logging;

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<(), ApplicationError> {
    // keeps the file appender flushing until the process exits
    let _log_guard = setup_logging();

    let config = Arc::new(Config::from_env());
    let (bus, scheduler) = setup_app(&config).await?;

    // replay overdue work, then enqueue the rest, before serving traffic
    let stats = bus.bootstrap(Utc::now()).await?;
    tracing::info!(
        caught_up = stats.caught_up,
        scheduled = stats.scheduled,
        "Recovered persisted tasks"
    );

    tokio::spawn(scheduler.run(bus.clone()));

    let state = AppState::new(bus, &config);
    WebRouter::serve(state, config.http_port, &config.cors_origins).await
}

async fn setup_app(config: &Config) -> Result<(Arc<AppBus>, Arc<TaskScheduler>), ApplicationError> {
    let pool = establish_connection_pool(&config.database_url).await?;

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .map_err(|e| ApplicationError::Unknown(e.to_string()))?;

    let scheduler = Arc::new(TaskScheduler::new());
    let ctx = HandlerContext {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        villages: Arc::new(PostgresVillageRepository::new(pool.clone())),
        troops: Arc::new(PostgresTroopRepository::new(pool.clone())),
        troop_actions: Arc::new(PostgresTroopActionRepository::new(pool)),
        scheduler: scheduler.clone(),
    };
    let sockets = Arc::new(SocketRegistry::new());
    let bus = Arc::new(AppBus::new(ctx, sockets));

    Ok((bus, scheduler))
}
