use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initializes tracing: a compact console layer plus an hourly-rotated file
/// layer under `logs/`. Levels come from `RUST_LOG` when set.
///
/// Returns the file appender guard; `main` must hold it for the whole
/// process lifetime or buffered lines are dropped on shutdown.
pub fn setup_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::hourly("logs", "minute_empire.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Per-crate defaults: scheduler and completion callbacks at debug, the
    // storage and web adapters at info, sqlx only when it complains.
    let default_filter = [
        "info",
        "minute_empire_app=debug",
        "minute_empire_game=debug",
        "minute_empire_db=info",
        "minute_empire_web=info",
        "minute_empire_server=debug",
        "sqlx=warn",
    ]
    .join(",");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer().with_target(true).compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
