use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use minute_empire_app::{bus::AppBus, config::Config};
use minute_empire_types::errors::ApplicationError;

use crate::handlers::{
    auth::{login, logout, me, register},
    command::execute_command,
    map::map_info,
    socket::websocket,
    village::my_villages,
};

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<AppBus>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(bus: Arc<AppBus>, config: &Config) -> AppState {
        AppState {
            bus,
            cookie_key: Key::from(config.cookie_secret.as_bytes()),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub struct WebRouter {}

impl WebRouter {
    pub async fn serve(
        state: AppState,
        port: u16,
        cors_origins: &[String],
    ) -> Result<(), ApplicationError> {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true);

        let router = Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/logout", get(logout))
            .route("/me", get(me))
            .route("/villages/me", get(my_villages))
            .route("/villages/command", post(execute_command))
            .route("/map/info", get(map_info))
            .route("/ws", get(websocket))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ApplicationError::Infrastructure(e.to_string()))?;
        info!(%addr, "HTTP server listening");

        axum::serve(listener, router)
            .await
            .map_err(|e| ApplicationError::Infrastructure(e.to_string()))
    }
}
