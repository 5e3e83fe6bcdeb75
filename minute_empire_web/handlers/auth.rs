use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use minute_empire_app::auth::verify_password;
use minute_empire_app::command_handlers::RegisterPlayer;

use super::{SESSION_COOKIE, authed_user};
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub family_name: String,
    pub color: String,
    pub village_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub family_name: String,
    pub color: String,
}

fn session_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id))
        .path("/")
        .http_only(true)
        .build()
}

pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(request): Json<RegistrationRequest>,
) -> Result<(SignedCookieJar, Json<Value>), (StatusCode, String)> {
    let command = RegisterPlayer {
        username: request.username,
        password: request.password,
        family_name: request.family_name,
        color: request.color,
        village_name: request.village_name,
    };

    let (user, village) = state
        .bus
        .register_player(command)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let jar = jar.add(session_cookie(user.id.to_string()));
    Ok((
        jar,
        Json(json!({
            "message": format!("Successfully registered user {}", user.username),
            "user_id": user.id,
            "village_id": village.id,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(SignedCookieJar, Json<Value>), (StatusCode, String)> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
    };

    let user = state
        .bus
        .context()
        .users
        .find_by_username(&request.username)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(unauthorized)?;

    if verify_password(&user.password_hash, &request.password).is_err() {
        warn!(username = %request.username, "Failed login attempt");
        return Err(unauthorized());
    }

    let jar = jar.add(session_cookie(user.id.to_string()));
    Ok((
        jar,
        Json(json!({
            "user_id": user.id,
            "username": user.username,
            "family_name": user.family_name,
        })),
    ))
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    (jar, Json(json!({ "message": "Successfully logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user_id = authed_user(&jar)?;
    let user = state
        .bus
        .context()
        .users
        .get_by_id(&user_id)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        username: user.username,
        family_name: user.family_name,
        color: user.color,
    }))
}
