pub mod auth;
pub mod command;
pub mod map;
pub mod socket;
pub mod village;

use axum::http::StatusCode;
use axum_extra::extract::cookie::SignedCookieJar;

use minute_empire_types::common::DocId;

pub const SESSION_COOKIE: &str = "minute_empire_session";

/// Reads the authenticated user id out of the signed session cookie.
pub fn authed_user(jar: &SignedCookieJar) -> Result<DocId, (StatusCode, String)> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()))
}
