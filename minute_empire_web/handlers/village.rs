use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Utc;

use minute_empire_game::models::village::Village;

use super::authed_user;
use crate::http::AppState;

/// Full documents of the caller's villages, advanced to now.
pub async fn my_villages(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Json<Vec<Village>>, (StatusCode, String)> {
    let user_id = authed_user(&jar)?;
    let villages = state
        .bus
        .context()
        .resource_service()
        .advance_all_for_user(&user_id, Utc::now())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(villages))
}
