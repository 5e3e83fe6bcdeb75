use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::SignedCookieJar;

use minute_empire_app::queries::MapInfo;

use super::authed_user;
use crate::http::AppState;

pub async fn map_info(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Json<MapInfo>, (StatusCode, String)> {
    let user_id = authed_user(&jar)?;
    let info = state
        .bus
        .map_info(&user_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(info))
}
